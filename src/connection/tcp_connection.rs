//! TCP connection to a network printer
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use tracing::{debug, trace};

use super::PrinterConnection;
use crate::error::TransmitError;

/// TCP port for raw ("port 9100") printing.
pub const RAW_PRINT_PORT: u16 = 9100;

/// Largest write handed to the socket in one go.
const CHUNK_SIZE: usize = 2048;

/// Pause between chunks. The device firmware stalls its TCP window when the
/// job arrives in one burst; pacing the writes keeps it draining.
const CHUNK_PAUSE: Duration = Duration::from_millis(10);

/// How long to wait for the optional reply after the full job is sent.
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP connection to a printer's raw-print port
pub struct TcpConnection {
    stream: TcpStream,
}

impl TcpConnection {
    /// Connect to a printer by hostname or IP address
    ///
    /// # Errors
    /// Returns an error if the host cannot be resolved or the printer
    /// refuses the connection.
    pub fn open(host: &str) -> Result<Self, TransmitError> {
        debug!(host, port = RAW_PRINT_PORT, "connecting to printer");
        let stream = TcpStream::connect((host, RAW_PRINT_PORT))?;
        debug!("connected");
        Ok(Self { stream })
    }
}

impl PrinterConnection for TcpConnection {
    fn send(&mut self, data: &[u8]) -> Result<Option<Vec<u8>>, TransmitError> {
        for chunk in data.chunks(CHUNK_SIZE) {
            self.stream.write_all(chunk)?;
            trace!(len = chunk.len(), "chunk sent");
            std::thread::sleep(CHUNK_PAUSE);
        }
        self.stream.flush()?;

        self.stream.set_read_timeout(Some(REPLY_TIMEOUT))?;
        let mut reply = vec![0u8; CHUNK_SIZE];
        match self.stream.read(&mut reply) {
            Ok(0) => Ok(None),
            Ok(n) => {
                reply.truncate(n);
                Ok(Some(reply))
            }
            // No reply within the window is normal once the buffer is out.
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                debug!("printer sent no reply within the timeout");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
