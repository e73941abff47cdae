//! Raw capture sink for print jobs
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::Path;

use tracing::{debug, info};

/// Accept one connection and record the received job verbatim.
///
/// Binds `listen`, waits for a single driver connection, and copies every
/// received byte to `path` until the peer closes the stream. Returns the
/// number of bytes captured; the file is the exact ESC/P-R stream and can be
/// fed straight to the decoder.
///
/// # Errors
/// Returns an error if binding, accepting, or writing the capture fails.
pub fn capture_job(listen: SocketAddr, path: &Path) -> io::Result<u64> {
    let listener = TcpListener::bind(listen)?;
    info!(%listen, "waiting for a print job");

    let (mut conn, peer) = listener.accept()?;
    debug!(%peer, "job accepted");

    let mut out = BufWriter::new(File::create(path)?);
    let copied = io::copy(&mut conn, &mut out)?;
    out.flush()?;

    info!(bytes = copied, "capture complete");
    Ok(copied)
}
