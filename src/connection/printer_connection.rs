//! Trait defining common printer connection behavior

use tracing::debug;

use crate::{
    error::{PrintError, TransmitError},
    printjob::PrintJob,
};

/// Common interface for all printer connections
pub trait PrinterConnection {
    /// Transmit a compiled job byte-for-byte
    ///
    /// Returns the printer's reply, if it sent one. Printers routinely stay
    /// silent on the raw-print port; `None` is the normal outcome.
    ///
    /// # Errors
    /// Returns an error if the connection fails mid-transfer.
    fn send(&mut self, data: &[u8]) -> Result<Option<Vec<u8>>, TransmitError>;

    /// Compile a print job and transmit it
    ///
    /// # Errors
    /// Returns an error if the job cannot be compiled or the connection
    /// fails mid-transfer.
    fn print(&mut self, job: &PrintJob) -> Result<(), PrintError> {
        let bytes = job.compile()?;
        debug!(len = bytes.len(), "job compiled, transmitting");
        if let Some(reply) = self.send(&bytes)? {
            debug!(reply = %reply.escape_ascii(), "printer reply");
        }
        Ok(())
    }
}
