//! Error types for the ESC/P-R codec
//!
//! This module provides precise error types for different failure scenarios:
//!
//! - [`DecodeError`]: Fatal conditions while interpreting a captured job
//! - [`PackBitsError`]: Malformed PackBits compressed data
//! - [`EncodeError`]: Failures while synthesizing a job from a source image
//! - [`TransmitError`]: Socket errors while sending a job to the printer
//! - [`StatusParseError`]: Malformed status replies

use thiserror::Error;

/// Errors raised while decoding a captured ESC/P-R job
///
/// All variants are fatal for the job being decoded; recoverable conditions
/// (unknown commands, short parameter buffers) never surface here.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The stream ended mid-command, mid-payload, or before the enable
    /// sequence completed
    #[error("unexpected end of stream at byte offset {offset}")]
    UnexpectedEof {
        /// Offset of the read position when the stream ended
        offset: u64,
    },

    /// The ESC/P enable sequence was not found before end of input
    ///
    /// Every job must open with the three-stage `@EJL 1284.4` handshake;
    /// without it the printer stays in EJL mode and ignores raster data.
    #[error("enable sequence (@EJL 1284.4 handshake) not found")]
    MalformedPreamble,

    /// A raster command declared a pixel depth other than 2 or 8
    #[error("raster bit depth {0} is not supported (expected 2 or 8)")]
    UnsupportedBpp(u8),

    /// Raster data arrived before the page geometry was configured
    ///
    /// The canvas dimensions come from the `( S` printed-page-size command;
    /// a job that transfers raster bands first cannot be plotted.
    #[error("raster data received before {0} was configured")]
    Unconfigured(&'static str),

    /// A compressed raster payload was malformed
    #[error(transparent)]
    PackBits(#[from] PackBitsError),

    /// Underlying read error from the capture file or socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while expanding PackBits compressed data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackBitsError {
    /// A control byte announced more payload bytes than remain in the input
    #[error(
        "control byte {control:#04x} claims {needed} payload byte(s) but only {remaining} remain"
    )]
    Truncated {
        /// The control byte that started the unit
        control: u8,
        /// Payload bytes the unit requires
        needed: usize,
        /// Payload bytes actually available
        remaining: usize,
    },

    /// The stream ended before a complete control unit could be read
    #[error("stream ended mid-unit with {decoded} of {expected} byte(s) decoded")]
    UnexpectedEof {
        /// Bytes decoded before the stream ended
        decoded: usize,
        /// Uncompressed length the caller expected
        expected: usize,
    },
}

/// Errors raised while synthesizing a print job
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The source image could not be opened or decoded
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The source image has a zero-sized dimension
    #[error("source image is empty ({width}x{height} px)")]
    EmptyImage {
        /// Source width in pixels
        width: u32,
        /// Source height in pixels
        height: u32,
    },
}

/// Errors raised while transmitting a job over TCP
///
/// A reply timeout after the full buffer has been sent is *not* an error;
/// the transmitter logs it and returns success.
#[derive(Error, Debug)]
pub enum TransmitError {
    /// Connection or send failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Printing errors
///
/// Returned by [`print`](crate::connection::PrinterConnection::print).
#[derive(Error, Debug)]
pub enum PrintError {
    /// The job could not be compiled from its source image
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The connection failed mid-transfer
    #[error(transparent)]
    Transmit(#[from] TransmitError),
}

/// Status parsing errors
///
/// Returned when a status reply or device-ID string from the printer is
/// malformed.
#[derive(Error, Debug, Clone)]
#[error("failed to parse status information: {reason}")]
pub struct StatusParseError {
    /// Description of what's wrong with the status data
    pub reason: String,
}

impl StatusParseError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
