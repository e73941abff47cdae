//! Capture interpreter
//!
//! [`JobDecoder`] replays a captured ESC/P-R byte stream: it skips the EJL
//! enable chatter, frames bytes into commands, drives the
//! [`PrinterState`](crate::state::PrinterState) with them, and composites
//! every raster band onto a white canvas sized to the declared page
//! geometry. The result is the page as the printer would have produced it.

use std::io::{BufRead, Read};

use image::{Rgb, RgbImage};
use tracing::{debug, trace};

use crate::commands::{CompressionMode, RasterHeader, ESC};
use crate::error::DecodeError;
use crate::packbits;
use crate::parser::{self, Progress};
use crate::plotter;
use crate::state::PrinterState;

/// Forwards reads while advancing the decoder's logical offset.
struct CountedReader<'a, R> {
    inner: &'a mut R,
    offset: &'a mut u64,
}

impl<R: Read> Read for CountedReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        *self.offset += n as u64;
        Ok(n)
    }
}

/// Stream interpreter for one captured print job.
pub struct JobDecoder<R> {
    reader: R,
    state: PrinterState,
    canvas: Option<RgbImage>,
    buf: Vec<u8>,
    offset: u64,
}

impl<R: BufRead> JobDecoder<R> {
    /// Wrap a reader positioned at the start of a captured job.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: PrinterState::new(),
            canvas: None,
            buf: Vec::new(),
            offset: 0,
        }
    }

    /// The interpreter state, for inspection after (or during) a decode.
    #[must_use]
    pub fn state(&self) -> &PrinterState {
        &self.state
    }

    /// Replay the whole job and return the composited page.
    ///
    /// # Errors
    ///
    /// Fails on a missing enable sequence, end-of-input inside a raster
    /// payload, malformed PackBits data, an unsupported pixel depth, raster
    /// data before the page geometry was declared, or an underlying read
    /// error. Unknown commands are logged and skipped.
    pub fn decode(mut self) -> Result<RgbImage, DecodeError> {
        parser::skip_preamble(&mut self.reader, &mut self.offset)?;
        debug!(offset = self.offset, "preamble complete, interpreting commands");

        loop {
            if let Some(header) = self.state.pending_raster.take() {
                self.consume_raster(&header)?;
                continue;
            }

            let Some(byte) = self.read_byte()? else {
                // One best-effort parse of whatever is still buffered.
                if !self.buf.is_empty() {
                    trace!(len = self.buf.len(), "end of input with partial command buffer");
                    if let Progress::Done(cmd) = parser::parse_normal(&self.buf) {
                        self.state.apply(&cmd);
                    }
                }
                break;
            };

            // In normal mode an escape opens a fresh command window and is
            // itself framing; in remote mode it is buffered because the
            // mode's closing sentinel contains it.
            if byte == ESC && !self.state.remote {
                continue;
            }
            self.buf.push(byte);

            let progress = if self.state.remote {
                parser::parse_remote(&self.buf)
            } else {
                parser::parse_normal(&self.buf)
            };
            if let Progress::Done(cmd) = progress {
                self.state.apply(&cmd);
                self.buf.clear();
            }
        }

        match self.canvas {
            Some(canvas) => Ok(canvas),
            // A job without raster data still decodes to its blank page.
            None => self.state.geometry.width.zip(self.state.geometry.length).map_or(
                Err(DecodeError::Unconfigured("page geometry")),
                |(width, length)| Ok(blank_canvas(width, length)),
            ),
        }
    }

    /// Read the payload of an announced raster transfer and plot it.
    ///
    /// The payload binds to the head position observed now; move commands
    /// that follow apply after, not during, consumption. The head itself is
    /// never advanced here.
    fn consume_raster(&mut self, header: &RasterHeader) -> Result<(), DecodeError> {
        if header.bits_per_pixel != 2 && header.bits_per_pixel != 8 {
            return Err(DecodeError::UnsupportedBpp(header.bits_per_pixel));
        }
        let expected = header.payload_len();
        let payload = match header.compression {
            CompressionMode::None => {
                trace!(expected, "receiving raw raster payload");
                let mut payload = vec![0u8; expected];
                let offset = self.offset;
                let mut reader = CountedReader {
                    inner: &mut self.reader,
                    offset: &mut self.offset,
                };
                reader.read_exact(&mut payload).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        DecodeError::UnexpectedEof { offset }
                    } else {
                        DecodeError::Io(e)
                    }
                })?;
                payload
            }
            CompressionMode::PackBits => {
                trace!(expected, "receiving PackBits raster payload");
                let mut reader = CountedReader {
                    inner: &mut self.reader,
                    offset: &mut self.offset,
                };
                packbits::decode_stream(&mut reader, expected)?
            }
        };

        if self.canvas.is_none() {
            let width = self
                .state
                .geometry
                .width
                .ok_or(DecodeError::Unconfigured("page geometry"))?;
            let length = self
                .state
                .geometry
                .length
                .ok_or(DecodeError::Unconfigured("page geometry"))?;
            debug!(width, length, "allocating page canvas");
            self.canvas = Some(blank_canvas(width, length));
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return Err(DecodeError::Unconfigured("page geometry"));
        };

        let origin_y = self.state.head.top + plotter::ink_y_offset(header.color);
        debug!(
            offset = self.offset,
            x = self.state.head.left,
            y = origin_y,
            color = %header.color,
            "plotting raster band"
        );
        plotter::plot_band(
            canvas,
            self.state.head.left,
            origin_y,
            header.width_pixels(),
            usize::from(header.rows),
            header.color,
            &payload,
            header.bits_per_pixel,
        )
    }

    fn read_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        let mut byte = [0u8; 1];
        if self.reader.read(&mut byte)? == 0 {
            return Ok(None);
        }
        self.offset += 1;
        Ok(Some(byte[0]))
    }
}

fn blank_canvas(width: u32, length: u32) -> RgbImage {
    RgbImage::from_pixel(width, length, Rgb([255, 255, 255]))
}
