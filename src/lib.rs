//! Rust codec for the Epson ESC/P-Raster command language
//!
//! Decode captured print jobs back into page images, and synthesize jobs
//! from images for transmission to a real printer over raw TCP ("port
//! 9100") printing, as spoken by Epson inkjets such as the L355.
//!
//! # Features
//!
//! - **Decode captures** - replay an ESC/P-R byte stream through a printer
//!   emulation ([`JobDecoder`](decoder::JobDecoder)) and recover the page as
//!   an RGB image, ink by ink
//! - **Synthesize jobs** - compile any image into a complete job
//!   ([`PrintJob`](printjob::PrintJob)) with the unit setup, remote-mode
//!   metadata, and band layout of the vendor driver
//! - **Talk to hardware** - send compiled jobs over TCP with the pacing the
//!   device firmware needs ([`TcpConnection`](connection::TcpConnection)),
//!   or capture a driver's job with [`capture_job`](connection::capture_job)
//! - **Parse status replies** - the `@BDC ST2` blob and device-ID string
//!   ([`status`])
//!
//! # Quick Start
//!
//! ## Decode a capture
//!
//! ```no_run
//! use std::{fs::File, io::BufReader};
//! use escpr::decoder::JobDecoder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let capture = BufReader::new(File::open("out.epson")?);
//! let page = JobDecoder::new(capture).decode()?;
//! page.save("out.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Print an image
//!
//! ```no_run
//! use escpr::{connection::{PrinterConnection, TcpConnection}, printjob::PrintJob};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = image::open("page.png")?;
//! let job = PrintJob::new(image).dpi(360);
//! let mut connection = TcpConnection::open("192.168.1.237")?;
//! connection.print(&job)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Compile to a file
//!
//! ```no_run
//! use std::{fs::File, io::Write};
//! use escpr::printjob::PrintJob;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let job = PrintJob::new(image::open("page.png")?);
//! File::create("job.epson")?.write_all(&job.compile()?)?;
//! // Send later with: nc printer-ip 9100 < job.epson
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - **`cli`** (default) - the `escpr` binary (`server`, `decode`, `encode`
//!   subcommands) and its `clap`/`anyhow` dependencies
//! - **`serde`** (optional) - `Deserialize` for the public configuration
//!   enums
//!
//! # References
//!
//! - Gutenprint's unofficial ESC/P-R notes; the grammar here was validated
//!   against jobs captured from the L355 Windows driver
//! - Images are processed using the [`image`] crate

pub mod commands;
pub mod connection;
pub mod decoder;
pub mod error;
pub mod packbits;
pub mod parser;
pub mod plotter;
pub mod printjob;
mod raster_image;
pub mod state;
pub mod status;
pub mod units;
