//! Job synthesis
//!
//! [`PrintJob`] turns a source image into a complete ESC/P-R byte stream:
//! the EJL enable header, the remote-mode metadata block, the unit and page
//! setup captured from the L355 driver, the per-ink raster bands, and the
//! closing remote block with the page eject. The compiled bytes can be
//! written to a file or handed to a
//! [`PrinterConnection`](crate::connection::PrinterConnection).

use image::DynamicImage;
use tracing::debug;

use crate::commands::{
    ColorMode, CommandBuilder, CompressionMode, EscCommand, InkColor, RasterHeader, RemoteCommand,
    UnitCommand,
};
use crate::error::EncodeError;
use crate::packbits;
use crate::raster_image::{Channel, CmykImage, BAND_ROWS, BAND_WIDTH};
use crate::units::mm_to_page_units;

/// Bytes every job opens with: null padding, the EJL `1284.4` handshake,
/// and the arming reset.
const JOB_HEADER: &[u8] = b"\x00\x00\x00\x1b\x01@EJL 1284.4\n@EJL\x20\x20\x20\x20\x20\n\x1b@";

/// Base-unit divisor synthesized jobs declare in `( U`.
const JOB_BASE_UNITS: u16 = 1440;

/// Base-unit divisor declared in the `( D` nozzle-spacing record.
const NOZZLE_BASE_UNITS: u16 = 14_400;

/// Vertical feed between band rows, in vertical units.
const BAND_FEED: u32 = 118;

/// Ink planes in emission order, with each plane's band row offset.
///
/// The row offsets mirror the per-ink plot offsets on the decode side: the
/// cartridges do not start their bands on the same row.
const PLANE_ORDER: [(InkColor, Channel, i64); 4] = [
    (InkColor::Black, Channel::Key, 120),
    (InkColor::Cyan, Channel::Cyan, 120),
    (InkColor::Magenta, Channel::Magenta, 60),
    (InkColor::Yellow, Channel::Yellow, 0),
];

/// A print job compiled from a source image
///
/// Create a job with [`PrintJob::new`], adjust it with the builder methods,
/// then [`compile`](PrintJob::compile) it into raster command bytes.
///
/// # Example
/// ```no_run
/// # use escpr::printjob::PrintJob;
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let image = image::open("page.png")?;
/// let bytes = PrintJob::new(image).dpi(360).compile()?;
/// // Send bytes to the printer or save them as a capture...
/// # Ok(())
/// # }
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct PrintJob {
    image: DynamicImage,
    dpi: u32,
    page_width_mm: f64,
    page_length_mm: f64,
    compression: CompressionMode,
    tray: i8,
}

impl PrintJob {
    /// Create a print job with the L355 driver defaults
    ///
    /// # Defaults
    /// - **Resolution**: 360 dpi
    /// - **Page size**: A4 (210 × 297 mm)
    /// - **Compression**: none (the printer accepts raw payloads)
    /// - **Tray**: auto (−1)
    #[must_use]
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            dpi: 360,
            page_width_mm: 210.0,
            page_length_mm: 297.0,
            compression: CompressionMode::None,
            tray: -1,
        }
    }

    /// Set the print resolution
    ///
    /// The driver uses 180 (draft), 360 (normal), 720 or 1440 dpi.
    ///
    /// **Default**: 360
    #[must_use]
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the page size in millimeters
    ///
    /// **Default**: A4 (210 × 297 mm)
    #[must_use]
    pub fn page_size_mm(mut self, width: f64, length: f64) -> Self {
        self.page_width_mm = width;
        self.page_length_mm = length;
        self
    }

    /// Enable or disable PackBits compression of raster payloads
    ///
    /// **Default**: disabled; the printer accepts both forms.
    #[must_use]
    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compression = if compressed {
            CompressionMode::PackBits
        } else {
            CompressionMode::None
        };
        self
    }

    /// Compile the job into the ESC/P-R byte stream
    ///
    /// # Errors
    ///
    /// Fails when the source image is too small to produce a single band
    /// column.
    pub fn compile(&self) -> Result<Vec<u8>, EncodeError> {
        let bands = CmykImage::prepare(&self.image)?;
        debug!(
            width = bands.width(),
            height = bands.height(),
            chunks = bands.chunks(),
            dpi = self.dpi,
            "compiling print job"
        );

        let mut job = CommandBuilder::default();
        job.raw(JOB_HEADER);
        self.push_remote_preamble(&mut job);
        self.push_metadata(&mut job);
        self.push_bands(&mut job, &bands);
        self.push_epilogue(&mut job);
        Ok(job.build())
    }

    /// The opening remote block: job metadata the printer records before
    /// any raster data arrives.
    fn push_remote_preamble(&self, job: &mut CommandBuilder) {
        job.add(&EscCommand::EnterRemoteMode);
        job.add_remote(&RemoteCommand::paper_mode());
        job.add_remote(&RemoteCommand::paper_path(self.tray));
        job.add_remote(&RemoteCommand::time_stamp(2021, 5, 22, 5, 44, 27));
        job.add_remote(&RemoteCommand::duplex_off());
        job.add_remote(&RemoteCommand::select_mechanism());
        job.add_remote(&RemoteCommand::media_information());
        job.add_remote(&RemoteCommand::user_setting(0, 1));
        job.add_remote(&RemoteCommand::user_setting(1, 0));
        job.add_remote(&RemoteCommand::user_setting(2, 0));
        job.add_remote(&RemoteCommand::user_setting(5, 0));
        job.add_remote(&RemoteCommand::left_margin(0));
        job.add_remote(&RemoteCommand::End);
    }

    /// Unit, geometry and quality setup, as captured from the L355 driver.
    fn push_metadata(&self, job: &mut CommandBuilder) {
        let unit = (u32::from(JOB_BASE_UNITS) / self.dpi) as u8;

        // Opaque records the driver always sends; omitting them changes
        // nothing observable, so they are carried verbatim.
        job.add(&EscCommand::Unknown {
            name: b"(A".to_vec(),
            params: vec![0; 9],
        });
        job.add(&EscCommand::EnableGraphics);
        job.add(&EscCommand::SetUnits(UnitCommand::Ratios {
            page: unit,
            vertical: unit,
            horizontal: unit,
            base: JOB_BASE_UNITS,
        }));
        job.add(&EscCommand::PrintDirection {
            unidirectional: false,
        });
        job.add(&EscCommand::InterleaveMode { mode: 0 });
        job.add(&EscCommand::PageLength {
            length: self.page_units(self.page_length_mm),
        });
        // Default margins from the driver; the top margin is negative
        // because the first feed starts above the page origin.
        job.add(&EscCommand::VerticalMargins {
            top: -358,
            printable: 4407,
        });
        job.add(&EscCommand::PageSize {
            width: self.page_units(self.page_width_mm),
            length: self.page_units(self.page_length_mm),
        });
        // Color cartridges even for monochrome sources.
        job.add(&EscCommand::SetColorMode(ColorMode::Color(2)));
        job.add(&EscCommand::NozzleSpacing {
            base: NOZZLE_BASE_UNITS,
            vertical: (4 * u32::from(NOZZLE_BASE_UNITS) / 720) as u8,
            horizontal: (u32::from(NOZZLE_BASE_UNITS) / self.dpi) as u8,
        });
        job.add(&EscCommand::DotSize { size: 0x11 });
        job.add(&EscCommand::Unknown {
            name: b"(m".to_vec(),
            params: vec![0x20],
        });
        // The first feed the driver emits: 36.576 mm down from the top.
        job.add(&EscCommand::VerticalAdvance {
            feed: self.page_units(36.576),
        });
    }

    /// The band walk: every 60 source rows, one pass per ink plane.
    fn push_bands(&self, job: &mut CommandBuilder, bands: &CmykImage) {
        let height = i64::from(bands.height());
        let mut y = -120;
        while y < height + 240 {
            for (ink, channel, row_offset) in PLANE_ORDER {
                job.add(&EscCommand::HorizontalAdvance {
                    feed: self.page_units(1.0),
                });
                for chunk in 0..bands.chunks() {
                    let payload =
                        bands.band_payload(channel, i64::from(chunk * BAND_WIDTH), y + row_offset);
                    self.push_raster(job, ink, &payload);
                    job.add(&EscCommand::HorizontalAdvance {
                        feed: self.page_units(81.0),
                    });
                }
                job.add(&EscCommand::CarriageReturn);
            }
            job.add(&EscCommand::VerticalAdvance { feed: BAND_FEED });
            y += 60;
        }

        // Flush the head with one blank black band below the page.
        job.add(&EscCommand::VerticalAdvance {
            feed: self.page_units(1.0),
        });
        let blank = vec![0u8; (BAND_WIDTH * BAND_ROWS) as usize];
        self.push_raster(job, InkColor::Black, &blank);
    }

    fn push_raster(&self, job: &mut CommandBuilder, ink: InkColor, payload: &[u8]) {
        job.add(&EscCommand::Raster(RasterHeader {
            color: ink,
            compression: self.compression,
            bits_per_pixel: 2,
            bytes_per_row: BAND_WIDTH as u16,
            rows: BAND_ROWS as u16,
        }));
        match self.compression {
            CompressionMode::None => job.raw(payload),
            CompressionMode::PackBits => job.raw(&packbits::encode(payload)),
        }
    }

    /// Reset, the closing remote block, and the page eject.
    fn push_epilogue(&self, job: &mut CommandBuilder) {
        job.add(&EscCommand::Reset);
        job.add(&EscCommand::EnterRemoteMode);
        job.add_remote(&RemoteCommand::load_defaults());
        job.add_remote(&RemoteCommand::job_end());
        job.add_remote(&RemoteCommand::End);
        job.raw(b"\r\x0c");
    }

    fn page_units(&self, mm: f64) -> u32 {
        mm_to_page_units(mm, self.dpi).max(0) as u32
    }
}
