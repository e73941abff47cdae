//! Printer state machine
//!
//! The interpreter owns a [`PrinterState`] value and drives it with parsed
//! commands. State transitions are the whole contract: mode flags, the unit
//! system, page geometry, head position, and the raster transfer the framer
//! is expected to consume next. The state never touches the canvas; plotting
//! side effects belong to the decoder loop.

use tracing::{debug, trace, warn};

use crate::commands::{ColorMode, Command, EscCommand, RasterHeader, RemoteCommand, UnitCommand};
use crate::units::UnitConfig;

/// Head row the printer assumes before the first explicit feed.
///
/// The first `( v` of a job lands above the nominal page origin; starting
/// the emulation at −80 page units reproduces where ink actually appears.
pub const INITIAL_HEAD_TOP: i64 = -80;

/// Page geometry in page units.
///
/// Every field is unset until its configuring command arrives; consumers
/// that need geometry before then report an unconfigured error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageGeometry {
    /// Printed page width from `( S`
    pub width: Option<u32>,
    /// Printed page length from `( S` (or `( C` alone)
    pub length: Option<u32>,
    /// Top margin from `( c`; drivers send small negative values
    pub top_margin: Option<i32>,
    /// Printable length from `( c`
    pub printable_length: Option<u32>,
}

/// Current print-head location in page units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadPosition {
    /// Distance from the left page edge
    pub left: i64,
    /// Distance from the top page edge; negative above the origin
    pub top: i64,
}

impl Default for HeadPosition {
    fn default() -> Self {
        Self {
            left: 0,
            top: INITIAL_HEAD_TOP,
        }
    }
}

/// Complete interpreter state for one job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrinterState {
    /// Remote (maintenance/metadata) mode is active
    pub remote: bool,
    /// Graphics mode was enabled by `( G`
    pub graphics: bool,
    /// Unit system from the most recent `( U`
    pub units: Option<UnitConfig>,
    /// Declared page geometry
    pub geometry: PageGeometry,
    /// Print-head position
    pub head: HeadPosition,
    /// Raster transfer whose payload the framer must consume next
    pub pending_raster: Option<RasterHeader>,
    /// Print direction from `U`, if declared
    pub unidirectional: Option<bool>,
    /// Interleave mode from `( i`, if declared
    pub interleave: Option<u8>,
    /// Color mode from `( K`, if declared
    pub color_mode: Option<ColorMode>,
}

impl PrinterState {
    /// Fresh state for the start of a job.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one parsed command.
    ///
    /// Raster consumption itself happens in the decoder loop; this only
    /// records the pending transfer. Unknown commands are logged and
    /// skipped.
    pub fn apply(&mut self, cmd: &Command) {
        match cmd {
            Command::Normal(cmd) => self.apply_normal(cmd),
            Command::Remote(cmd) => self.apply_remote(cmd),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn apply_normal(&mut self, cmd: &EscCommand) {
        match cmd {
            EscCommand::Reset => {
                debug!("printer reset");
                self.graphics = false;
                self.remote = false;
                self.pending_raster = None;
            }
            EscCommand::CarriageReturn => {
                trace!("carriage return, head back to line start");
                self.head.left = 0;
                self.graphics = false;
                self.remote = false;
                self.pending_raster = None;
            }
            EscCommand::EnterRemoteMode => {
                debug!("entering remote mode");
                self.remote = true;
            }
            EscCommand::EnableGraphics => {
                debug!("graphics mode enabled");
                self.graphics = true;
            }
            EscCommand::SetUnits(units) => {
                let config = match *units {
                    UnitCommand::Resolution { value } => UnitConfig::from_resolution(value),
                    UnitCommand::Ratios {
                        page,
                        vertical,
                        horizontal,
                        base,
                    } => UnitConfig::from_ratios(page, vertical, horizontal, base),
                };
                debug!(
                    dpi = config.dpi,
                    page_unit = config.page_unit,
                    v_unit = config.v_unit,
                    h_unit = config.h_unit,
                    "unit system configured"
                );
                self.units = Some(config);
            }
            EscCommand::PrintDirection { unidirectional } => {
                debug!(
                    direction = if *unidirectional {
                        "unidirectional"
                    } else {
                        "bidirectional"
                    },
                    "print direction"
                );
                self.unidirectional = Some(*unidirectional);
            }
            EscCommand::InterleaveMode { mode } => {
                debug!(mode, "interleave mode");
                self.interleave = Some(*mode);
            }
            EscCommand::PageLength { length } => {
                debug!(length, inches = self.page_units_to_inches(*length), "page length");
                self.geometry.length = Some(*length);
            }
            EscCommand::VerticalMargins { top, printable } => {
                debug!(top, printable, "vertical margins");
                self.geometry.top_margin = Some(*top);
                self.geometry.printable_length = Some(*printable);
            }
            EscCommand::PageSize { width, length } => {
                debug!(
                    width,
                    length,
                    width_inches = self.page_units_to_inches(*width),
                    length_inches = self.page_units_to_inches(*length),
                    "printed page size"
                );
                self.geometry.width = Some(*width);
                self.geometry.length = Some(*length);
            }
            EscCommand::SetColorMode(mode) => {
                debug!(?mode, "color mode");
                self.color_mode = Some(*mode);
            }
            EscCommand::NozzleSpacing {
                base,
                vertical,
                horizontal,
            } => {
                // Informational: nozzle pitch as fractions of an inch.
                debug!(
                    base,
                    vertical,
                    horizontal,
                    v_pitch = f64::from(*vertical) * 720.0 / f64::from(*base),
                    h_pitch = f64::from(*horizontal) / f64::from(*base),
                    "nozzle spacing"
                );
            }
            EscCommand::DotSize { size } => {
                debug!(size, "dot size");
            }
            EscCommand::VerticalAdvance { feed } => {
                self.head.top += i64::from(*feed);
                debug!(
                    feed,
                    head_top = self.head.top,
                    head_left = self.head.left,
                    "vertical advance"
                );
            }
            EscCommand::HorizontalAdvance { feed } => {
                self.head.left += i64::from(*feed);
                debug!(
                    feed,
                    head_top = self.head.top,
                    head_left = self.head.left,
                    "horizontal advance"
                );
            }
            EscCommand::Raster(header) => {
                debug!(
                    color = %header.color,
                    compression = %header.compression,
                    bpp = header.bits_per_pixel,
                    bytes_per_row = header.bytes_per_row,
                    rows = header.rows,
                    expected = header.payload_len(),
                    "raster transfer announced"
                );
                self.pending_raster = Some(*header);
            }
            EscCommand::Unknown { name, params } => {
                warn!(
                    name = %name.escape_ascii(),
                    param_len = params.len(),
                    "unknown command skipped"
                );
            }
        }
    }

    fn apply_remote(&mut self, cmd: &RemoteCommand) {
        match cmd {
            RemoteCommand::End => {
                debug!("leaving remote mode");
                self.remote = false;
            }
            RemoteCommand::Record { name, params } => match (name, params.as_slice()) {
                (b"SN", [0, operation, value]) => {
                    debug!(operation, value, "remote: select mechanism sequence");
                }
                (b"FP", [0, lo, hi]) => {
                    let units = u16::from_le_bytes([*lo, *hi]);
                    if units == 0xffb0 {
                        debug!("remote: horizontal left margin borderless");
                    } else {
                        debug!(
                            units,
                            inches = f64::from(units) / 360.0,
                            "remote: horizontal left margin"
                        );
                    }
                }
                (b"PP", [0, tray, number]) => {
                    debug!(tray, number, "remote: select paper path");
                }
                _ => {
                    debug!(
                        name = %name.escape_ascii(),
                        param_len = params.len(),
                        "remote record (informational)"
                    );
                }
            },
        }
    }

    fn page_units_to_inches(&self, n: u32) -> f64 {
        self.units
            .map_or(0.0, |units| units.page_units_to_inches(i64::from(n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CompressionMode, InkColor};
    use pretty_assertions::assert_eq;

    fn normal(cmd: EscCommand) -> Command {
        Command::Normal(cmd)
    }

    #[test]
    fn head_starts_above_the_page_origin() {
        let state = PrinterState::new();
        assert_eq!(state.head.top, -80);
        assert_eq!(state.head.left, 0);
    }

    #[test]
    fn vertical_advance_moves_the_head_down() {
        let mut state = PrinterState::new();
        state.apply(&normal(EscCommand::VerticalAdvance { feed: 100 }));
        assert_eq!(state.head.top, 20);
        state.apply(&normal(EscCommand::HorizontalAdvance { feed: 15 }));
        assert_eq!(state.head.left, 15);
    }

    #[test]
    fn carriage_return_zeroes_head_left() {
        let mut state = PrinterState::new();
        state.apply(&normal(EscCommand::HorizontalAdvance { feed: 1148 }));
        state.apply(&normal(EscCommand::VerticalAdvance { feed: 519 }));
        state.apply(&normal(EscCommand::CarriageReturn));
        assert_eq!(state.head.left, 0);
        // The vertical position is untouched.
        assert_eq!(state.head.top, 439);
    }

    #[test]
    fn reset_clears_modes_but_not_the_head() {
        let mut state = PrinterState::new();
        state.apply(&normal(EscCommand::EnableGraphics));
        state.apply(&normal(EscCommand::EnterRemoteMode));
        state.apply(&normal(EscCommand::Reset));
        assert!(!state.graphics);
        assert!(!state.remote);
        assert_eq!(state.pending_raster, None);
    }

    #[test]
    fn remote_mode_round_trip() {
        let mut state = PrinterState::new();
        state.apply(&normal(EscCommand::EnterRemoteMode));
        assert!(state.remote);
        state.apply(&Command::Remote(RemoteCommand::Record {
            name: *b"PM",
            params: vec![0, 0],
        }));
        assert!(state.remote);
        state.apply(&Command::Remote(RemoteCommand::End));
        assert!(!state.remote);
    }

    #[test]
    fn single_parameter_units_set_dpi() {
        let mut state = PrinterState::new();
        state.apply(&normal(EscCommand::SetUnits(UnitCommand::Resolution {
            value: 10,
        })));
        let units = state.units.unwrap();
        assert_eq!(units.dpi, 360.0);
    }

    #[test]
    fn raster_header_becomes_pending() {
        let mut state = PrinterState::new();
        let header = RasterHeader {
            color: InkColor::Cyan,
            compression: CompressionMode::PackBits,
            bits_per_pixel: 2,
            bytes_per_row: 288,
            rows: 60,
        };
        state.apply(&normal(EscCommand::Raster(header)));
        assert_eq!(state.pending_raster, Some(header));
        assert_eq!(state.pending_raster.unwrap().payload_len(), 17_280);
    }

    #[test]
    fn geometry_fields_stay_unset_until_configured() {
        let mut state = PrinterState::new();
        assert_eq!(state.geometry, PageGeometry::default());
        state.apply(&normal(EscCommand::PageSize {
            width: 2977,
            length: 4209,
        }));
        assert_eq!(state.geometry.width, Some(2977));
        assert_eq!(state.geometry.length, Some(4209));
        state.apply(&normal(EscCommand::VerticalMargins {
            top: -358,
            printable: 4407,
        }));
        assert_eq!(state.geometry.top_margin, Some(-358));
    }
}
