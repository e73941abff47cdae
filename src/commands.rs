//! Typed ESC/P-R commands and their wire forms
//!
//! Both sublanguages of the job stream are modeled here: the *normal* escape
//! commands ([`EscCommand`]) and the *remote-mode* records
//! ([`RemoteCommand`]). Every variant knows its exact byte form, so the same
//! types serve the parser (via [`EscCommand::classify`]) and the job
//! synthesizer (via the `Vec<u8>` conversions and [`CommandBuilder`]).

use strum::{Display, FromRepr};

use crate::units::{signed_le, ByteWidth};

#[cfg(feature = "serde")]
use serde::Deserialize;

/// The escape byte that opens a command window in the normal stream.
pub const ESC: u8 = 0x1b;

/// Re-initialization sequence some drivers embed mid-stream.
///
/// When a normal-mode buffer ends with this EJL handshake the printer treats
/// it like a reset.
pub const RESTART_SEQUENCE: &[u8] = b"\x01@EJL 1284.4\n@EJL\x20\x20\x20\x20\x20\n";

/// Parameter-block length for fixed-size single-letter commands.
///
/// Names missing from the table default to a conservative 99-byte payload,
/// which keeps unknown vendor commands from desynchronizing the stream.
pub(crate) fn fixed_param_len(name: u8) -> usize {
    match name {
        b'@' | b'\r' => 0,
        b'U' | b'\\' | b'r' => 1,
        b'i' => 7,
        _ => 99,
    }
}

/// Ink cartridge selected by a raster transfer.
///
/// Indices 3, 5 and 6 are rare variants seen in some drivers; 5 and 6 behave
/// as alternate blacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[repr(u8)]
pub enum InkColor {
    /// Black (index 0)
    Black = 0,
    /// Magenta (index 1)
    Magenta = 1,
    /// Cyan (index 2)
    Cyan = 2,
    /// Reserved index with black behavior (index 3)
    Reserved = 3,
    /// Yellow (index 4)
    Yellow = 4,
    /// Alternate black, first variant (index 5)
    AltBlackA = 5,
    /// Alternate black, second variant (index 6)
    AltBlackB = 6,
}

/// Compression applied to a raster payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[repr(u8)]
pub enum CompressionMode {
    /// Payload bytes are transferred verbatim
    None = 0,
    /// Payload is PackBits compressed
    PackBits = 1,
}

/// Color mode selected by `( K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Grayscale printing (mode byte 1)
    Grayscale,
    /// Color printing (mode byte 0 or 2)
    Color(u8),
}

impl ColorMode {
    fn mode_byte(self) -> u8 {
        match self {
            Self::Grayscale => 1,
            Self::Color(m) => m,
        }
    }
}

/// The two forms of the `( U` unit-configuration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCommand {
    /// 1-parameter form: all units are `value / 3600` inch
    Resolution {
        /// Unit size in multiples of 1/3600 inch
        value: u8,
    },
    /// 5-parameter form: per-unit ratios over an explicit base divisor
    Ratios {
        /// Page unit numerator
        page: u8,
        /// Vertical unit numerator
        vertical: u8,
        /// Horizontal unit numerator
        horizontal: u8,
        /// Base-unit divisor of one inch
        base: u16,
    },
}

/// Header of a raster transfer (`ESC i`).
///
/// The seven header bytes announce which ink the band belongs to, how the
/// payload is compressed, and the uncompressed band dimensions. The payload
/// itself follows the header immediately and is consumed by the framer, not
/// the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterHeader {
    /// Ink cartridge the band is printed with
    pub color: InkColor,
    /// Payload compression
    pub compression: CompressionMode,
    /// Bits per pixel; only 2 and 8 are plottable
    pub bits_per_pixel: u8,
    /// Uncompressed bytes per band row
    pub bytes_per_row: u16,
    /// Number of band rows
    pub rows: u16,
}

impl RasterHeader {
    /// Uncompressed payload size in bytes.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        usize::from(self.bytes_per_row) * usize::from(self.rows)
    }

    /// Band width in pixels.
    ///
    /// Meaningful only for the supported depths (2 and 8 bits per pixel),
    /// which the decoder validates before plotting.
    #[must_use]
    pub fn width_pixels(&self) -> usize {
        usize::from(self.bytes_per_row) * 8 / usize::from(self.bits_per_pixel.max(1))
    }
}

/// A parsed normal-mode command.
///
/// One variant per command the interpreter reacts to; frames whose name or
/// parameter shape is not recognized fold into [`EscCommand::Unknown`] and
/// are skipped without aborting the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscCommand {
    /// `ESC @` printer reset
    Reset,
    /// Bare `\r`: head returns to the line start
    CarriageReturn,
    /// `( R` with the `REMOTE1` magic: enter remote mode
    EnterRemoteMode,
    /// `( G` with parameter 1: enable graphics mode
    EnableGraphics,
    /// `( U`: configure the unit system
    SetUnits(UnitCommand),
    /// `U`: uni- or bidirectional head movement
    PrintDirection {
        /// `true` for unidirectional printing
        unidirectional: bool,
    },
    /// `( i`: raster interleave mode
    InterleaveMode {
        /// Raw interleave mode byte
        mode: u8,
    },
    /// `( C`: page length in page units
    PageLength {
        /// Page length in page units
        length: u32,
    },
    /// `( c`: vertical margins in page units
    VerticalMargins {
        /// Top margin; drivers send small negative values here
        top: i32,
        /// Printable page length
        printable: u32,
    },
    /// `( S`: printed page size in page units
    PageSize {
        /// Page width in page units
        width: u32,
        /// Page length in page units
        length: u32,
    },
    /// `( K`: color mode selection
    SetColorMode(ColorMode),
    /// `( D`: nozzle spacing metadata; informational
    NozzleSpacing {
        /// Base-unit divisor (14400 on the L355)
        base: u16,
        /// Vertical nozzle pitch numerator
        vertical: u8,
        /// Horizontal nozzle pitch numerator
        horizontal: u8,
    },
    /// `( e`: ink dot size; informational
    DotSize {
        /// Raw dot size byte
        size: u8,
    },
    /// `( v`: advance the head down by a vertical-unit feed
    VerticalAdvance {
        /// Feed in vertical units
        feed: u32,
    },
    /// `( $`: move the head right by a horizontal-unit feed
    HorizontalAdvance {
        /// Feed in horizontal units
        feed: u32,
    },
    /// `ESC i`: raster transfer header; payload follows on the wire
    Raster(RasterHeader),
    /// Anything the interpreter has no transition for
    Unknown {
        /// Command name bytes (one letter, or `(` plus a letter)
        name: Vec<u8>,
        /// Raw parameter block
        params: Vec<u8>,
    },
}

impl EscCommand {
    /// Classify a framed command from its name and parameter block.
    ///
    /// Frames whose parameters do not match the shape the interpreter
    /// expects are returned as [`EscCommand::Unknown`] rather than rejected;
    /// ESC/P is intentionally extensible and unknown commands are skipped.
    #[must_use]
    pub fn classify(name: &[u8], params: &[u8]) -> Self {
        match (name, params) {
            (b"@", _) => Self::Reset,
            (b"\r", _) => Self::CarriageReturn,
            (b"(R", b"\x00REMOTE1") => Self::EnterRemoteMode,
            (b"(G", [1, ..]) => Self::EnableGraphics,
            (b"(U", &[value]) => Self::SetUnits(UnitCommand::Resolution { value }),
            (b"(U", &[page, vertical, horizontal, base_lo, base_hi]) => {
                Self::SetUnits(UnitCommand::Ratios {
                    page,
                    vertical,
                    horizontal,
                    base: u16::from_le_bytes([base_lo, base_hi]),
                })
            }
            (b"U", &[direction]) => Self::PrintDirection {
                unidirectional: direction == 1,
            },
            (b"(i", &[mode]) => Self::InterleaveMode { mode },
            (b"(C", &[lo, hi]) => Self::PageLength {
                length: u32::from(u16::from_le_bytes([lo, hi])),
            },
            (b"(C", &[a, b, c, d]) => Self::PageLength {
                length: u32::from_le_bytes([a, b, c, d]),
            },
            (b"(c", &[t0, t1, l0, l1]) => Self::VerticalMargins {
                top: i32::from(i16::from_le_bytes([t0, t1])),
                printable: u32::from(u16::from_le_bytes([l0, l1])),
            },
            (b"(c", &[t0, t1, t2, t3, l0, l1, l2, l3]) => Self::VerticalMargins {
                top: i32::from_le_bytes([t0, t1, t2, t3]),
                printable: u32::from_le_bytes([l0, l1, l2, l3]),
            },
            (b"(S", &[w0, w1, w2, w3, l0, l1, l2, l3]) => Self::PageSize {
                width: u32::from_le_bytes([w0, w1, w2, w3]),
                length: u32::from_le_bytes([l0, l1, l2, l3]),
            },
            (b"(K", &[0, 1]) => Self::SetColorMode(ColorMode::Grayscale),
            (b"(K", &[0, m]) if m == 0 || m == 2 => Self::SetColorMode(ColorMode::Color(m)),
            (b"(D", &[base_lo, base_hi, vertical, horizontal]) => Self::NozzleSpacing {
                base: u16::from_le_bytes([base_lo, base_hi]),
                vertical,
                horizontal,
            },
            (b"(e", &[0, size]) => Self::DotSize { size },
            (b"(v", &[lo, hi]) => Self::VerticalAdvance {
                feed: u32::from(u16::from_le_bytes([lo, hi])),
            },
            (b"(v", &[a, b, c, d]) => Self::VerticalAdvance {
                feed: u32::from_le_bytes([a, b, c, d]),
            },
            (b"($", &[a, b, c, d]) => Self::HorizontalAdvance {
                feed: u32::from_le_bytes([a, b, c, d]),
            },
            (b"i", &[color, compress, bits, len_lo, len_hi, rows_lo, rows_hi]) => {
                match (InkColor::from_repr(color), CompressionMode::from_repr(compress)) {
                    (Some(color), Some(compression)) => Self::Raster(RasterHeader {
                        color,
                        compression,
                        bits_per_pixel: bits,
                        bytes_per_row: u16::from_le_bytes([len_lo, len_hi]),
                        rows: u16::from_le_bytes([rows_lo, rows_hi]),
                    }),
                    _ => Self::Unknown {
                        name: name.to_vec(),
                        params: params.to_vec(),
                    },
                }
            }
            _ => Self::Unknown {
                name: name.to_vec(),
                params: params.to_vec(),
            },
        }
    }
}

impl From<&EscCommand> for Vec<u8> {
    fn from(value: &EscCommand) -> Self {
        use EscCommand as C;

        fn length_prefixed(name: &[u8; 2], params: &[u8]) -> Vec<u8> {
            let mut out = vec![ESC];
            out.extend_from_slice(name);
            out.extend_from_slice(&(params.len() as u16).to_le_bytes());
            out.extend_from_slice(params);
            out
        }

        match value {
            C::Reset => vec![ESC, b'@'],
            // `\r` rides in the stream bare, without an escape.
            C::CarriageReturn => vec![b'\r'],
            C::EnterRemoteMode => length_prefixed(b"(R", b"\x00REMOTE1"),
            C::EnableGraphics => length_prefixed(b"(G", &[1]),
            C::SetUnits(UnitCommand::Resolution { value }) => length_prefixed(b"(U", &[*value]),
            C::SetUnits(UnitCommand::Ratios {
                page,
                vertical,
                horizontal,
                base,
            }) => {
                let [base_lo, base_hi] = base.to_le_bytes();
                length_prefixed(b"(U", &[*page, *vertical, *horizontal, base_lo, base_hi])
            }
            C::PrintDirection { unidirectional } => vec![ESC, b'U', u8::from(*unidirectional)],
            C::InterleaveMode { mode } => length_prefixed(b"(i", &[*mode]),
            C::PageLength { length } => length_prefixed(b"(C", &length.to_le_bytes()),
            C::VerticalMargins { top, printable } => {
                let mut params = signed_le(i64::from(*top), ByteWidth::Four);
                params.extend_from_slice(&printable.to_le_bytes());
                length_prefixed(b"(c", &params)
            }
            C::PageSize { width, length } => {
                let mut params = width.to_le_bytes().to_vec();
                params.extend_from_slice(&length.to_le_bytes());
                length_prefixed(b"(S", &params)
            }
            C::SetColorMode(mode) => length_prefixed(b"(K", &[0, mode.mode_byte()]),
            C::NozzleSpacing {
                base,
                vertical,
                horizontal,
            } => {
                let [base_lo, base_hi] = base.to_le_bytes();
                length_prefixed(b"(D", &[base_lo, base_hi, *vertical, *horizontal])
            }
            C::DotSize { size } => length_prefixed(b"(e", &[0, *size]),
            C::VerticalAdvance { feed } => length_prefixed(b"(v", &feed.to_le_bytes()),
            C::HorizontalAdvance { feed } => length_prefixed(b"($", &feed.to_le_bytes()),
            C::Raster(header) => {
                let mut out = vec![
                    ESC,
                    b'i',
                    header.color as u8,
                    header.compression as u8,
                    header.bits_per_pixel,
                ];
                out.extend_from_slice(&header.bytes_per_row.to_le_bytes());
                out.extend_from_slice(&header.rows.to_le_bytes());
                out
            }
            C::Unknown { name, params } => match name.as_slice() {
                [b'(', letter] => length_prefixed(&[b'(', *letter], params),
                _ => {
                    let mut out = vec![ESC];
                    out.extend_from_slice(name);
                    out.extend_from_slice(params);
                    out
                }
            },
        }
    }
}

/// A remote-mode record.
///
/// Remote mode is the maintenance-and-metadata sublanguage: two-letter
/// records with a little-endian length, terminated collectively by the
/// `ESC \x00\x00\x00` sentinel. The interpreter treats all records as
/// informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// The `ESC \x00\x00\x00` sentinel leaving remote mode
    End,
    /// A two-letter record with its raw parameter block
    Record {
        /// Record name (two ASCII letters)
        name: [u8; 2],
        /// Raw parameter block
        params: Vec<u8>,
    },
}

impl RemoteCommand {
    fn record(name: [u8; 2], params: &[u8]) -> Self {
        Self::Record {
            name,
            params: params.to_vec(),
        }
    }

    /// `PM`: paper mode record sent at job start.
    #[must_use]
    pub fn paper_mode() -> Self {
        Self::record(*b"PM", &[0, 0])
    }

    /// `PP`: select the paper path (tray).
    #[must_use]
    pub fn paper_path(tray: i8) -> Self {
        Self::record(*b"PP", &[0, 1, tray as u8])
    }

    /// `TI`: job timestamp (year big-endian, then month, day, hour, minute,
    /// second).
    #[must_use]
    pub fn time_stamp(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let [year_hi, year_lo] = year.to_be_bytes();
        Self::record(*b"TI", &[0, year_hi, year_lo, month, day, hour, minute, second])
    }

    /// `DP`: duplex record sent at job start.
    #[must_use]
    pub fn duplex_off() -> Self {
        Self::record(*b"DP", &[0, 0])
    }

    /// `SN`: select mechanism sequence.
    #[must_use]
    pub fn select_mechanism() -> Self {
        Self::record(*b"SN", &[0])
    }

    /// `MI`: media information record.
    #[must_use]
    pub fn media_information() -> Self {
        Self::record(*b"MI", &[0, 1, 0, 0])
    }

    /// `US`: user-setting register write.
    #[must_use]
    pub fn user_setting(register: u8, value: u8) -> Self {
        Self::record(*b"US", &[0, register, value])
    }

    /// `FP`: horizontal left margin in units of 1/360 inch; `0xffb0` means
    /// borderless.
    #[must_use]
    pub fn left_margin(units: u16) -> Self {
        let [lo, hi] = units.to_le_bytes();
        Self::record(*b"FP", &[0, lo, hi])
    }

    /// `LD`: load the printer's saved settings.
    #[must_use]
    pub fn load_defaults() -> Self {
        Self::record(*b"LD", &[])
    }

    /// `JE`: end the print job.
    #[must_use]
    pub fn job_end() -> Self {
        Self::record(*b"JE", &[0])
    }
}

impl From<&RemoteCommand> for Vec<u8> {
    fn from(value: &RemoteCommand) -> Self {
        match value {
            RemoteCommand::End => vec![ESC, 0, 0, 0],
            RemoteCommand::Record { name, params } => {
                let mut out = name.to_vec();
                out.extend_from_slice(&(params.len() as u16).to_le_bytes());
                out.extend_from_slice(params);
                out
            }
        }
    }
}

/// A command parsed from either sublanguage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Normal-mode escape command
    Normal(EscCommand),
    /// Remote-mode record
    Remote(RemoteCommand),
}

/// Accumulates command byte forms into one job buffer.
///
/// The synthesizer pushes typed commands and the occasional raw byte run
/// (raster payloads, the page eject) and concatenates them at the end.
#[derive(Default)]
pub(crate) struct CommandBuilder {
    chunks: Vec<Vec<u8>>,
}

impl CommandBuilder {
    pub fn add(&mut self, cmd: &EscCommand) {
        self.chunks.push(cmd.into());
    }

    pub fn add_remote(&mut self, cmd: &RemoteCommand) {
        self.chunks.push(cmd.into());
    }

    pub fn raw(&mut self, bytes: &[u8]) {
        self.chunks.push(bytes.to_vec());
    }

    pub fn build(self) -> Vec<u8> {
        self.chunks.concat()
    }
}
