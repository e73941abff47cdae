//! Printer status information parsing and types
//!
//! Epson network printers report their condition out of band, not over the
//! raw-print socket: an IEEE-1284 style device-ID string (`KEY:value;`
//! rows) and a binary `@BDC ST2` blob, both typically fetched over SNMP.
//! This module parses the bytes; how they were fetched is the caller's
//! business.

use bitflags::bitflags;

use crate::error::StatusParseError;

bitflags! {
/// Ink tanks the printer reports as holding ink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkTanks: u8 {
    const Black = 0b1 << 0;
    const Cyan = 0b1 << 1;
    const Magenta = 0b1 << 2;
    const Yellow = 0b1 << 3;
}
}

/// What the printer is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterActivity {
    /// An error stops the printer
    Error,
    /// Busy, e.g. with a maintenance pass
    Busy,
    /// A job is being printed
    Printing,
    /// Idle and ready
    Idle,
    /// Powering down
    ShuttingDown,
    /// A state code this crate does not know
    Unknown(u8),
}

impl From<u8> for PrinterActivity {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Error,
            2 => Self::Busy,
            3 => Self::Printing,
            4 => Self::Idle,
            10 => Self::ShuttingDown,
            other => Self::Unknown(other),
        }
    }
}

/// Error condition reported alongside [`PrinterActivity::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCondition {
    /// Unrecoverable hardware fault
    Fatal,
    /// Paper jam
    PaperJam,
    /// An ink tank is empty
    NoInk,
    /// The paper tray is empty
    NoPaper,
    /// The waste-ink pad is saturated
    InkOverflow,
    /// The driver does not match the device
    DriverMismatch,
    /// An error code this crate does not know
    Unknown(u8),
}

impl From<u8> for ErrorCondition {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Fatal,
            4 => Self::PaperJam,
            5 => Self::NoInk,
            6 => Self::NoPaper,
            16 => Self::InkOverflow,
            0x4b => Self::DriverMismatch,
            other => Self::Unknown(other),
        }
    }
}

/// Identity rows from the device-ID string
///
/// The string is `KEY:value;` rows, e.g.
/// `MFG:EPSON;CMD:ESCPL2,BDC;MDL:L355 Series;CLS:PRINTER;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Command sets the device speaks (`CMD` row)
    pub command_set: String,
    /// Model name (`MDL` row)
    pub model: String,
    /// Device class (`CLS` row)
    pub class: String,
}

impl std::str::FromStr for DeviceIdentity {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut command_set = None;
        let mut model = None;
        let mut class = None;
        for row in s.split(';') {
            let Some((key, value)) = row.split_once(':') else {
                continue;
            };
            match key {
                "CMD" => command_set = Some(value.to_owned()),
                "MDL" => model = Some(value.to_owned()),
                "CLS" => class = Some(value.to_owned()),
                _ => {}
            }
        }
        let missing =
            |field: &str| StatusParseError::new(format!("device ID lacks a {field} row"));
        Ok(Self {
            command_set: command_set.ok_or_else(|| missing("CMD"))?,
            model: model.ok_or_else(|| missing("MDL"))?,
            class: class.ok_or_else(|| missing("CLS"))?,
        })
    }
}

/// Parsed `@BDC ST2` status reply
///
/// The blob is a sequence of `(type, size, data)` records after a two-byte
/// payload length; records this crate does not know are skipped by size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReply {
    /// Printer activity (record type 1)
    pub activity: Option<PrinterActivity>,
    /// Error condition (record type 2)
    pub error: Option<ErrorCondition>,
    /// Ink availability (record type 15); all tanks assumed full until the
    /// record says otherwise
    pub ink: InkTanks,
    /// Whether a job is being printed (record type 25)
    pub printing_job: Option<bool>,
    /// Lifetime color page counter (record type 54)
    pub printed_color_pages: Option<u32>,
    /// Lifetime monochrome page counter (record type 54)
    pub printed_monochrome_pages: Option<u32>,
}

impl StatusReply {
    /// Whether the reply carries an error condition.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Marker the printer sends in the current-job record when idle.
const NO_JOB_MARKER: &[u8] = b"\x00\x00\x00\x00\x00unknown";

impl TryFrom<&[u8]> for StatusReply {
    type Error = StatusParseError;

    fn try_from(blob: &[u8]) -> Result<Self, StatusParseError> {
        let payload = blob
            .strip_prefix(b"@BDC ST2\r\n")
            .ok_or_else(|| StatusParseError::new("missing @BDC ST2 header"))?;
        let (&[len_lo, len_hi], records) = payload.split_first_chunk::<2>().ok_or_else(|| {
            StatusParseError::new("status payload shorter than its length field")
        })?;
        let length = usize::from(u16::from_le_bytes([len_lo, len_hi]));

        let mut reply = Self {
            activity: None,
            error: None,
            ink: InkTanks::all(),
            printing_job: None,
            printed_color_pages: None,
            printed_monochrome_pages: None,
        };

        let mut offset = 0;
        while offset < length {
            let header = records.get(offset..offset + 2).ok_or_else(|| {
                StatusParseError::new(format!("record header truncated at offset {offset}"))
            })?;
            let (rtype, rsize) = (header[0], usize::from(header[1]));
            let data = records.get(offset + 2..offset + 2 + rsize).ok_or_else(|| {
                StatusParseError::new(format!(
                    "record {rtype} claims {rsize} byte(s) past the end of the payload"
                ))
            })?;

            match (rtype, data) {
                (1, [code, ..]) => reply.activity = Some(PrinterActivity::from(*code)),
                (2, [code, ..]) => reply.error = Some(ErrorCondition::from(*code)),
                (15, [block_size, blocks @ ..]) => {
                    reply.ink = parse_ink_blocks(usize::from(*block_size), blocks);
                }
                (25, _) => reply.printing_job = Some(data != NO_JOB_MARKER),
                (54, _) if data.len() >= 16 => {
                    // Two leading counters are unused by this generation.
                    reply.printed_color_pages = Some(read_u32(&data[8..12]));
                    reply.printed_monochrome_pages = Some(read_u32(&data[12..16]));
                }
                _ => {}
            }
            offset += 2 + rsize;
        }

        Ok(reply)
    }
}

fn parse_ink_blocks(block_size: usize, blocks: &[u8]) -> InkTanks {
    let mut tanks = InkTanks::all();
    if block_size < 3 {
        return tanks;
    }
    for block in blocks.chunks_exact(block_size) {
        let tank = match block[1] {
            0 => InkTanks::Black,
            1 => InkTanks::Cyan,
            2 => InkTanks::Magenta,
            3 => InkTanks::Yellow,
            _ => continue,
        };
        tanks.set(tank, block[2] == 0x69);
    }
    tanks
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn st2(records: &[u8]) -> Vec<u8> {
        let mut blob = b"@BDC ST2\r\n".to_vec();
        blob.extend_from_slice(&(records.len() as u16).to_le_bytes());
        blob.extend_from_slice(records);
        blob
    }

    #[test]
    fn parses_activity_and_error_records() {
        let blob = st2(&[1, 1, 4, 2, 1, 5]);
        let reply = StatusReply::try_from(blob.as_slice()).unwrap();
        assert_eq!(reply.activity, Some(PrinterActivity::Idle));
        assert_eq!(reply.error, Some(ErrorCondition::NoInk));
        assert!(reply.has_error());
    }

    #[test]
    fn parses_ink_blocks() {
        // Block size 3; cyan dry, the rest holding ink.
        let blob = st2(&[
            15, 13, 3, 0, 0, 0x69, 0, 1, 0x6e, 0, 2, 0x69, 0, 3, 0x69,
        ]);
        let reply = StatusReply::try_from(blob.as_slice()).unwrap();
        assert_eq!(reply.ink, InkTanks::all() - InkTanks::Cyan);
    }

    #[test]
    fn parses_page_counters() {
        let mut record = vec![54, 16];
        record.extend_from_slice(&[0; 8]);
        record.extend_from_slice(&1234u32.to_le_bytes());
        record.extend_from_slice(&77u32.to_le_bytes());
        let blob = st2(&record);
        let reply = StatusReply::try_from(blob.as_slice()).unwrap();
        assert_eq!(reply.printed_color_pages, Some(1234));
        assert_eq!(reply.printed_monochrome_pages, Some(77));
    }

    #[test]
    fn skips_unknown_records() {
        let blob = st2(&[99, 2, 0xde, 0xad, 1, 1, 3]);
        let reply = StatusReply::try_from(blob.as_slice()).unwrap();
        assert_eq!(reply.activity, Some(PrinterActivity::Printing));
    }

    #[test]
    fn rejects_bad_magic_and_truncation() {
        assert!(StatusReply::try_from(&b"@BDC ST1\r\n\x00\x00"[..]).is_err());
        // Record claims bytes past the payload end.
        let blob = st2(&[1, 9, 4]);
        assert!(StatusReply::try_from(blob.as_slice()).is_err());
    }

    #[test]
    fn device_identity_rows() {
        let id: DeviceIdentity = "MFG:EPSON;CMD:ESCPL2,BDC,D4;MDL:L355 Series;CLS:PRINTER;"
            .parse()
            .unwrap();
        assert_eq!(id.command_set, "ESCPL2,BDC,D4");
        assert_eq!(id.model, "L355 Series");
        assert_eq!(id.class, "PRINTER");
        assert!("MFG:EPSON;CLS:PRINTER;".parse::<DeviceIdentity>().is_err());
    }
}
