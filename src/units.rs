//! Unit arithmetic for ESC/P-R coordinates
//!
//! ESC/P-R expresses every distance as an integer multiple of a *base unit*,
//! a divisor of one inch (typically 1/14400 inch). The `( U` command derives
//! three working units from it: *page units* for page coordinates, *vertical
//! units* for head feeds, and *horizontal units* for head travel. This module
//! holds the conversions between millimeters, inches, and those units, plus
//! the little-endian two's-complement byte encoding used by command
//! parameters.

/// Base unit divisor declared by the L355 driver: 1/14400 inch.
pub const BASE_UNITS_PER_INCH: u32 = 14_400;

/// Millimeters per inch.
const MM_PER_INCH: f64 = 25.4;

/// Parameter byte width for little-endian encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteWidth {
    /// Single byte (`u8`-sized parameter)
    One = 1,
    /// Two bytes (`u16`-sized parameter)
    Two = 2,
    /// Four bytes (`u32`-sized parameter)
    Four = 4,
}

/// Encode a signed value as little-endian two's complement.
///
/// Negative values wrap into the unsigned range of the requested width
/// (`value mod 2^(8 * width)`), matching how the printer reads signed
/// parameters such as the negative top margin of `( c`.
///
/// # Examples
///
/// ```
/// use escpr::units::{signed_le, ByteWidth};
///
/// assert_eq!(signed_le(-358, ByteWidth::Four), vec![0x9a, 0xfe, 0xff, 0xff]);
/// assert_eq!(signed_le(0x1234, ByteWidth::Two), vec![0x34, 0x12]);
/// ```
#[must_use]
pub fn signed_le(value: i64, width: ByteWidth) -> Vec<u8> {
    let width = width as usize;
    let mask = if width == 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    };
    // Two's complement already is `value mod 2^n` on the low bits.
    let num = (value as u64) & mask;
    num.to_le_bytes()[..width].to_vec()
}

/// Convert millimeters to page units at the given resolution.
///
/// One page unit is `1/dpi` inch, so the conversion is
/// `ceil(mm * dpi / 25.4)` with the ceiling taken toward positive infinity.
#[must_use]
pub fn mm_to_page_units(mm: f64, dpi: u32) -> i64 {
    (mm * f64::from(dpi) / MM_PER_INCH).ceil() as i64
}

/// Convert millimeters to inches.
#[must_use]
pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// The working units configured by a `( U` command.
///
/// Units are stored as fractions of an inch rather than in raw base-unit
/// multiples so that later commands can be interpreted uniformly regardless
/// of which `( U` form configured them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConfig {
    /// Base-unit divisor of one inch (e.g. 14400 or 1440)
    pub base_per_inch: u32,
    /// Page unit in inches
    pub page_unit: f64,
    /// Vertical unit in inches
    pub v_unit: f64,
    /// Horizontal unit in inches
    pub h_unit: f64,
    /// Resolution implied by the page unit
    pub dpi: f64,
    /// Raw page-unit parameter as sent on the wire
    pub page_unit_raw: u32,
}

impl UnitConfig {
    /// Build from the 1-parameter `( U` form.
    ///
    /// The single parameter is a multiple of 1/3600 inch shared by all three
    /// units; the implied resolution is `3600 / value` dpi.
    #[must_use]
    pub fn from_resolution(value: u8) -> Self {
        let unit = f64::from(value) / 3600.0;
        Self {
            base_per_inch: 3600,
            page_unit: unit,
            v_unit: unit,
            h_unit: unit,
            dpi: 3600.0 / f64::from(value),
            page_unit_raw: u32::from(value),
        }
    }

    /// Build from the 5-parameter `( U` form.
    ///
    /// Each unit is `ratio / base` inches, where `base` is the little-endian
    /// base-unit divisor from the final two parameter bytes.
    #[must_use]
    pub fn from_ratios(page: u8, vertical: u8, horizontal: u8, base: u16) -> Self {
        let base_f = f64::from(base);
        Self {
            base_per_inch: u32::from(base),
            page_unit: f64::from(page) / base_f,
            v_unit: f64::from(vertical) / base_f,
            h_unit: f64::from(horizontal) / base_f,
            dpi: base_f / f64::from(page),
            page_unit_raw: u32::from(page),
        }
    }

    /// Vertical head travel in inches for `n` vertical units.
    #[must_use]
    pub fn vunits_to_inches(&self, n: i64) -> f64 {
        n as f64 * self.v_unit
    }

    /// Horizontal head travel in inches for `n` horizontal units.
    #[must_use]
    pub fn hunits_to_inches(&self, n: i64) -> f64 {
        n as f64 * self.h_unit
    }

    /// Page-coordinate distance in inches for `n` page units.
    #[must_use]
    pub fn page_units_to_inches(&self, n: i64) -> f64 {
        n as f64 * self.page_unit
    }
}
