//! Decode-side raster compositing
//!
//! Raster bands land on an RGB canvas that emulates paper: each ink value
//! maps onto a per-cartridge gradient and is blended *subtractively*, the
//! way overlapping ink layers behave, rather than added like light. Band
//! rows are doubled vertically because the head covers two page units per
//! raster row at the resolutions the L355 prints with.

use image::{Rgb, RgbImage};

use crate::commands::InkColor;
use crate::error::DecodeError;

/// Per-ink gradient endpoints: the color at full ink and at no ink.
const INK_GRADIENTS: [([u8; 3], [u8; 3]); 7] = [
    ([0x00, 0x00, 0x00], [0xff, 0xff, 0xff]), // black
    ([0xff, 0x00, 0xff], [0xff, 0xff, 0xff]), // magenta
    ([0x00, 0xff, 0xff], [0xff, 0xff, 0xff]), // cyan
    ([0x00, 0x00, 0x00], [0xff, 0xff, 0xff]), // reserved index 3
    ([0xff, 0xff, 0x00], [0xff, 0xff, 0xff]), // yellow
    ([0x11, 0x11, 0x11], [0xff, 0xff, 0xff]), // alternate black
    ([0x22, 0x22, 0x22], [0xff, 0xff, 0xff]), // alternate black
];

/// Vertical plot offset per ink index, in page units.
///
/// Some cartridges start their bands above the nominal head position; the
/// offsets are multiples of the 60-row band height.
const INK_Y_OFFSETS: [i64; 7] = [0, -120, 0, 0, -240, -120, -240];

/// Vertical plot offset for an ink cartridge.
#[must_use]
pub fn ink_y_offset(ink: InkColor) -> i64 {
    INK_Y_OFFSETS[ink as usize]
}

/// Composite one raster band onto the canvas.
///
/// `origin_x`/`origin_y` locate the band's top-left corner in canvas pixels
/// (page units); the per-ink Y offset is expected to be applied by the
/// caller. Each band row is written twice for the 2× vertical stretch, and
/// pixels falling outside the canvas are silently skipped.
///
/// # Errors
///
/// Returns [`DecodeError::UnsupportedBpp`] for pixel depths other than 2
/// and 8.
pub fn plot_band(
    canvas: &mut RgbImage,
    origin_x: i64,
    origin_y: i64,
    width: usize,
    rows: usize,
    ink: InkColor,
    payload: &[u8],
    bpp: u8,
) -> Result<(), DecodeError> {
    if bpp != 2 && bpp != 8 {
        return Err(DecodeError::UnsupportedBpp(bpp));
    }
    let max_value = f64::from((1u16 << bpp) - 1);
    let (full, blank) = (INK_GRADIENTS[ink as usize].0, INK_GRADIENTS[ink as usize].1);

    for row in 0..rows {
        for col in 0..width {
            let index = row * width + col;
            let value = if bpp == 2 {
                let Some(byte) = payload.get(index / 4) else {
                    continue;
                };
                (byte >> ((index % 4) * 2)) & 0x3
            } else {
                let Some(&byte) = payload.get(index) else {
                    continue;
                };
                byte
            };

            let proportion = f64::from(value) / max_value;
            let inverse = 1.0 - proportion;
            let mut color = [0u8; 3];
            for (channel, slot) in color.iter_mut().enumerate() {
                *slot = (f64::from(full[channel]) * proportion
                    + f64::from(blank[channel]) * inverse) as u8;
            }

            let x = origin_x + col as i64;
            let y = origin_y + 2 * row as i64;
            composite(canvas, x, y, color);
            composite(canvas, x, y + 1, color);
        }
    }
    Ok(())
}

/// Subtract the ink color's complement from one canvas pixel.
///
/// Channels wrap on underflow, matching the 8-bit arithmetic of the
/// emulation this reproduces. Out-of-canvas coordinates are ignored.
fn composite(canvas: &mut RgbImage, x: i64, y: i64, color: [u8; 3]) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    let Rgb([r, g, b]) = *canvas.get_pixel(x, y);
    canvas.put_pixel(
        x,
        y,
        Rgb([
            r.wrapping_sub(255 - color[0]),
            g.wrapping_sub(255 - color[1]),
            b.wrapping_sub(255 - color[2]),
        ]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn white_canvas(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, WHITE)
    }

    #[test]
    fn ink_offsets_follow_the_cartridge_table() {
        assert_eq!(ink_y_offset(InkColor::Black), 0);
        assert_eq!(ink_y_offset(InkColor::Cyan), 0);
        assert_eq!(ink_y_offset(InkColor::Magenta), -120);
        assert_eq!(ink_y_offset(InkColor::AltBlackA), -120);
        assert_eq!(ink_y_offset(InkColor::Yellow), -240);
        assert_eq!(ink_y_offset(InkColor::AltBlackB), -240);
    }

    #[test]
    fn full_black_ink_paints_black_with_vertical_stretch() {
        let mut canvas = white_canvas(4, 4);
        // One row, two pixels, both at full intensity (2bpp value 3).
        plot_band(&mut canvas, 0, 0, 2, 1, InkColor::Black, &[0b0000_1111], 2).unwrap();
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(1, 0), Rgb([0, 0, 0]));
        // The stretched second row.
        assert_eq!(*canvas.get_pixel(0, 1), Rgb([0, 0, 0]));
        // Untouched pixels stay white.
        assert_eq!(*canvas.get_pixel(2, 0), WHITE);
        assert_eq!(*canvas.get_pixel(0, 2), WHITE);
    }

    #[test]
    fn zero_ink_leaves_the_canvas_unchanged() {
        let mut canvas = white_canvas(4, 4);
        plot_band(&mut canvas, 0, 0, 4, 1, InkColor::Yellow, &[0x00], 2).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(*canvas.get_pixel(x, y), WHITE);
            }
        }
    }

    #[test]
    fn two_bit_samples_unpack_low_bits_first() {
        let mut canvas = white_canvas(4, 2);
        // Samples 0, 1, 2, 3 from the low bit pair upward.
        plot_band(&mut canvas, 0, 0, 4, 1, InkColor::Black, &[0b1110_0100], 2).unwrap();
        assert_eq!(*canvas.get_pixel(0, 0), WHITE);
        assert_eq!(*canvas.get_pixel(1, 0), Rgb([170, 170, 170]));
        assert_eq!(*canvas.get_pixel(2, 0), Rgb([85, 85, 85]));
        assert_eq!(*canvas.get_pixel(3, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn eight_bit_samples_use_the_byte_directly() {
        let mut canvas = white_canvas(2, 2);
        plot_band(&mut canvas, 0, 0, 2, 1, InkColor::Black, &[255, 0], 8).unwrap();
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(1, 0), WHITE);
    }

    #[test]
    fn magenta_full_ink_subtracts_green_only() {
        let mut canvas = white_canvas(1, 2);
        plot_band(&mut canvas, 0, 0, 1, 1, InkColor::Magenta, &[0b11], 2).unwrap();
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([255, 0, 255]));
    }

    #[test]
    fn overlapping_inks_wrap_on_underflow() {
        let mut canvas = white_canvas(1, 2);
        plot_band(&mut canvas, 0, 0, 1, 1, InkColor::Black, &[0b11], 2).unwrap();
        plot_band(&mut canvas, 0, 0, 1, 1, InkColor::Black, &[0b11], 2).unwrap();
        // 0 - 255 wraps to 1.
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([1, 1, 1]));
    }

    #[test]
    fn out_of_bounds_pixels_are_skipped() {
        let mut canvas = white_canvas(2, 2);
        plot_band(&mut canvas, -1, -5, 4, 3, InkColor::Black, &[0xff; 3], 2).unwrap();
        // Nothing panicked; the top-left pixel was covered by (col 1, row 2)
        // at canvas (0, -1 + 4) = out of range -> only check no panic and
        // canvas dimensions intact.
        assert_eq!(canvas.dimensions(), (2, 2));
    }

    #[test]
    fn unsupported_depth_is_fatal() {
        let mut canvas = white_canvas(1, 1);
        let err = plot_band(&mut canvas, 0, 0, 1, 1, InkColor::Black, &[0], 4).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedBpp(4)));
    }
}
