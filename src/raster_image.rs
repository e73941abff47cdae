//! Encode-side band compilation
//!
//! The emitter prints in 60-row bands, one per ink, each 288 source columns
//! wide. The source image is converted to CMYK planes and resized to half
//! its width first; every 2-bit sample is then replicated into all four
//! slots of its payload byte, spreading one source column over four printed
//! pixels. Together with the decoder's 2× vertical stretch this renders the
//! page at twice the source scale.

use image::{imageops::FilterType, DynamicImage};

use crate::error::EncodeError;

/// Source columns covered by one raster transfer (one head width).
pub(crate) const BAND_WIDTH: u32 = 288;

/// Rows in one raster transfer.
pub(crate) const BAND_ROWS: u32 = 60;

/// One CMYK plane of the prepared source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Channel {
    Cyan,
    Magenta,
    Yellow,
    Key,
}

/// The prepared (half-width, CMYK-separated) source image.
pub(crate) struct CmykImage {
    width: u32,
    height: u32,
    planes: [Vec<u8>; 4],
}

impl CmykImage {
    /// Convert a source image into half-width CMYK planes.
    pub fn prepare(image: &DynamicImage) -> Result<Self, EncodeError> {
        let (source_width, height) = (image.width(), image.height());
        let width = source_width / 2;
        if width == 0 || height == 0 {
            return Err(EncodeError::EmptyImage {
                width: source_width,
                height,
            });
        }

        let resized = image
            .resize_exact(width, height, FilterType::CatmullRom)
            .into_rgb8();

        let size = (width * height) as usize;
        let mut planes = [
            vec![0u8; size],
            vec![0u8; size],
            vec![0u8; size],
            vec![0u8; size],
        ];
        for (i, pixel) in resized.pixels().enumerate() {
            let [c, m, y, k] = rgb_to_cmyk(pixel.0);
            planes[0][i] = c;
            planes[1][i] = m;
            planes[2][i] = y;
            planes[3][i] = k;
        }

        Ok(Self {
            width,
            height,
            planes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of 288-column chunks needed to cover the image width.
    pub fn chunks(&self) -> u32 {
        self.width.div_ceil(BAND_WIDTH)
    }

    /// Sample one plane; coordinates outside the image read as zero ink.
    fn sample(&self, channel: Channel, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return 0;
        }
        self.planes[channel as usize][(y * i64::from(self.width) + x) as usize]
    }

    /// Build the payload of one 288x60 band with its top-left source corner
    /// at `(x0, y0)`.
    ///
    /// Each byte carries one sample quantized to 2 bits and replicated into
    /// all four bit pairs.
    pub fn band_payload(&self, channel: Channel, x0: i64, y0: i64) -> Vec<u8> {
        let mut payload = Vec::with_capacity((BAND_WIDTH * BAND_ROWS) as usize);
        for row in 0..i64::from(BAND_ROWS) {
            for col in 0..i64::from(BAND_WIDTH) {
                let sample = self.sample(channel, x0 + col, y0 + row);
                payload.push(pack_samples([sample; 4]));
            }
        }
        payload
    }
}

/// Quantize four channel samples to 2 bits each and pack them into a byte,
/// first sample in the lowest bit pair.
pub(crate) fn pack_samples(samples: [u8; 4]) -> u8 {
    let q = |s: u8| s / 64;
    q(samples[0]) | (q(samples[1]) << 2) | (q(samples[2]) << 4) | (q(samples[3]) << 6)
}

/// Standard RGB to CMYK separation with black extraction.
fn rgb_to_cmyk([r, g, b]: [u8; 3]) -> [u8; 4] {
    let (r, g, b) = (
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    );
    let k = 1.0 - r.max(g).max(b);
    if k >= 1.0 {
        return [0, 0, 0, 255];
    }
    let scale = 255.0 / (1.0 - k);
    [
        ((1.0 - r - k) * scale).round() as u8,
        ((1.0 - g - k) * scale).round() as u8,
        ((1.0 - b - k) * scale).round() as u8,
        (k * 255.0).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cmyk_separation_extracts_black() {
        assert_eq!(rgb_to_cmyk([0, 0, 0]), [0, 0, 0, 255]);
        assert_eq!(rgb_to_cmyk([255, 255, 255]), [0, 0, 0, 0]);
        assert_eq!(rgb_to_cmyk([255, 0, 0]), [0, 255, 255, 0]);
        assert_eq!(rgb_to_cmyk([0, 255, 255]), [255, 0, 0, 0]);
    }

    #[test]
    fn samples_quantize_to_two_bits() {
        assert_eq!(pack_samples([0; 4]), 0);
        assert_eq!(pack_samples([255; 4]), 0b1111_1111);
        assert_eq!(pack_samples([64, 128, 192, 0]), 0b00_11_10_01);
    }

    #[test]
    fn out_of_range_samples_read_as_no_ink() {
        let image = DynamicImage::new_rgb8(4, 4);
        let cmyk = CmykImage::prepare(&image).unwrap();
        assert_eq!(cmyk.sample(Channel::Key, -1, 0), 0);
        assert_eq!(cmyk.sample(Channel::Key, 0, 99), 0);
    }

    #[test]
    fn band_payload_is_always_full_size() {
        let image = DynamicImage::new_rgb8(8, 8);
        let cmyk = CmykImage::prepare(&image).unwrap();
        let payload = cmyk.band_payload(Channel::Cyan, 0, -120);
        assert_eq!(payload.len(), (BAND_WIDTH * BAND_ROWS) as usize);
    }

    #[test]
    fn black_source_fills_the_key_plane() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            8,
            8,
            image::Rgb([0, 0, 0]),
        ));
        let cmyk = CmykImage::prepare(&image).unwrap();
        assert_eq!(cmyk.width(), 4);
        let payload = cmyk.band_payload(Channel::Key, 0, 0);
        // Every in-image sample quantizes to full ink in all four slots.
        assert_eq!(payload[0], 0b1111_1111);
        // Padding beyond the image width carries no ink.
        assert_eq!(payload[10], 0);
    }

    #[test]
    fn tiny_images_are_rejected() {
        let image = DynamicImage::new_rgb8(1, 4);
        assert!(matches!(
            CmykImage::prepare(&image),
            Err(EncodeError::EmptyImage { .. })
        ));
    }
}
