//! Encode-decode round trips through the full job pipeline.

use escpr::decoder::JobDecoder;
use escpr::printjob::PrintJob;
use image::{DynamicImage, Rgb, RgbImage};
use pretty_assertions::assert_eq;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Head x position of every band: the 1 mm left move at 360 dpi.
const LEFT_MARGIN: u32 = 15;

/// Canvas row of the first band: the initial 36.576 mm feed lands the head
/// at page unit 439 (from the -80 start).
const FIRST_BAND_TOP: u32 = 439;

fn black_source() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([0, 0, 0])))
}

fn decode(bytes: &[u8]) -> RgbImage {
    JobDecoder::new(bytes).decode().expect("job should decode")
}

#[test]
fn synthesized_job_decodes_onto_the_declared_page() {
    let job = PrintJob::new(black_source()).compile().unwrap();
    let page = decode(&job);

    // A4 at 360 dpi, in page units.
    assert_eq!(page.dimensions(), (2977, 4210));
}

#[test]
fn ink_lands_only_right_of_the_margin_move() {
    let job = PrintJob::new(black_source()).compile().unwrap();
    let page = decode(&job);

    // A black source separates into the key plane: the first band paints
    // pure black from the margin, four printed pixels per source column.
    assert_eq!(*page.get_pixel(LEFT_MARGIN, FIRST_BAND_TOP), Rgb([0, 0, 0]));
    assert_eq!(
        *page.get_pixel(LEFT_MARGIN + 100, FIRST_BAND_TOP + 1),
        Rgb([0, 0, 0])
    );

    // Left of the margin move the page stays white, on every row.
    for y in 0..page.height() {
        for x in 0..LEFT_MARGIN {
            assert_eq!(*page.get_pixel(x, y), WHITE, "ink left of the margin at ({x}, {y})");
        }
    }

    // Above the first feed the page stays white too.
    assert_eq!(*page.get_pixel(LEFT_MARGIN + 10, 300), WHITE);

    // The 64-column source spans 128 printed columns; past them, white.
    assert_eq!(*page.get_pixel(LEFT_MARGIN + 200, FIRST_BAND_TOP), WHITE);
}

#[test]
fn compressed_and_raw_jobs_paint_the_same_page() {
    let raw = PrintJob::new(black_source()).compile().unwrap();
    let packed = PrintJob::new(black_source())
        .compressed(true)
        .compile()
        .unwrap();
    assert!(packed.len() < raw.len());

    let raw_page = decode(&raw);
    let packed_page = decode(&packed);
    assert_eq!(raw_page.dimensions(), packed_page.dimensions());
    for (x, y) in [
        (LEFT_MARGIN, FIRST_BAND_TOP),
        (LEFT_MARGIN + 64, FIRST_BAND_TOP + 60),
        (LEFT_MARGIN + 200, FIRST_BAND_TOP),
        (0, 0),
    ] {
        assert_eq!(raw_page.get_pixel(x, y), packed_page.get_pixel(x, y));
    }
}

#[test]
fn colored_source_reaches_the_matching_ink_planes() {
    // A pure red source separates into magenta + yellow, no cyan, no black.
    let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([255, 0, 0])));
    let job = PrintJob::new(source).compile().unwrap();
    let page = decode(&job);

    // The magenta and yellow band walks land their first source rows within
    // a few page units of the key plane's; where both planes overlap the
    // subtractive mix is white - green - blue = red.
    let probe = *page.get_pixel(LEFT_MARGIN + 10, FIRST_BAND_TOP + 2);
    assert_eq!(probe, Rgb([255, 0, 0]), "M+Y inking must mix back to red");

    // The area left of the margin is untouched regardless of ink.
    assert_eq!(*page.get_pixel(3, FIRST_BAND_TOP), WHITE);
}
