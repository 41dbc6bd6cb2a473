//! Timestamp text overlay
//!
//! A 5x7 bitmap font covering the characters of the capture label
//! (`REC: 1712345678.90`), drawn with nearest-neighbour scaling.

use image::{Rgb, RgbImage};

/// Glyph cell width in font pixels
const GLYPH_WIDTH: u32 = 5;

/// Glyph cell height in font pixels
const GLYPH_HEIGHT: u32 = 7;

/// Blank column between glyphs
const GLYPH_SPACING: u32 = 1;

/// Row bitmaps, bit 4 is the leftmost column
fn glyph(c: char) -> [u8; 7] {
    match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        _ => [0; 7],
    }
}

/// Placement and style of overlay text
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    /// Left edge of the first glyph
    pub x: i64,
    /// Row just below the text (bottom of glyphs sits at `baseline - 1`)
    pub baseline: i64,
    /// Integer scale factor applied to the 5x7 font
    pub scale: u32,
    /// Fill color
    pub color: Rgb<u8>,
}

/// Width in pixels of `text` rendered at `scale`
pub fn text_width(text: &str, scale: u32) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    (count * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * scale
}

/// Height in pixels of a text line at `scale`
pub fn text_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale
}

/// Draw `text` onto `image`; pixels outside the image are clipped
pub fn draw_text(image: &mut RgbImage, text: &str, style: TextStyle) {
    let scale = style.scale.max(1) as i64;
    let top = style.baseline - GLYPH_HEIGHT as i64 * scale;
    let advance = (GLYPH_WIDTH + GLYPH_SPACING) as i64 * scale;
    let (width, height) = (image.width() as i64, image.height() as i64);

    for (i, c) in text.chars().enumerate() {
        let left = style.x + i as i64 * advance;
        let rows = glyph(c);

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }

                let px = left + col as i64 * scale;
                let py = top + row as i64 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let (x, y) = (px + dx, py + dy);
                        if (0..width).contains(&x) && (0..height).contains(&y) {
                            image.put_pixel(x as u32, y as u32, style.color);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn count_white(image: &RgbImage) -> usize {
        image.pixels().filter(|p| **p == WHITE).count()
    }

    #[test]
    fn test_text_metrics() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("1", 1), 5);
        assert_eq!(text_width("REC", 2), (3 * 6 - 1) * 2);
        assert_eq!(text_height(2), 14);
    }

    #[test]
    fn test_draw_stays_in_text_box() {
        let mut image = RgbImage::new(200, 100);
        let style = TextStyle {
            x: 20,
            baseline: 80,
            scale: 2,
            color: WHITE,
        };
        draw_text(&mut image, "REC: 12.34", style);

        assert!(count_white(&image) > 0);
        for (x, y, p) in image.enumerate_pixels() {
            if *p == WHITE {
                assert!(x >= 20 && x < 20 + text_width("REC: 12.34", 2));
                assert!(y >= 80 - text_height(2) && y < 80);
            }
        }
    }

    #[test]
    fn test_space_and_unknown_draw_nothing() {
        let mut image = RgbImage::new(50, 20);
        let style = TextStyle {
            x: 0,
            baseline: 10,
            scale: 1,
            color: WHITE,
        };
        draw_text(&mut image, " ?", style);

        assert_eq!(count_white(&image), 0);
    }

    #[test]
    fn test_clipping_does_not_panic() {
        let mut image = RgbImage::new(8, 8);
        let style = TextStyle {
            x: -3,
            baseline: 4,
            scale: 3,
            color: WHITE,
        };
        draw_text(&mut image, "8888", style);

        assert!(count_white(&image) > 0);
    }
}
