//! YUV to RGB conversion
//!
//! BT.601 limited-range conversion, the matrix UVC webcams use. Planar
//! I420 goes through `dcv-color-primitives`; packed YUYV is unpacked here
//! with integer arithmetic. Callers validate buffer sizes and geometry
//! before calling in here.

use std::sync::Once;

use dcv_color_primitives as dcp;

use super::error::EncodeError;

/// Convert one limited-range YCbCr sample to RGB
#[inline]
fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let c = (y as i32 - 16).max(0) * 298;
    let d = cb as i32 - 128;
    let e = cr as i32 - 128;

    let r = (c + 409 * e + 128) >> 8;
    let g = (c - 100 * d - 208 * e + 128) >> 8;
    let b = (c + 516 * d + 128) >> 8;

    [clamp(r), clamp(g), clamp(b)]
}

#[inline]
fn clamp(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Planar I420 (YU12) to packed RGB
///
/// Runs through `dcv-color-primitives`, which converts to BGRA; the alpha
/// byte is dropped and the channels swapped afterwards. `width` and `height`
/// must be even and `data` must hold exactly the three planes.
pub fn i420_to_rgb(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, EncodeError> {
    static INIT: Once = Once::new();
    INIT.call_once(dcp::initialize);

    let luma = width * height;
    let (y_plane, rest) = data.split_at(luma);
    let (u_plane, v_plane) = rest.split_at(luma / 4);

    let src_format = dcp::ImageFormat {
        pixel_format: dcp::PixelFormat::I420,
        color_space: dcp::ColorSpace::Bt601,
        num_planes: 3,
    };
    let dst_format = dcp::ImageFormat {
        pixel_format: dcp::PixelFormat::Bgra,
        color_space: dcp::ColorSpace::Rgb,
        num_planes: 1,
    };

    let mut bgra = vec![0u8; luma * 4];
    dcp::convert_image(
        width as u32,
        height as u32,
        &src_format,
        None,
        &[y_plane, u_plane, v_plane],
        &dst_format,
        None,
        &mut [&mut bgra[..]],
    )
    .map_err(|e| EncodeError::Convert(e.to_string()))?;

    let mut rgb = Vec::with_capacity(luma * 3);
    for px in bgra.chunks_exact(4) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    Ok(rgb)
}

/// Packed YUYV 4:2:2 to packed RGB
///
/// `width` must be even; `data` must hold `width * height * 2` bytes.
pub fn yuyv_to_rgb(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(width * height * 3);
    for quad in data.chunks_exact(4) {
        let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
        rgb.extend_from_slice(&ycbcr_to_rgb(y0, u, v));
        rgb.extend_from_slice(&ycbcr_to_rgb(y1, u, v));
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_colors() {
        assert_eq!(ycbcr_to_rgb(16, 128, 128), [0, 0, 0]);
        assert_eq!(ycbcr_to_rgb(235, 128, 128), [255, 255, 255]);

        // BT.601 red
        let [r, g, b] = ycbcr_to_rgb(81, 90, 240);
        assert!(r > 250 && g < 5 && b < 5);
    }

    #[test]
    fn test_i420_gray() {
        let (w, h) = (4, 2);
        let mut data = vec![126u8; w * h];
        data.extend(vec![128u8; w * h / 2]);

        let rgb = i420_to_rgb(&data, w, h).unwrap();
        assert_eq!(rgb.len(), w * h * 3);
        for px in rgb.chunks_exact(3) {
            assert!(px.iter().all(|&c| (c as i32 - rgb[0] as i32).abs() <= 1));
            assert!((120..=140).contains(&px[0]));
        }
    }

    #[test]
    fn test_i420_chroma_is_shared_by_2x2_block() {
        let (w, h) = (4, 2);
        let mut data = vec![128u8; w * h];
        // U plane: left block neutral, right block blue-shifted
        data.extend([128, 255]);
        data.extend([128, 128]);

        let rgb = i420_to_rgb(&data, w, h).unwrap();
        let pixel = |x: usize, y: usize| &rgb[(y * w + x) * 3..(y * w + x) * 3 + 3];

        assert_eq!(pixel(0, 0), pixel(1, 1));
        assert_eq!(pixel(2, 0), pixel(3, 1));
        assert!(pixel(2, 0)[2] > pixel(0, 0)[2]);
    }

    #[test]
    fn test_i420_red() {
        let (w, h) = (16, 4);
        let mut data = vec![81u8; w * h];
        data.extend(vec![90u8; w * h / 4]);
        data.extend(vec![240u8; w * h / 4]);

        let rgb = i420_to_rgb(&data, w, h).unwrap();
        for px in rgb.chunks_exact(3) {
            assert!(px[0] > 245 && px[1] < 10 && px[2] < 10, "{:?}", px);
        }
    }

    #[test]
    fn test_yuyv_pairs() {
        let data = [16u8, 128, 235, 128];
        let rgb = yuyv_to_rgb(&data, 2, 1);
        assert_eq!(rgb, vec![0, 0, 0, 255, 255, 255]);
    }
}
