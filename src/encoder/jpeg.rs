//! JPEG frame encoder
//!
//! Every captured frame goes through the same three steps:
//! 1. Convert to packed RGB (decode MJPG, color-convert YUYV or YU12, or pass RGB through)
//! 2. Stamp the capture time in the bottom-left corner
//! 3. Compress to JPEG

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};

use crate::camera::{Frame, PixelFormat};
use crate::hub::EncodedFrame;

use super::convert;
use super::error::EncodeError;
use super::overlay::{self, TextStyle};

/// Distance of the timestamp from the left edge
const OVERLAY_MARGIN_X: i64 = 20;

/// Distance of the timestamp baseline from the bottom edge
const OVERLAY_MARGIN_Y: i64 = 20;

/// Font scale for the timestamp
const OVERLAY_SCALE: u32 = 2;

const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Converts raw frames into timestamped JPEG images
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    quality: Option<u8>,
    overlay: bool,
}

impl FrameEncoder {
    /// Create an encoder using the codec's default quality
    pub fn new() -> Self {
        Self {
            quality: None,
            overlay: true,
        }
    }

    /// Set an explicit JPEG quality (1-100)
    pub fn with_quality(mut self, quality: Option<u8>) -> Self {
        self.quality = quality.map(|q| q.clamp(1, 100));
        self
    }

    /// Disable the timestamp overlay
    pub fn without_overlay(mut self) -> Self {
        self.overlay = false;
        self
    }

    /// Encode a frame
    pub fn encode(&self, frame: &Frame) -> Result<EncodedFrame, EncodeError> {
        let mut image = to_rgb(frame)?;

        if self.overlay {
            stamp_timestamp(&mut image, frame.timestamp);
        }

        let mut jpeg = Vec::with_capacity(image.as_raw().len() / 8);
        let mut encoder = match self.quality {
            Some(quality) => JpegEncoder::new_with_quality(&mut jpeg, quality),
            None => JpegEncoder::new(&mut jpeg),
        };
        encoder.encode_image(&image)?;

        Ok(EncodedFrame::new(Bytes::from(jpeg), frame.timestamp))
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlay label for a capture timestamp
pub fn timestamp_label(timestamp: f64) -> String {
    format!("REC: {:.2}", timestamp)
}

fn stamp_timestamp(image: &mut RgbImage, timestamp: f64) {
    let style = TextStyle {
        x: OVERLAY_MARGIN_X,
        baseline: image.height() as i64 - OVERLAY_MARGIN_Y,
        scale: OVERLAY_SCALE,
        color: OVERLAY_COLOR,
    };
    overlay::draw_text(image, &timestamp_label(timestamp), style);
}

fn to_rgb(frame: &Frame) -> Result<RgbImage, EncodeError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(geometry(frame));
    }

    match frame.format {
        PixelFormat::Mjpeg => {
            let decoded = image::load_from_memory_with_format(&frame.data, ImageFormat::Jpeg)?;
            Ok(decoded.into_rgb8())
        }
        PixelFormat::Rgb24 => {
            check_size(frame)?;
            RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec())
                .ok_or_else(|| geometry(frame))
        }
        PixelFormat::Yuyv => {
            if frame.width % 2 != 0 {
                return Err(geometry(frame));
            }
            check_size(frame)?;
            let rgb = convert::yuyv_to_rgb(&frame.data, frame.width as usize, frame.height as usize);
            RgbImage::from_raw(frame.width, frame.height, rgb).ok_or_else(|| geometry(frame))
        }
        PixelFormat::Yu12 => {
            if frame.width % 2 != 0 || frame.height % 2 != 0 {
                return Err(geometry(frame));
            }
            check_size(frame)?;
            let rgb = convert::i420_to_rgb(&frame.data, frame.width as usize, frame.height as usize)?;
            RgbImage::from_raw(frame.width, frame.height, rgb).ok_or_else(|| geometry(frame))
        }
    }
}

fn check_size(frame: &Frame) -> Result<(), EncodeError> {
    let expected = frame
        .format
        .frame_size(frame.width, frame.height)
        .unwrap_or(0);

    if frame.len() != expected {
        return Err(EncodeError::BufferSize {
            format: frame.format,
            expected,
            actual: frame.len(),
        });
    }
    Ok(())
}

fn geometry(frame: &Frame) -> EncodeError {
    EncodeError::Geometry {
        width: frame.width,
        height: frame.height,
    }
}

#[cfg(test)]
mod tests {
    use crate::camera::pack_rows;

    use super::*;

    const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

    fn rgb_frame(width: u32, height: u32, timestamp: f64) -> Frame {
        let data = vec![32u8; (width * height * 3) as usize];
        Frame::new(width, height, PixelFormat::Rgb24, Bytes::from(data), timestamp)
    }

    #[test]
    fn test_timestamp_label() {
        assert_eq!(timestamp_label(1712345678.906), "REC: 1712345678.91");
        assert_eq!(timestamp_label(1712345678.123), "REC: 1712345678.12");
    }

    #[test]
    fn test_timestamp_label_two_decimals() {
        assert_eq!(timestamp_label(3.0), "REC: 3.00");
        assert_eq!(timestamp_label(0.5), "REC: 0.50");
        assert_eq!(timestamp_label(12.25), "REC: 12.25");
    }

    #[test]
    fn test_encode_rgb() {
        let encoder = FrameEncoder::new();
        let encoded = encoder.encode(&rgb_frame(64, 48, 12.5)).unwrap();

        assert_eq!(&encoded.data[0..2], &JPEG_MAGIC);
        assert_eq!(encoded.len(), encoded.data.len());
        assert_eq!(encoded.timestamp, 12.5);
    }

    #[test]
    fn test_overlay_is_white_and_bottom_left() {
        let frame = rgb_frame(320, 240, 1.25);
        let mut image = to_rgb(&frame).unwrap();
        stamp_timestamp(&mut image, frame.timestamp);

        let label_width = overlay::text_width(&timestamp_label(1.25), OVERLAY_SCALE);
        let top = 240 - 20 - overlay::text_height(OVERLAY_SCALE);
        let mut white = 0;
        for (x, y, p) in image.enumerate_pixels() {
            if *p == OVERLAY_COLOR {
                white += 1;
                assert!((20..20 + label_width).contains(&x));
                assert!((top..220).contains(&y));
            }
        }
        assert!(white > 0);
    }

    #[test]
    fn test_encoded_roundtrip_keeps_geometry() {
        let encoder = FrameEncoder::new().with_quality(Some(90));
        let encoded = encoder.encode(&rgb_frame(80, 60, 0.0)).unwrap();

        let decoded = image::load_from_memory_with_format(&encoded.data, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 60));
    }

    #[test]
    fn test_mjpeg_input_is_reencoded() {
        let encoder = FrameEncoder::new().without_overlay();
        let source = encoder.encode(&rgb_frame(32, 24, 0.0)).unwrap();

        let frame = Frame::new(32, 24, PixelFormat::Mjpeg, source.data.clone(), 7.0);
        let encoded = encoder.encode(&frame).unwrap();

        assert_eq!(&encoded.data[0..2], &JPEG_MAGIC);
        assert_eq!(encoded.timestamp, 7.0);
    }

    #[test]
    fn test_truncated_rgb_rejected() {
        let frame = Frame::new(64, 48, PixelFormat::Rgb24, Bytes::from(vec![0u8; 100]), 0.0);

        assert!(matches!(
            FrameEncoder::new().encode(&frame),
            Err(EncodeError::BufferSize { actual: 100, .. })
        ));
    }

    #[test]
    fn test_garbage_mjpeg_rejected() {
        let frame = Frame::new(
            64,
            48,
            PixelFormat::Mjpeg,
            Bytes::from_static(b"not a jpeg"),
            0.0,
        );

        assert!(matches!(
            FrameEncoder::new().encode(&frame),
            Err(EncodeError::Codec(_))
        ));
    }

    #[test]
    fn test_yu12_geometry_checked() {
        let odd = Frame::new(63, 48, PixelFormat::Yu12, Bytes::new(), 0.0);
        assert!(matches!(
            FrameEncoder::new().encode(&odd),
            Err(EncodeError::Geometry { .. })
        ));

        let short = Frame::new(64, 48, PixelFormat::Yu12, Bytes::from(vec![0u8; 64]), 0.0);
        assert!(matches!(
            FrameEncoder::new().encode(&short),
            Err(EncodeError::BufferSize { .. })
        ));
    }

    #[test]
    fn test_yuyv_encode() {
        let (w, h) = (64u32, 48u32);
        let data: Vec<u8> = (0..w * h / 2).flat_map(|_| [180u8, 128, 180, 128]).collect();
        let frame = Frame::new(w, h, PixelFormat::Yuyv, Bytes::from(data), 3.5);

        let encoded = FrameEncoder::new().encode(&frame).unwrap();
        assert_eq!(&encoded.data[0..2], &JPEG_MAGIC);
        assert_eq!(encoded.timestamp, 3.5);
    }

    #[test]
    fn test_yu12_encode() {
        let (w, h) = (64u32, 48u32);
        let mut data = vec![120u8; (w * h) as usize];
        data.extend(vec![128u8; (w * h / 2) as usize]);
        let frame = Frame::new(w, h, PixelFormat::Yu12, Bytes::from(data), 4.0);

        let encoded = FrameEncoder::new().encode(&frame).unwrap();
        assert_eq!(&encoded.data[0..2], &JPEG_MAGIC);
    }

    #[test]
    fn test_padded_yuyv_encodes_after_packing() {
        // 640x480 YUYV with bytesperline 1344 instead of 1280
        let (w, h, stride) = (640u32, 480u32, 1344usize);
        let mut padded = Vec::with_capacity(stride * h as usize);
        for _ in 0..h {
            padded.extend((0..w / 2).flat_map(|_| [180u8, 128, 180, 128]));
            padded.extend(std::iter::repeat(0xEE).take(stride - w as usize * 2));
        }
        assert_eq!(padded.len(), 645120);

        let raw = Frame::new(w, h, PixelFormat::Yuyv, Bytes::from(padded.clone()), 1.0);
        assert!(matches!(
            FrameEncoder::new().encode(&raw),
            Err(EncodeError::BufferSize { actual: 645120, expected: 614400, .. })
        ));

        let data = pack_rows(PixelFormat::Yuyv, w, h, stride, &padded);
        let frame = Frame::new(w, h, PixelFormat::Yuyv, data, 1.0);
        let encoded = FrameEncoder::new().encode(&frame).unwrap();
        assert_eq!(&encoded.data[0..2], &JPEG_MAGIC);
    }

    #[test]
    fn test_yuyv_odd_width_rejected() {
        let frame = Frame::new(63, 48, PixelFormat::Yuyv, Bytes::from(vec![0u8; 63 * 48 * 2]), 0.0);
        assert!(matches!(
            FrameEncoder::new().encode(&frame),
            Err(EncodeError::Geometry { .. })
        ));
    }
}
