//! Captured frame types
//!
//! A `Frame` is what a camera hands to the encoder: pixel data in the
//! format the device delivered, its geometry, and the capture timestamp.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Motion-JPEG: each frame is a complete JPEG image
    Mjpeg,
    /// Packed YUV 4:2:2, `Y0 U Y1 V` per pixel pair
    Yuyv,
    /// Planar YUV 4:2:0 (I420), Y plane followed by U and V
    Yu12,
    /// Packed 8-bit RGB
    Rgb24,
}

impl PixelFormat {
    /// V4L2 fourcc for this format
    pub fn fourcc(&self) -> &'static [u8; 4] {
        match self {
            PixelFormat::Mjpeg => b"MJPG",
            PixelFormat::Yuyv => b"YUYV",
            PixelFormat::Yu12 => b"YU12",
            PixelFormat::Rgb24 => b"RGB3",
        }
    }

    /// Map a V4L2 fourcc back to a known format
    pub fn from_fourcc(fourcc: &[u8]) -> Option<Self> {
        match fourcc {
            b"MJPG" => Some(PixelFormat::Mjpeg),
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"YU12" => Some(PixelFormat::Yu12),
            b"RGB3" => Some(PixelFormat::Rgb24),
            _ => None,
        }
    }

    /// Exact buffer size for raw formats, `None` for compressed ones
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        let pixels = width as usize * height as usize;
        match self {
            PixelFormat::Mjpeg => None,
            PixelFormat::Yuyv => Some(pixels * 2),
            PixelFormat::Yu12 => Some(pixels + 2 * ((width as usize / 2) * (height as usize / 2))),
            PixelFormat::Rgb24 => Some(pixels * 3),
        }
    }

    /// Bytes in one unpadded row of the first plane, `None` for compressed formats
    pub fn row_bytes(&self, width: u32) -> Option<usize> {
        let width = width as usize;
        match self {
            PixelFormat::Mjpeg => None,
            PixelFormat::Yuyv => Some(width * 2),
            PixelFormat::Yu12 => Some(width),
            PixelFormat::Rgb24 => Some(width * 3),
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fourcc = self.fourcc();
        write!(f, "{}", String::from_utf8_lossy(fourcc))
    }
}

/// A single captured frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout of `data`
    pub format: PixelFormat,
    /// Pixel data as delivered by the source
    pub data: Bytes,
    /// Capture time in seconds since the Unix epoch
    pub timestamp: f64,
}

impl Frame {
    /// Create a new frame
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Bytes, timestamp: f64) -> Self {
        Self {
            width,
            height,
            format,
            data,
            timestamp,
        }
    }

    /// Size of the pixel data in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame carries no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Copy a driver buffer, dropping row padding
///
/// `stride` is the distance in bytes between rows of the first plane (the
/// V4L2 `bytesperline`); YU12 chroma rows are `stride / 2` apart. Compressed
/// or tightly packed buffers are copied unchanged, and so are buffers too
/// short for the declared stride, which the encoder then rejects by size.
pub fn pack_rows(format: PixelFormat, width: u32, height: u32, stride: usize, data: &[u8]) -> Bytes {
    let row = match format.row_bytes(width) {
        Some(row) if stride > row => row,
        _ => return Bytes::copy_from_slice(data),
    };

    let height = height as usize;
    // (row bytes, stride, rows) per plane
    let planes = match format {
        PixelFormat::Yu12 => vec![
            (row, stride, height),
            (row / 2, stride / 2, height / 2),
            (row / 2, stride / 2, height / 2),
        ],
        _ => vec![(row, stride, height)],
    };

    let mut packed = Vec::with_capacity(planes.iter().map(|(r, _, n)| r * n).sum());
    let mut offset = 0;
    for (row, stride, rows) in planes {
        for r in 0..rows {
            let start = offset + r * stride;
            match data.get(start..start + row) {
                Some(line) => packed.extend_from_slice(line),
                None => return Bytes::copy_from_slice(data),
            }
        }
        offset += stride * rows;
    }

    Bytes::from(packed)
}

/// Capture timestamp source
///
/// Anchored to the wall clock once, then advanced with `Instant`, so
/// timestamps never go backwards when the system clock is stepped.
#[derive(Debug, Clone)]
pub struct CaptureClock {
    wall_anchor: f64,
    mono_anchor: Instant,
    last: f64,
}

impl CaptureClock {
    /// Create a clock anchored at the current time
    pub fn new() -> Self {
        let wall_anchor = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();

        Self {
            wall_anchor,
            mono_anchor: Instant::now(),
            last: 0.0,
        }
    }

    /// Timestamp for a frame captured now
    ///
    /// Strictly greater than every previously returned value.
    pub fn now(&mut self) -> f64 {
        let mut ts = self.wall_anchor + self.mono_anchor.elapsed().as_secs_f64();
        if ts <= self.last {
            ts = self.last + 1e-6;
        }
        self.last = ts;
        ts
    }
}

impl Default for CaptureClock {
    fn default() -> Self {
        Self::new()
    }
}
