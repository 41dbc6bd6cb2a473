//! Encoder error types

use crate::camera::PixelFormat;

/// Error type for frame encoding
#[derive(Debug)]
pub enum EncodeError {
    /// Pixel buffer length does not match the declared geometry
    BufferSize {
        /// Declared pixel format
        format: PixelFormat,
        /// Bytes required by width x height
        expected: usize,
        /// Bytes actually present
        actual: usize,
    },
    /// Frame geometry unusable for the format (zero or odd dimensions)
    Geometry {
        /// Frame width
        width: u32,
        /// Frame height
        height: u32,
    },
    /// Color conversion rejected the frame
    Convert(String),
    /// JPEG decode or encode failed
    Codec(image::ImageError),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::BufferSize {
                format,
                expected,
                actual,
            } => write!(
                f,
                "{} frame has {} bytes, expected {}",
                format, actual, expected
            ),
            EncodeError::Geometry { width, height } => {
                write!(f, "Unsupported frame geometry {}x{}", width, height)
            }
            EncodeError::Convert(msg) => write!(f, "Color conversion failed: {}", msg),
            EncodeError::Codec(e) => write!(f, "JPEG codec error: {}", e),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for EncodeError {
    fn from(e: image::ImageError) -> Self {
        EncodeError::Codec(e)
    }
}
