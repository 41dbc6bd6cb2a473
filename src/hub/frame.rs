//! Encoded frame type shared with subscribers

use bytes::Bytes;

/// A JPEG-compressed frame ready for delivery
///
/// Cheap to clone: the payload is a reference-counted `Bytes`, so every
/// subscriber shares the same allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFrame {
    /// JPEG bytes
    pub data: Bytes,
    /// Capture time in seconds since the Unix epoch
    pub timestamp: f64,
    /// Hub version, assigned on publish (0 until published)
    pub sequence: u64,
}

impl EncodedFrame {
    /// Wrap an encoded buffer and its capture time
    pub fn new(data: Bytes, timestamp: f64) -> Self {
        Self {
            data,
            timestamp,
            sequence: 0,
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
