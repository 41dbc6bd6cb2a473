//! Camera error types

/// Error type for camera operations
#[derive(Debug)]
pub enum CameraError {
    /// Device could not be opened or configured
    DeviceUnavailable {
        /// Device path or description
        device: String,
        /// Reason reported by the driver
        reason: String,
    },
    /// A single frame read failed (dropped frame, driver timeout)
    CaptureTimeout(String),
}

impl CameraError {
    /// Create a device-unavailable error
    pub fn unavailable(device: impl Into<String>, reason: impl ToString) -> Self {
        CameraError::DeviceUnavailable {
            device: device.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error ends the capture loop
    pub fn is_fatal(&self) -> bool {
        matches!(self, CameraError::DeviceUnavailable { .. })
    }
}

impl std::fmt::Display for CameraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraError::DeviceUnavailable { device, reason } => {
                write!(f, "Camera device unavailable: {} ({})", device, reason)
            }
            CameraError::CaptureTimeout(reason) => write!(f, "Frame capture failed: {}", reason),
        }
    }
}

impl std::error::Error for CameraError {}
