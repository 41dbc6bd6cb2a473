//! Camera sources
//!
//! A camera source owns its device handle and hands out frames one at a time.
//! Two sources exist:
//! - `V4l2Camera`: a Linux video device opened through V4L2
//! - `TestPattern`: synthetic frames for running without hardware

pub mod error;
pub mod frame;
pub mod pattern;
pub mod source;
#[cfg(target_os = "linux")]
pub mod v4l2;

pub use error::CameraError;
pub use frame::{pack_rows, CaptureClock, Frame, PixelFormat};
pub use pattern::TestPattern;
pub use source::FrameSource;
#[cfg(target_os = "linux")]
pub use v4l2::V4l2Camera;

use crate::config::CameraConfig;

/// Open the configured camera
///
/// With `test_mode` a `TestPattern` is returned instead of a device.
pub fn open(config: &CameraConfig, test_mode: bool) -> Result<Box<dyn FrameSource>, CameraError> {
    if test_mode {
        tracing::info!("Test mode: using synthetic frames");
        return Ok(Box::new(TestPattern::new(config)));
    }

    open_device(config)
}

#[cfg(target_os = "linux")]
fn open_device(config: &CameraConfig) -> Result<Box<dyn FrameSource>, CameraError> {
    Ok(Box::new(V4l2Camera::open(config)?))
}

#[cfg(not(target_os = "linux"))]
fn open_device(config: &CameraConfig) -> Result<Box<dyn FrameSource>, CameraError> {
    Err(CameraError::unavailable(
        config.device_path(),
        "V4L2 capture is only supported on Linux",
    ))
}
