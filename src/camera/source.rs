//! Frame source abstraction

use super::error::CameraError;
use super::frame::Frame;

/// A device that produces frames on demand
///
/// Implementations own their device handle exclusively. `read_frame` may
/// block until the next frame is available; a failed read is transient
/// unless the implementation reports `DeviceUnavailable`.
pub trait FrameSource: Send {
    /// Read the next frame
    fn read_frame(&mut self) -> Result<Frame, CameraError>;

    /// Human-readable name for logs (device path, "test pattern", ...)
    fn describe(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        (**self).read_frame()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
