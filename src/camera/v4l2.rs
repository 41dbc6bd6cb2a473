//! V4L2 camera source
//!
//! Opens a `/dev/videoN` device through the `v4l` crate. The pixel format and
//! the frame size are applied in the same `VIDIOC_S_FMT` request, so the MJPG
//! fourcc is negotiated together with the resolution instead of after it
//! (several UVC drivers reset the size when the format changes). The frame
//! interval is applied afterwards.

use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::{FourCC, Fraction};

use crate::config::CameraConfig;

use super::error::CameraError;
use super::frame::{pack_rows, CaptureClock, Frame, PixelFormat};
use super::source::FrameSource;

/// Number of mmap buffers requested from the driver
const CAPTURE_BUFFERS: u32 = 4;

/// Camera backed by a V4L2 device
pub struct V4l2Camera {
    // Declared before `_device` so streaming stops before the handle closes
    stream: MmapStream<'static>,
    _device: Device,
    path: String,
    format: PixelFormat,
    width: u32,
    height: u32,
    /// Bytes between rows of the first plane, padding included
    stride: u32,
    clock: CaptureClock,
}

impl V4l2Camera {
    /// Open and configure the device described by `config`
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        let path = config.device_path();
        let requested = if config.force_mjpg {
            PixelFormat::Mjpeg
        } else {
            PixelFormat::Yuyv
        };

        tracing::info!(
            device = %path,
            width = config.width,
            height = config.height,
            fps = config.fps,
            format = %requested,
            "Opening camera"
        );

        let unavailable = |e: std::io::Error| CameraError::unavailable(path.clone(), e);

        let device = Device::with_path(&path).map_err(unavailable)?;

        let mut format = device.format().map_err(unavailable)?;
        format.fourcc = FourCC::new(requested.fourcc());
        format.width = config.width;
        format.height = config.height;
        let format = device.set_format(&format).map_err(unavailable)?;

        let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
            CameraError::unavailable(
                path.clone(),
                format!(
                    "driver selected unsupported pixel format {}",
                    String::from_utf8_lossy(&format.fourcc.repr)
                ),
            )
        })?;

        if pixel_format != requested || (format.width, format.height) != (config.width, config.height) {
            tracing::warn!(
                device = %path,
                requested = %requested,
                actual = %pixel_format,
                width = format.width,
                height = format.height,
                "Driver adjusted capture format"
            );
        }

        let (numerator, denominator) = frame_interval(config.fps);
        let params = Parameters::new(Fraction::new(numerator, denominator));
        if let Err(e) = device.set_params(&params) {
            tracing::warn!(device = %path, error = %e, "Failed to set frame rate");
        }

        let mut stream = MmapStream::with_buffers(&device, Type::VideoCapture, CAPTURE_BUFFERS)
            .map_err(unavailable)?;
        stream.set_timeout(config.read_timeout());

        tracing::info!(
            device = %path,
            format = %pixel_format,
            stride = format.stride,
            "Camera opened"
        );

        Ok(Self {
            stream,
            _device: device,
            path,
            format: pixel_format,
            width: format.width,
            height: format.height,
            stride: format.stride,
            clock: CaptureClock::new(),
        })
    }
}

impl FrameSource for V4l2Camera {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        let (buffer, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::CaptureTimeout(e.to_string()))?;
        let timestamp = self.clock.now();

        let used = (meta.bytesused as usize).min(buffer.len());
        if used == 0 {
            return Err(CameraError::CaptureTimeout("driver returned an empty buffer".into()));
        }
        let data = pack_rows(
            self.format,
            self.width,
            self.height,
            self.stride as usize,
            &buffer[..used],
        );

        Ok(Frame::new(self.width, self.height, self.format, data, timestamp))
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        tracing::info!(device = %self.path, "Camera closed");
    }
}

/// Frame interval (seconds per frame) as a V4L2 fraction
fn frame_interval(fps: f64) -> (u32, u32) {
    if fps.fract() == 0.0 {
        (1, fps as u32)
    } else {
        (1000, (fps * 1000.0).round() as u32)
    }
}
