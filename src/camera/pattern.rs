//! Synthetic test-pattern source
//!
//! Produces an RGB gradient with a bar sweeping left to right, paced to the
//! configured frame rate. Lets the whole pipeline run without camera hardware.

use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::config::CameraConfig;

use super::error::CameraError;
use super::frame::{CaptureClock, Frame, PixelFormat};
use super::source::FrameSource;

/// Width of the sweeping bar in pixels
const BAR_WIDTH: u32 = 16;

/// Pacing used when the configured rate is unusable
const FALLBACK_FPS: f64 = 30.0;

/// Horizontal bar advance per frame
const BAR_STEP: u32 = 5;

/// Test-pattern frame source
pub struct TestPattern {
    width: u32,
    height: u32,
    interval: Duration,
    paced: bool,
    bar_x: u32,
    last_frame: Option<Instant>,
    clock: CaptureClock,
}

impl TestPattern {
    /// Create a test pattern paced to `config.fps`
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            interval: frame_interval(config.fps),
            paced: true,
            bar_x: 0,
            last_frame: None,
            clock: CaptureClock::new(),
        }
    }

    /// Disable frame pacing (frames are produced as fast as requested)
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    fn render(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        let bar = self.bar_x..self.bar_x.saturating_add(BAR_WIDTH);

        for y in 0..self.height {
            let g = (y * 255 / self.height.max(1)) as u8;
            for x in 0..self.width {
                if bar.contains(&x) {
                    data.extend_from_slice(&[0, 200, 0]);
                } else {
                    let r = (x * 255 / self.width.max(1)) as u8;
                    data.extend_from_slice(&[r, g, 96]);
                }
            }
        }

        data
    }

    fn wait_for_slot(&mut self) {
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }
}

impl FrameSource for TestPattern {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        if self.paced {
            self.wait_for_slot();
        }

        let data = self.render();
        self.bar_x = (self.bar_x + BAR_STEP) % self.width.max(1);

        Ok(Frame::new(
            self.width,
            self.height,
            PixelFormat::Rgb24,
            Bytes::from(data),
            self.clock.now(),
        ))
    }

    fn describe(&self) -> String {
        format!("test pattern {}x{}", self.width, self.height)
    }
}

/// Time between frames at `fps`, falling back to 30 fps for rates that are
/// not positive or too small to represent
fn frame_interval(fps: f64) -> Duration {
    let interval = if fps.is_finite() && fps > 0.0 {
        Duration::try_from_secs_f64(1.0 / fps).ok()
    } else {
        None
    };

    interval.unwrap_or_else(|| {
        tracing::warn!(fps, fallback = FALLBACK_FPS, "Unusable test pattern frame rate");
        Duration::from_secs_f64(1.0 / FALLBACK_FPS)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> CameraConfig {
        CameraConfig {
            width: 64,
            height: 48,
            fps: 100.0,
            ..CameraConfig::default()
        }
    }

    #[test]
    fn test_frame_geometry() {
        let mut source = TestPattern::new(&small_config()).unpaced();
        let frame = source.read_frame().unwrap();

        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.format, PixelFormat::Rgb24);
        assert_eq!(Some(frame.len()), PixelFormat::Rgb24.frame_size(64, 48));
    }

    #[test]
    fn test_bar_moves() {
        let mut source = TestPattern::new(&small_config()).unpaced();
        let first = source.read_frame().unwrap();
        let second = source.read_frame().unwrap();

        assert_ne!(first.data, second.data);
        assert!(second.timestamp > first.timestamp);
    }

    #[test]
    fn test_unusable_fps_falls_back() {
        let fallback = Duration::from_secs_f64(1.0 / 30.0);
        assert_eq!(frame_interval(0.0), fallback);
        assert_eq!(frame_interval(-5.0), fallback);
        assert_eq!(frame_interval(f64::NAN), fallback);
        assert_eq!(frame_interval(f64::INFINITY), fallback);
        assert_eq!(frame_interval(1e-300), fallback);
        assert_eq!(frame_interval(50.0), Duration::from_millis(20));

        let config = CameraConfig {
            fps: 0.0,
            ..small_config()
        };
        let mut source = TestPattern::new(&config).unpaced();
        assert!(source.read_frame().is_ok());
    }

    #[test]
    fn test_pacing() {
        let mut source = TestPattern::new(&small_config());
        let start = Instant::now();
        for _ in 0..3 {
            source.read_frame().unwrap();
        }

        // Two full intervals between three frames at 100 fps
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
