//! Live MJPEG camera streaming
//!
//! A capture thread reads frames from a V4L2 camera (or a synthetic test
//! pattern), stamps the capture time on each one, encodes it to JPEG and
//! publishes it to a [`hub::FrameHub`]. Every HTTP client of `/video_feed`
//! pulls from its own subscription to the hub, so a slow client only ever
//! skips frames and never holds up capture or other clients.
//!
//! ```text
//! FrameSource ─► FrameEncoder ─► FrameHub ─┬─► Subscription ─► /video_feed
//!                                          ├─► Subscription ─► /video_feed
//!                                          └─► ...
//! ```

pub mod camera;
pub mod capture;
pub mod config;
pub mod encoder;
pub mod error;
pub mod hub;
pub mod server;
pub mod stats;

pub use camera::{CameraError, Frame, FrameSource, PixelFormat};
pub use capture::{CaptureHandle, CaptureLoop, RetryPolicy};
pub use config::{AppConfig, CameraConfig, ConfigError};
pub use encoder::{EncodeError, FrameEncoder};
pub use error::{Error, Result};
pub use hub::{EncodedFrame, FrameHub, HubError, Subscription};
pub use server::{DashboardServer, ServerConfig};
