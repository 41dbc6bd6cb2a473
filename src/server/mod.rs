//! HTTP front end
//!
//! `GET /` serves the dashboard page, `GET /video_feed` the live MJPEG
//! stream, `GET /stats` pipeline counters as JSON.

pub mod config;
pub mod listener;
pub mod page;
pub mod stream;

pub use config::ServerConfig;
pub use listener::{DashboardServer, StatsReport};
pub use stream::{encode_part, BOUNDARY, STREAM_CONTENT_TYPE};
