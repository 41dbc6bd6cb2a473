//! Runtime statistics

pub mod metrics;

pub use metrics::{CaptureSnapshot, CaptureStats, ClientGuard, ClientSnapshot, ClientStats};
