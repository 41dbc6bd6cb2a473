//! Frame producer
//!
//! Owns the camera once it is open and keeps the hub supplied with encoded
//! frames at the device's native rate.

pub mod policy;
pub mod producer;

pub use policy::{RetryDecision, RetryPolicy};
pub use producer::{CaptureHandle, CaptureLoop};
