//! Frame encoding
//!
//! Turns captured frames into timestamped JPEG images ready for the hub.

pub mod convert;
pub mod error;
pub mod jpeg;
pub mod overlay;

pub use error::EncodeError;
pub use jpeg::{timestamp_label, FrameEncoder};
