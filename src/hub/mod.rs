//! Frame broadcast hub
//!
//! Decouples the capture thread from HTTP clients. The producer publishes
//! into a single slot; each client holds a `Subscription` and pulls from it
//! at its own pace.
//!
//! # Architecture
//!
//! ```text
//!   capture thread                    Arc<FrameHub>
//!  ┌──────────────┐  publish()   ┌──────────────────────┐
//!  │ FrameSource  │─────────────►│ watch::Sender<Slot>  │
//!  │ FrameEncoder │              │   frame: Option<..>  │
//!  └──────────────┘              │   sequence, closed   │
//!                                └──────────┬───────────┘
//!                                           │ wake
//!              ┌────────────────────────────┼────────────────────────┐
//!              ▼                            ▼                        ▼
//!        Subscription                 Subscription             Subscription
//!        next().await                 next().await             next().await
//!              │                            │                        │
//!              └──► multipart part ──► HTTP body ──► TCP             ...
//! ```
//!
//! # Coalescing
//!
//! There is no queue. A subscriber that misses several publishes receives
//! only the newest frame, so memory stays at one frame regardless of how
//! many clients are connected or how slow they are. Frame payloads are
//! `bytes::Bytes`, shared by reference count across all subscribers.

pub mod broadcast;
pub mod error;
pub mod frame;
pub mod subscription;

pub use broadcast::{FrameHub, HubStats};
pub use error::HubError;
pub use frame::EncodedFrame;
pub use subscription::Subscription;
