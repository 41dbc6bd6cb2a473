//! Latest-frame broadcast hub
//!
//! The hub keeps exactly one current frame behind a `tokio::sync::watch`
//! channel. Publishing replaces the slot and wakes every waiting subscriber;
//! it never waits on them. A subscriber that was busy while several frames
//! went by sees only the newest one on its next read.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use super::error::HubError;
use super::frame::EncodedFrame;
use super::subscription::Subscription;

/// Shared slot guarded by the watch channel
#[derive(Debug, Default)]
pub(super) struct Slot {
    /// Current frame, if anything was published yet
    pub(super) frame: Option<EncodedFrame>,
    /// Last sequence number handed out
    pub(super) sequence: u64,
    /// Set once the producer has stopped for good
    pub(super) closed: bool,
}

/// Snapshot of hub state
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HubStats {
    /// Live subscriptions
    pub subscribers: usize,
    /// Frames published since creation
    pub published: u64,
    /// Capture time of the current frame
    pub last_timestamp: Option<f64>,
    /// Size of the current frame in bytes
    pub last_frame_bytes: Option<usize>,
    /// Whether the producer has stopped
    pub closed: bool,
}

/// Single-producer, many-consumer frame hub
///
/// Share it behind an `Arc`; `publish` and `subscribe` both take `&self`.
pub struct FrameHub {
    tx: watch::Sender<Slot>,
    next_subscriber_id: AtomicU64,
}

impl FrameHub {
    /// Create an empty hub
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Slot::default());

        Self {
            tx,
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    /// Replace the current frame
    ///
    /// Assigns the frame its sequence number and returns the number of
    /// subscribers that will be woken. Frames published after `close` are
    /// discarded and 0 is returned.
    pub fn publish(&self, mut frame: EncodedFrame) -> usize {
        let accepted = self.tx.send_if_modified(|slot| {
            if slot.closed {
                return false;
            }
            slot.sequence += 1;
            frame.sequence = slot.sequence;
            slot.frame = Some(frame);
            true
        });

        if accepted {
            self.tx.receiver_count()
        } else {
            0
        }
    }

    /// Register a new subscriber
    ///
    /// The first `next` on the returned subscription yields the current
    /// frame immediately if one has been published.
    pub fn subscribe(&self) -> Result<Subscription, HubError> {
        let rx = self.tx.subscribe();
        if rx.borrow().closed {
            return Err(HubError::Closed);
        }

        let id = self
            .next_subscriber_id
            .fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            subscriber = id,
            subscribers = self.subscriber_count(),
            "Subscriber added"
        );

        Ok(Subscription::new(id, rx))
    }

    /// Release a subscription
    ///
    /// Idempotent; equivalent to `Subscription::unsubscribe`.
    pub fn unsubscribe(&self, subscription: &mut Subscription) -> bool {
        subscription.unsubscribe()
    }

    /// Mark the producer as stopped
    ///
    /// Waiting subscribers wake up and get `HubError::Closed` once they have
    /// drained the current frame. New subscriptions are refused.
    pub fn close(&self) {
        let newly_closed = self.tx.send_if_modified(|slot| {
            if slot.closed {
                return false;
            }
            slot.closed = true;
            true
        });

        if newly_closed {
            tracing::info!(subscribers = self.subscriber_count(), "Frame hub closed");
        }
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.tx.borrow().closed
    }

    /// Clone of the current frame
    pub fn current(&self) -> Option<EncodedFrame> {
        self.tx.borrow().frame.clone()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Snapshot of hub state
    pub fn stats(&self) -> HubStats {
        let slot = self.tx.borrow();

        HubStats {
            subscribers: self.tx.receiver_count(),
            published: slot.sequence,
            last_timestamp: slot.frame.as_ref().map(|f| f.timestamp),
            last_frame_bytes: slot.frame.as_ref().map(|f| f.len()),
            closed: slot.closed,
        }
    }
}

impl Default for FrameHub {
    fn default() -> Self {
        Self::new()
    }
}
