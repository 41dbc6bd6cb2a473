//! Per-client subscription cursor

use std::time::Duration;

use tokio::sync::watch;

use super::broadcast::Slot;
use super::error::HubError;
use super::frame::EncodedFrame;

/// A subscriber's handle on the hub
///
/// Remembers the sequence number of the last frame it delivered, so each
/// frame is returned at most once and never out of order. Dropping the
/// handle unsubscribes it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: Option<watch::Receiver<Slot>>,
    last_sequence: u64,
    /// Frames up to this sequence were published before subscribing
    joined_after: u64,
    delivered: u64,
    skipped: u64,
}

impl Subscription {
    pub(super) fn new(id: u64, rx: watch::Receiver<Slot>) -> Self {
        // The current frame is still delivered to a late joiner, so it is
        // not counted as published before subscribing
        let joined_after = rx.borrow().sequence.saturating_sub(1);

        Self {
            id,
            rx: Some(rx),
            last_sequence: 0,
            joined_after,
            delivered: 0,
            skipped: 0,
        }
    }

    /// Subscriber id, unique per hub
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Frames returned so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Frames published while this subscriber was busy and never seen by it
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Whether `unsubscribe` has been called
    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }

    /// Wait for a frame newer than the last one returned
    ///
    /// Cancel-safe: dropping the future loses no frame.
    pub async fn next(&mut self) -> Result<EncodedFrame, HubError> {
        let rx = self.rx.as_mut().ok_or(HubError::Unsubscribed)?;

        loop {
            {
                let slot = rx.borrow_and_update();
                if let Some(frame) = slot.frame.as_ref() {
                    if frame.sequence > self.last_sequence {
                        let seen = self.last_sequence.max(self.joined_after);
                        self.skipped += frame.sequence.saturating_sub(seen + 1);
                        self.last_sequence = frame.sequence;
                        self.delivered += 1;
                        return Ok(frame.clone());
                    }
                }
                if slot.closed {
                    return Err(HubError::Closed);
                }
            }

            if rx.changed().await.is_err() {
                return Err(HubError::Closed);
            }
        }
    }

    /// `next` with an upper bound on the wait
    pub async fn next_timeout(&mut self, limit: Duration) -> Result<EncodedFrame, HubError> {
        tokio::time::timeout(limit, self.next())
            .await
            .map_err(|_| HubError::Stalled(limit))?
    }

    /// Leave the hub
    ///
    /// Returns `false` if the subscription was already released.
    pub fn unsubscribe(&mut self) -> bool {
        match self.rx.take() {
            Some(rx) => {
                drop(rx);
                tracing::debug!(
                    subscriber = self.id,
                    delivered = self.delivered,
                    skipped = self.skipped,
                    "Subscriber removed"
                );
                true
            }
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
