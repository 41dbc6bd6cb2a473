//! Hub error types

use std::time::Duration;

/// Error type for hub operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// The producer has stopped; no further frames will arrive
    Closed,
    /// The subscription was already released
    Unsubscribed,
    /// No new frame arrived within the wait limit
    Stalled(Duration),
}

impl std::fmt::Display for HubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HubError::Closed => write!(f, "Frame hub closed"),
            HubError::Unsubscribed => write!(f, "Subscription already released"),
            HubError::Stalled(after) => {
                write!(f, "No new frame for {} ms", after.as_millis())
            }
        }
    }
}

impl std::error::Error for HubError {}
