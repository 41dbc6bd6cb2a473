//! `/video_feed` stream handler
//!
//! Each client gets its own hub subscription, wrapped in a body stream that
//! emits one multipart part per frame:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <jpeg bytes>\r\n
//! ```
//!
//! The stream ends when the hub closes. When the client goes away hyper
//! drops the body, which drops the subscription and unsubscribes it.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::OwnedSemaphorePermit;

use crate::hub::{EncodedFrame, HubError, Subscription};
use crate::stats::{ClientGuard, ClientStats};

/// Multipart boundary token
pub const BOUNDARY: &str = "frame";

/// Response content type for the stream
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

/// Serialize one frame as a multipart part
pub fn encode_part(frame: &EncodedFrame) -> Bytes {
    let mut part = BytesMut::with_capacity(PART_HEADER.len() + frame.len() + 2);
    part.put_slice(PART_HEADER);
    part.put_slice(&frame.data);
    part.put_slice(b"\r\n");
    part.freeze()
}

/// Per-client stream state, dropped with the response body
pub(crate) struct FeedState {
    subscription: Subscription,
    stats: Arc<ClientStats>,
    stall_limit: Option<Duration>,
    _guard: ClientGuard,
    _permit: Option<OwnedSemaphorePermit>,
}

impl FeedState {
    pub(crate) fn new(
        subscription: Subscription,
        stats: Arc<ClientStats>,
        stall_limit: Option<Duration>,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Self {
        let guard = stats.connect();

        tracing::info!(
            subscriber = subscription.id(),
            "Stream client connected"
        );

        Self {
            subscription,
            stats,
            stall_limit,
            _guard: guard,
            _permit: permit,
        }
    }

    async fn next_frame(&mut self) -> Option<EncodedFrame> {
        loop {
            let result = match self.stall_limit {
                Some(limit) => self.subscription.next_timeout(limit).await,
                None => self.subscription.next().await,
            };

            match result {
                Ok(frame) => return Some(frame),
                Err(HubError::Stalled(after)) => {
                    tracing::warn!(
                        subscriber = self.subscription.id(),
                        waited_ms = after.as_millis() as u64,
                        "No new frame, stream stalled"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        subscriber = self.subscription.id(),
                        reason = %e,
                        "Stream ended"
                    );
                    return None;
                }
            }
        }
    }
}

impl Drop for FeedState {
    fn drop(&mut self) {
        tracing::info!(
            subscriber = self.subscription.id(),
            delivered = self.subscription.delivered(),
            skipped = self.subscription.skipped(),
            "Stream client disconnected"
        );
    }
}

/// Build the streaming response for one client
pub(crate) fn feed_response(state: FeedState) -> Response {
    let parts = futures::stream::unfold(state, |mut state| async move {
        let frame = state.next_frame().await?;
        let part = encode_part(&frame);
        state.stats.record_part(part.len());
        Some((Ok::<_, Infallible>(part), state))
    });

    (
        [
            (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Body::from_stream(parts),
    )
        .into_response()
}

/// Response for a refused stream request
pub(crate) fn unavailable(reason: &'static str) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, reason).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_layout() {
        let frame = EncodedFrame::new(Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]), 1.0);
        let part = encode_part(&frame);

        let mut expected = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        expected.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xD9]);
        expected.extend_from_slice(b"\r\n");
        assert_eq!(&part[..], &expected[..]);
    }

    #[test]
    fn test_content_type_names_boundary() {
        assert!(STREAM_CONTENT_TYPE.ends_with(&format!("boundary={}", BOUNDARY)));
        assert!(PART_HEADER.starts_with(format!("--{}\r\n", BOUNDARY).as_bytes()));
    }
}
