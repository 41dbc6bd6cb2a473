//! Capture loop
//!
//! Runs source, encoder and hub publish back to back on a dedicated OS
//! thread. Device reads block, so they stay off the async runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::camera::{CameraError, FrameSource};
use crate::encoder::FrameEncoder;
use crate::hub::FrameHub;
use crate::stats::CaptureStats;

use super::policy::{RetryDecision, RetryPolicy};

/// Name of the capture thread
const THREAD_NAME: &str = "capture";

/// Producer side of the pipeline
pub struct CaptureLoop<S: FrameSource> {
    source: S,
    encoder: FrameEncoder,
    hub: Arc<FrameHub>,
    policy: RetryPolicy,
    stats: Arc<CaptureStats>,
    running: Arc<AtomicBool>,
}

impl<S: FrameSource> CaptureLoop<S> {
    /// Create a loop feeding `hub` from `source`
    pub fn new(source: S, encoder: FrameEncoder, hub: Arc<FrameHub>) -> Self {
        Self {
            source,
            encoder,
            hub,
            policy: RetryPolicy::default(),
            stats: Arc::new(CaptureStats::new()),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Set the dropped-frame policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Share counters with the caller
    pub fn with_stats(mut self, stats: Arc<CaptureStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Counters updated by this loop
    pub fn stats(&self) -> &Arc<CaptureStats> {
        &self.stats
    }

    /// Run on the current thread until stopped or the device fails
    ///
    /// The hub is closed on return either way.
    pub fn run(mut self) -> Result<(), CameraError> {
        let device = self.source.describe();
        tracing::info!(device = %device, "Capture started");

        let result = self.capture(&device);
        self.hub.close();

        match &result {
            Ok(()) => tracing::info!(device = %device, "Capture stopped"),
            Err(e) => tracing::error!(device = %device, error = %e, "Capture failed"),
        }
        result
    }

    /// Run on a dedicated thread
    pub fn spawn(self) -> std::io::Result<CaptureHandle>
    where
        S: 'static,
    {
        let running = Arc::clone(&self.running);
        let thread = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || self.run())?;

        Ok(CaptureHandle {
            running,
            thread: Some(thread),
        })
    }

    fn capture(&mut self, device: &str) -> Result<(), CameraError> {
        let mut consecutive_failures = 0u32;

        while self.running.load(Ordering::Relaxed) {
            let frame = match self.source.read_frame() {
                Ok(frame) => frame,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    self.stats.record_read_failure();
                    tracing::warn!(
                        device = %device,
                        consecutive = consecutive_failures,
                        error = %e,
                        "Dropped frame"
                    );

                    match self.policy.on_failure(consecutive_failures) {
                        RetryDecision::Retry(backoff) => {
                            thread::sleep(backoff);
                            continue;
                        }
                        RetryDecision::GiveUp => {
                            return Err(CameraError::unavailable(
                                device,
                                format!("{} consecutive read failures", consecutive_failures),
                            ));
                        }
                    }
                }
            };

            consecutive_failures = 0;
            self.stats.record_capture();

            match self.encoder.encode(&frame) {
                Ok(encoded) => {
                    let bytes = encoded.len();
                    let receivers = self.hub.publish(encoded);
                    self.stats.record_publish(bytes);
                    tracing::trace!(bytes, receivers, timestamp = frame.timestamp, "Frame published");
                }
                Err(e) => {
                    self.stats.record_encode_failure();
                    tracing::warn!(
                        device = %device,
                        format = %frame.format,
                        error = %e,
                        "Frame skipped"
                    );
                }
            }
        }

        Ok(())
    }
}

/// Handle on a spawned capture thread
pub struct CaptureHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<(), CameraError>>>,
}

impl CaptureHandle {
    /// Ask the loop to stop after the current frame
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Whether the thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait for the thread to exit and return its result
    pub fn join(mut self) -> Result<(), CameraError> {
        match self.thread.take() {
            Some(thread) => thread.join().unwrap_or_else(|_| {
                Err(CameraError::unavailable(THREAD_NAME, "capture thread panicked"))
            }),
            None => Ok(()),
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
