//! Pipeline counters
//!
//! Lock-free counters updated by the capture thread and the stream handlers,
//! read by the `/stats` endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Capture-side counters
#[derive(Debug)]
pub struct CaptureStats {
    started_at: Instant,
    frames_captured: AtomicU64,
    frames_published: AtomicU64,
    bytes_encoded: AtomicU64,
    read_failures: AtomicU64,
    encode_failures: AtomicU64,
}

/// Point-in-time copy of `CaptureStats`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureSnapshot {
    /// Frames read from the source
    pub frames_captured: u64,
    /// Frames encoded and handed to the hub
    pub frames_published: u64,
    /// Total JPEG bytes produced
    pub bytes_encoded: u64,
    /// Dropped frames (transient read failures)
    pub read_failures: u64,
    /// Frames discarded by the encoder
    pub encode_failures: u64,
    /// Average published frame rate since start
    pub average_fps: f64,
}

impl CaptureStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_captured: AtomicU64::new(0),
            frames_published: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            read_failures: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
        }
    }

    pub fn record_capture(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish(&self, bytes: usize) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Time since the counters were created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Copy the current values
    pub fn snapshot(&self) -> CaptureSnapshot {
        let frames_published = self.frames_published.load(Ordering::Relaxed);
        let secs = self.uptime().as_secs_f64();

        CaptureSnapshot {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_published,
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            average_fps: if secs > 0.0 {
                frames_published as f64 / secs
            } else {
                0.0
            },
        }
    }
}

impl Default for CaptureStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-side counters
#[derive(Debug, Default)]
pub struct ClientStats {
    total_clients: AtomicU64,
    active_clients: AtomicU64,
    rejected_clients: AtomicU64,
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
}

/// Point-in-time copy of `ClientStats`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientSnapshot {
    /// Stream clients accepted since start
    pub total_clients: u64,
    /// Stream clients currently connected
    pub active_clients: u64,
    /// Stream requests refused (limit reached or no camera)
    pub rejected_clients: u64,
    /// Multipart parts written
    pub frames_sent: u64,
    /// Multipart bytes written
    pub bytes_sent: u64,
}

impl ClientStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a new client; the returned guard counts the disconnect
    pub fn connect(self: &std::sync::Arc<Self>) -> ClientGuard {
        self.total_clients.fetch_add(1, Ordering::Relaxed);
        self.active_clients.fetch_add(1, Ordering::Relaxed);
        ClientGuard {
            stats: std::sync::Arc::clone(self),
        }
    }

    pub fn record_rejected(&self) {
        self.rejected_clients.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_part(&self, bytes: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Copy the current values
    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            total_clients: self.total_clients.load(Ordering::Relaxed),
            active_clients: self.active_clients.load(Ordering::Relaxed),
            rejected_clients: self.rejected_clients.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }
}

/// Decrements the active client count when dropped
#[derive(Debug)]
pub struct ClientGuard {
    stats: std::sync::Arc<ClientStats>,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.stats.active_clients.fetch_sub(1, Ordering::Relaxed);
    }
}
