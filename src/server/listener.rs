//! HTTP server
//!
//! Serves the dashboard page, the MJPEG feed and a JSON stats endpoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::config::CameraConfig;
use crate::error::Result;
use crate::hub::{FrameHub, HubStats};
use crate::server::config::ServerConfig;
use crate::server::page;
use crate::server::stream::{self, FeedState};
use crate::stats::{CaptureSnapshot, CaptureStats, ClientSnapshot, ClientStats};

/// State shared by all request handlers
#[derive(Clone)]
struct AppState {
    hub: Arc<FrameHub>,
    index_html: Arc<str>,
    config: Arc<ServerConfig>,
    capture_stats: Arc<CaptureStats>,
    client_stats: Arc<ClientStats>,
    client_limit: Option<Arc<Semaphore>>,
    started_at: Instant,
}

/// Body of `GET /stats`
#[derive(Debug, Serialize)]
pub struct StatsReport {
    /// Seconds since the server was created
    pub uptime_secs: f64,
    /// Hub state
    pub hub: HubStats,
    /// Capture counters
    pub capture: CaptureSnapshot,
    /// Client counters
    pub clients: ClientSnapshot,
}

/// MJPEG dashboard server
pub struct DashboardServer {
    state: AppState,
}

impl DashboardServer {
    /// Create a server streaming from `hub`
    ///
    /// `camera` only feeds the dashboard page; the page is rendered once.
    pub fn new(config: ServerConfig, camera: &CameraConfig, hub: Arc<FrameHub>) -> Self {
        let client_limit = if config.max_clients > 0 {
            Some(Arc::new(Semaphore::new(config.max_clients)))
        } else {
            None
        };

        Self {
            state: AppState {
                hub,
                index_html: page::render_index(camera).into(),
                config: Arc::new(config),
                capture_stats: Arc::new(CaptureStats::new()),
                client_stats: Arc::new(ClientStats::new()),
                client_limit,
                started_at: Instant::now(),
            },
        }
    }

    /// Report capture counters shared with the capture loop
    pub fn with_capture_stats(mut self, stats: Arc<CaptureStats>) -> Self {
        self.state.capture_stats = stats;
        self
    }

    /// Get a reference to the frame hub
    pub fn hub(&self) -> &Arc<FrameHub> {
        &self.state.hub
    }

    /// Client counters
    pub fn client_stats(&self) -> &Arc<ClientStats> {
        &self.state.client_stats
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.state.config.bind_addr
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/video_feed", get(video_feed))
            .route("/stats", get(stats))
            .with_state(self.state.clone())
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    ///
    /// When `shutdown` resolves the hub is closed, so open streams end and
    /// the server can drain.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.state.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "MJPEG server listening");

        let hub = Arc::clone(&self.state.hub);
        let shutdown = async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            hub.close();
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!(addr = %addr, "MJPEG server stopped");
        Ok(())
    }
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.index_html.to_string())
}

async fn video_feed(State(state): State<AppState>) -> Response {
    // Check client limit
    let permit = match state.client_limit {
        Some(ref sem) => match Arc::clone(sem).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(
                    max_clients = state.config.max_clients,
                    "Stream rejected: client limit reached"
                );
                state.client_stats.record_rejected();
                return stream::unavailable("Too many stream clients\n");
            }
        },
        None => None,
    };

    let subscription = match state.hub.subscribe() {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::warn!(error = %e, "Stream rejected: camera unavailable");
            state.client_stats.record_rejected();
            return stream::unavailable("Camera unavailable\n");
        }
    };

    let feed = FeedState::new(
        subscription,
        Arc::clone(&state.client_stats),
        state.config.stall_limit(),
        permit,
    );
    stream::feed_response(feed)
}

async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatsReport {
        uptime_secs: state.started_at.elapsed().as_secs_f64(),
        hub: state.hub.stats(),
        capture: state.capture_stats.snapshot(),
        clients: state.client_stats.snapshot(),
    })
}
