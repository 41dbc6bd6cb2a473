//! camstream binary
//!
//! Usage:
//!   camstream [--config configs/zones.yaml] [--port 5000] [--test]
//!
//! Then open http://localhost:5000/ in a browser.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use camstream::camera;
use camstream::capture::{CaptureHandle, CaptureLoop, RetryPolicy};
use camstream::config::{AppConfig, ConfigError, DEFAULT_CONFIG_PATH};
use camstream::encoder::FrameEncoder;
use camstream::hub::FrameHub;
use camstream::server::DashboardServer;
use camstream::stats::CaptureStats;
use camstream::Error;

#[derive(Debug, Parser)]
#[command(name = "camstream", version, about = "Live MJPEG camera streaming server")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Stream a synthetic test pattern instead of opening the camera
    #[arg(long)]
    test: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> camstream::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let directive: tracing_subscriber::filter::Directive = "camstream=info"
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("log filter: {}", e)))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let mut config = AppConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.server = config.server.port(port);
    }

    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let hub = Arc::new(FrameHub::new());
    let capture_stats = Arc::new(CaptureStats::new());
    let capture = start_capture(&config, args.test, &hub, &capture_stats).await;

    let server = DashboardServer::new(config.server.clone(), &config.camera, Arc::clone(&hub))
        .with_capture_stats(capture_stats);

    println!("Serving on http://{}/", server.bind_addr());

    let result = server.run_until(shutdown_signal()).await;

    let captured = match capture {
        Some(capture) => stop_capture(capture).await,
        None => Ok(()),
    };

    result?;
    captured
}

/// Resolves on Ctrl+C
///
/// If the handler cannot be installed the server runs until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Stop the capture thread and report how it ended
///
/// A camera that failed while streaming turns into the process error.
async fn stop_capture(capture: CaptureHandle) -> camstream::Result<()> {
    capture.stop();
    match tokio::task::spawn_blocking(move || capture.join()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Capture ended with error");
            Err(Error::from(e))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Capture thread join failed");
            Ok(())
        }
    }
}

/// Open the camera and start the capture thread
///
/// On failure the hub is closed and the server keeps running, so `/`
/// still answers and `/video_feed` reports the camera as unavailable.
async fn start_capture(
    config: &AppConfig,
    test_mode: bool,
    hub: &Arc<FrameHub>,
    stats: &Arc<CaptureStats>,
) -> Option<CaptureHandle> {
    let camera_config = config.camera.clone();
    let opened =
        tokio::task::spawn_blocking(move || camera::open(&camera_config, test_mode)).await;

    let source = match opened {
        Ok(Ok(source)) => source,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Could not open camera");
            hub.close();
            return None;
        }
        Err(e) => {
            tracing::error!(error = %e, "Camera open task failed");
            hub.close();
            return None;
        }
    };

    let encoder = FrameEncoder::new().with_quality(config.camera.jpeg_quality);
    let capture = CaptureLoop::new(source, encoder, Arc::clone(hub))
        .with_policy(RetryPolicy::from_config(&config.camera))
        .with_stats(Arc::clone(stats));

    match capture.spawn() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::error!(error = %e, "Failed to start capture thread");
            hub.close();
            None
        }
    }
}
