//! Application configuration
//!
//! Loaded once at startup from a YAML file. The file may have been written by
//! OpenCV's `FileStorage`, which prefixes a non-standard `%YAML:1.0` header
//! line; that line is stripped before parsing. A missing file is not an
//! error: every setting has a default.
//!
//! ```yaml
//! camera:
//!   index: 0
//!   width: 640
//!   height: 480
//!   fps: 30
//!   force_mjpg: false
//! server:
//!   bind_addr: 0.0.0.0:5000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::server::ServerConfig;

/// Header token emitted by OpenCV's YAML writer
const VENDOR_HEADER: &str = "%YAML";

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "configs/zones.yaml";

/// Error type for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    /// File exists but could not be read
    Read {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// File content is not valid YAML for the expected shape
    Parse(serde_yaml::Error),
    /// A value is out of range
    Invalid(String),
    /// Effective configuration could not be written back as YAML
    Serialize(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
            ConfigError::Serialize(e) => write!(f, "Failed to serialize config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse(e) | ConfigError::Serialize(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Camera hardware settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Video device index (`/dev/video{index}`)
    pub index: u32,

    /// Explicit device path, overrides `index`
    pub device: Option<String>,

    /// Requested frame width in pixels
    pub width: u32,

    /// Requested frame height in pixels
    pub height: u32,

    /// Requested frame rate
    pub fps: f64,

    /// Request MJPG capture instead of raw frames
    #[serde(alias = "force_mjpeg")]
    pub force_mjpg: bool,

    /// Wait between retries after a dropped frame
    pub retry_backoff_ms: u64,

    /// Longest wait for the driver to deliver a buffer
    pub read_timeout_ms: u64,

    /// Consecutive read failures before the device is declared unavailable
    /// (`None` = retry forever)
    pub max_consecutive_failures: Option<u32>,

    /// JPEG quality 1-100 (`None` = encoder default)
    pub jpeg_quality: Option<u8>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            device: None,
            width: 640,
            height: 480,
            fps: 30.0,
            force_mjpg: false,
            retry_backoff_ms: 100,
            read_timeout_ms: 2000,
            max_consecutive_failures: None,
            jpeg_quality: None,
        }
    }
}

impl CameraConfig {
    /// Device path to open
    pub fn device_path(&self) -> String {
        self.device
            .clone()
            .unwrap_or_else(|| format!("/dev/video{}", self.index))
    }

    /// Backoff after a dropped frame
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Driver read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "camera resolution must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "camera fps must be positive, got {}",
                self.fps
            )));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "camera read_timeout_ms must be positive".into(),
            ));
        }
        if let Some(quality) = self.jpeg_quality {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Invalid(format!(
                    "jpeg_quality must be within 1..=100, got {}",
                    quality
                )));
            }
        }
        Ok(())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Camera settings
    pub camera: CameraConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from `path`
    ///
    /// A missing file yields the defaults and a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content)?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let content = strip_vendor_header(content);

        let config: AppConfig = if content.trim().is_empty() {
            AppConfig::default()
        } else {
            let value: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(ConfigError::Parse)?;
            if value.is_null() {
                AppConfig::default()
            } else {
                serde_yaml::from_value(value).map_err(ConfigError::Parse)?
            }
        };

        config.camera.validate()?;
        Ok(config)
    }

    /// Effective configuration as YAML, in the shape `parse` accepts
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::Serialize)
    }
}

/// Drop the first line if it is an OpenCV `%YAML` header
fn strip_vendor_header(content: &str) -> &str {
    if content.starts_with(VENDOR_HEADER) {
        content.split_once('\n').map(|(_, rest)| rest).unwrap_or("")
    } else {
        content
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.camera.index, 0);
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.camera.height, 480);
        assert_eq!(config.camera.fps, 30.0);
        assert!(!config.camera.force_mjpg);
        assert_eq!(config.camera.retry_backoff(), Duration::from_millis(100));
        assert_eq!(config.camera.read_timeout(), Duration::from_secs(2));
        assert_eq!(config.camera.max_consecutive_failures, None);
        assert_eq!(config.server.bind_addr.port(), 5000);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.yaml")).unwrap();

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_empty_content_uses_defaults() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::parse("%YAML:1.0\n").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::parse("---\n").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_opencv_header_stripped() {
        let content = "%YAML:1.0\n---\ncamera:\n  index: 2\n  width: 1280\n  height: 720\n  fps: 15\n  force_mjpg: true\n";
        let config = AppConfig::parse(content).unwrap();

        assert_eq!(config.camera.index, 2);
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.camera.height, 720);
        assert_eq!(config.camera.fps, 15.0);
        assert!(config.camera.force_mjpg);
    }

    #[test]
    fn test_partial_camera_section() {
        let config = AppConfig::parse("camera:\n  width: 320\n").unwrap();

        assert_eq!(config.camera.width, 320);
        assert_eq!(config.camera.height, 480);
        assert_eq!(config.camera.fps, 30.0);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let content = "model_path: models/yolov5s.onnx\nzones:\n  - name: door\ncamera:\n  fps: 24.5\n";
        let config = AppConfig::parse(content).unwrap();

        assert_eq!(config.camera.fps, 24.5);
    }

    #[test]
    fn test_server_section() {
        let content = "server:\n  bind_addr: 127.0.0.1:8081\n  max_clients: 4\n  stall_timeout_ms: 2500\n";
        let config = AppConfig::parse(content).unwrap();

        assert_eq!(config.server.bind_addr.port(), 8081);
        assert_eq!(config.server.max_clients, 4);
        assert_eq!(config.server.stall_limit(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_to_yaml_parses_back() {
        let mut config = AppConfig::default();
        config.camera.width = 1280;
        config.server = config.server.port(8080);

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("width: 1280"));
        assert_eq!(AppConfig::parse(&yaml).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AppConfig::parse("camera:\n  width: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::parse("camera:\n  fps: -1\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::parse("camera:\n  jpeg_quality: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::parse("camera:\n  read_timeout_ms: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::parse("camera: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "%YAML:1.0").unwrap();
        writeln!(file, "camera:").unwrap();
        writeln!(file, "  device: /dev/video7").unwrap();
        writeln!(file, "  force_mjpeg: true").unwrap();

        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.camera.device_path(), "/dev/video7");
        assert!(config.camera.force_mjpg);
    }

    #[test]
    fn test_device_path_from_index() {
        let camera = CameraConfig {
            index: 3,
            ..CameraConfig::default()
        };
        assert_eq!(camera.device_path(), "/dev/video3");
    }
}
