//! Crate-level error type

use crate::camera::CameraError;
use crate::config::ConfigError;

/// Top-level error
#[derive(Debug)]
pub enum Error {
    /// Socket or file I/O failed
    Io(std::io::Error),
    /// Configuration could not be loaded
    Config(ConfigError),
    /// Camera failed to open or died
    Camera(CameraError),
}

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Config(e) => write!(f, "{}", e),
            Error::Camera(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Camera(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<CameraError> for Error {
    fn from(e: CameraError) -> Self {
        Error::Camera(e)
    }
}
