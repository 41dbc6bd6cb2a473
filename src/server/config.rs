//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default listen address: all interfaces, port 5000
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// HTTP server options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent `/video_feed` clients (0 = unlimited)
    pub max_clients: usize,

    /// Log a stall when a client waits this long for a new frame
    /// (`None` = wait silently)
    pub stall_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            max_clients: 0, // Unlimited
            stall_timeout_ms: None,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Keep the host, change the port
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set maximum stream clients
    pub fn max_clients(mut self, max: usize) -> Self {
        self.max_clients = max;
        self
    }

    /// Set the stall warning threshold
    pub fn stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Stall warning threshold, if enabled
    pub fn stall_limit(&self) -> Option<Duration> {
        self.stall_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.max_clients, 0);
        assert_eq!(config.stall_limit(), None);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_builder_port_keeps_host() {
        let config = ServerConfig::default().port(8000);

        assert_eq!(config.bind_addr, "0.0.0.0:8000".parse().unwrap());
    }

    #[test]
    fn test_zero_stall_timeout_disabled() {
        let config = ServerConfig {
            stall_timeout_ms: Some(0),
            ..Default::default()
        };

        assert_eq!(config.stall_limit(), None);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:5001".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_clients(8)
            .stall_timeout(Duration::from_secs(3));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_clients, 8);
        assert_eq!(config.stall_limit(), Some(Duration::from_secs(3)));
    }
}
