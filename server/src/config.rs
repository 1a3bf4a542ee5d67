use shared::{DEFAULT_BIND_HOST, DEFAULT_PORT};
use std::time::Duration;

/// Runtime settings for the round supervisor
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` the listener binds to
    pub bind_addr: String,
    /// How long teardown waits for handlers and writers before forcing them closed
    pub grace_period: Duration,
}

impl ServerConfig {
    pub fn new(host: &str, port: u16, grace_period: Duration) -> Self {
        Self {
            bind_addr: format!("{}:{}", host, port),
            grace_period,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BIND_HOST, DEFAULT_PORT, Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:65432");
        assert_eq!(config.grace_period, Duration::from_secs(2));
    }

    #[test]
    fn test_custom_config() {
        let config = ServerConfig::new("127.0.0.1", 0, Duration::from_millis(250));
        assert_eq!(config.bind_addr, "127.0.0.1:0");
        assert_eq!(config.grace_period, Duration::from_millis(250));
    }
}
