//! Client configuration.
use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_POLL_RETRIES, DEFAULT_ORACLE_URL, DEFAULT_POLL_INTERVAL,
    DEFAULT_RECONNECT_INTERVAL, DEFAULT_RELAY_URL, DEFAULT_STATUS_URL, DEFAULT_WEBSOCKET_URL,
};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Client configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Relay endpoint configuration.
    #[serde(default)]
    pub relay: RelayEndpointConfig,
    /// Fee oracle configuration.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Task tracking configuration.
    #[serde(default)]
    pub tracker: TrackerConfig,
}

impl ClientConfig {
    /// Sets the relay URL.
    pub fn with_relay_url(mut self, url: Url) -> Self {
        self.relay.url = url;
        self
    }

    /// Sets the API key sent to the relay.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.relay.api_key = api_key;
        self
    }

    /// Sets the fee oracle URL.
    pub fn with_oracle_url(mut self, url: Url) -> Self {
        self.oracle.url = url;
        self
    }

    /// Sets the task status URL.
    pub fn with_status_url(mut self, url: Url) -> Self {
        self.tracker.status_url = url;
        self
    }

    /// Sets the task WebSocket URL.
    pub fn with_websocket_url(mut self, url: Url) -> Self {
        self.tracker.websocket_url = url;
        self
    }

    /// Sets the maximum time to wait for the task WebSocket to open.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.tracker.connect_timeout = timeout;
        self
    }

    /// Sets the delay before the task WebSocket reconnects.
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.tracker.reconnect_interval = interval;
        self
    }

    /// Sets the delay between task status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.tracker.poll_interval = interval;
        self
    }

    /// Sets the maximum number of task status polls.
    pub fn with_max_poll_retries(mut self, retries: u32) -> Self {
        self.tracker.max_poll_retries = retries;
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Relay endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEndpointConfig {
    /// The relay JSON-RPC endpoint.
    pub url: Url,
    /// API key sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for RelayEndpointConfig {
    fn default() -> Self {
        Self { url: default_url(DEFAULT_RELAY_URL), api_key: None }
    }
}

/// Fee oracle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of the oracle API.
    pub url: Url,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self { url: default_url(DEFAULT_ORACLE_URL) }
    }
}

/// Task tracking configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base URL of the task status API.
    pub status_url: Url,
    /// The task WebSocket.
    pub websocket_url: Url,
    /// Maximum time to wait for the WebSocket to open.
    #[serde(with = "crate::serde::duration")]
    pub connect_timeout: Duration,
    /// Delay before reopening a closed WebSocket.
    #[serde(with = "crate::serde::duration")]
    pub reconnect_interval: Duration,
    /// Delay between status polls once the WebSocket failed.
    #[serde(with = "crate::serde::duration")]
    pub poll_interval: Duration,
    /// Maximum number of status polls.
    pub max_poll_retries: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            status_url: default_url(DEFAULT_STATUS_URL),
            websocket_url: default_url(DEFAULT_WEBSOCKET_URL),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_retries: DEFAULT_MAX_POLL_RETRIES,
        }
    }
}

fn default_url(url: &'static str) -> Url {
    Url::parse(url).expect("default urls are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.relay.url.as_str(), DEFAULT_RELAY_URL);
        assert_eq!(config.tracker.websocket_url.scheme(), "wss");
        assert_eq!(config.tracker.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.tracker.reconnect_interval, Duration::from_secs(1));
        assert_eq!(config.tracker.poll_interval, Duration::from_secs(1));
        assert_eq!(config.tracker.max_poll_retries, 60);
    }

    #[test]
    fn partial_yaml() {
        let s = r#"
relay:
  url: http://localhost:4000/
  api_key: secret
tracker:
  poll_interval: 250
  max_poll_retries: 5
"#;
        let config = serde_yaml::from_str::<ClientConfig>(s).unwrap();
        assert_eq!(config.relay.api_key.as_deref(), Some("secret"));
        assert_eq!(config.oracle, OracleConfig::default());
        assert_eq!(config.tracker.poll_interval, Duration::from_millis(250));
        assert_eq!(config.tracker.max_poll_retries, 5);
        assert_eq!(config.tracker.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn api_key_can_be_cleared() {
        let config = ClientConfig::default().with_api_key(Some("key".into()));
        assert_eq!(config.relay.api_key.as_deref(), Some("key"));
        assert_eq!(config.with_api_key(None).relay.api_key, None);
    }

    #[test]
    fn file_round_trip() {
        let config = ClientConfig::default()
            .with_api_key(Some("key".into()))
            .with_reconnect_interval(Duration::from_millis(1500));
        let path = std::env::temp_dir().join(format!("smartwallet-{}.yaml", std::process::id()));

        config.save_to_file(&path).unwrap();
        let loaded = ClientConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
        assert!(ClientConfig::load_from_file(&path).is_err());
    }
}
