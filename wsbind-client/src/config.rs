//! Client configuration for wsbind
//!
//! These are the client defaults every outbound handshake request starts
//! from before a caller's template is merged in.

use std::time::Duration;
use wsbind_core::error::ConfigError;
use wsbind_core::headers::HeaderFields;
use wsbind_core::protocol::constants::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_IDLE_TIMEOUT, MAX_HEADER_SIZE,
};
use wsbind_core::Error;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Handshake timeout used when a request template does not set one
    pub handshake_timeout: Duration,
    /// Idle timeout applied to every endpoint during base customization
    pub idle_timeout: Option<Duration>,
    /// Disable Nagle's algorithm on new endpoints
    pub nodelay: bool,
    /// Maximum size of the handshake response head in bytes
    pub max_response_head_size: usize,
    /// User agent string
    pub user_agent: String,
    /// Origin header
    pub origin: Option<String>,
    /// Headers added to every request before the template is applied
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            nodelay: true,
            max_response_head_size: MAX_HEADER_SIZE,
            user_agent: format!("wsbind-client/{}", env!("CARGO_PKG_VERSION")),
            origin: None,
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Validate the configuration
    pub fn validate(&self) -> wsbind_core::Result<()> {
        if self.handshake_timeout.is_zero() {
            return Err(Error::Config(ConfigError::Validation(
                "handshake_timeout must be greater than 0".to_string(),
            )));
        }

        if self.idle_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config(ConfigError::Validation(
                "idle_timeout must be greater than 0 when set".to_string(),
            )));
        }

        if self.max_response_head_size < 64 {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "max_response_head_size".to_string(),
                value: self.max_response_head_size.to_string(),
            }));
        }

        if HeaderFields::new()
            .try_append("user-agent", &self.user_agent)
            .is_err()
        {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "user_agent".to_string(),
                value: self.user_agent.clone(),
            }));
        }

        let mut scratch = HeaderFields::new();
        for (name, value) in &self.headers {
            scratch.try_append(name, value).map_err(|e| {
                Error::Config(ConfigError::InvalidValue {
                    field: "headers".to_string(),
                    value: e.to_string(),
                })
            })?;
        }

        Ok(())
    }

    /// Set handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Enable or disable `TCP_NODELAY`
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Set maximum response head size
    pub fn max_response_head_size(mut self, size: usize) -> Self {
        self.max_response_head_size = size;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set origin
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Add a default header
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.handshake_timeout, DEFAULT_HANDSHAKE_TIMEOUT);
        assert!(config.user_agent.starts_with("wsbind-client/"));
        assert!(config.nodelay);
    }

    #[test]
    fn test_client_config_validation() {
        let config = ClientConfig::default().handshake_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = ClientConfig::default().idle_timeout(Some(Duration::ZERO));
        assert!(config.validate().is_err());

        let config = ClientConfig::default().max_response_head_size(10);
        assert!(config.validate().is_err());

        let config = ClientConfig::default().add_header("bad header", "x");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::default()
            .user_agent("test-agent")
            .origin("https://example.com")
            .add_header("X-Custom", "value")
            .idle_timeout(None);

        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.origin.as_deref(), Some("https://example.com"));
        assert_eq!(
            config.headers,
            vec![("X-Custom".to_string(), "value".to_string())]
        );
        assert!(config.idle_timeout.is_none());
        assert!(config.validate().is_ok());
    }
}
