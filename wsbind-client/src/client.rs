//! WebSocket client for wsbind
//!
//! The client owns the configuration and the connector shared by every
//! upgrade attempt it starts. It is cheap to clone.

use crate::config::ClientConfig;
use crate::handler::HandlerFactory;
use crate::template::UpgradeRequestTemplate;
use crate::upgrade::{ClientUpgradeRequest, UpgradedSession};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use wsbind_core::error::ConfigError;
use wsbind_core::{Connector, Error, Result};

/// WebSocket client
#[derive(Clone)]
pub struct WebSocketClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
}

impl WebSocketClient {
    /// Create a client with the default configuration
    pub fn new(connector: impl Connector) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config: ClientConfig::default(),
                connector: Arc::new(connector),
            }),
        }
    }

    /// Start building a client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Connector used for every attempt
    pub fn connector(&self) -> &dyn Connector {
        self.inner.connector.as_ref()
    }

    /// Prepare an upgrade request without sending it
    pub fn upgrade_request<P, F>(
        &self,
        template: Option<&UpgradeRequestTemplate>,
        uri: &str,
        factory: &F,
        payload: P,
    ) -> Result<ClientUpgradeRequest>
    where
        F: HandlerFactory<P> + ?Sized,
    {
        ClientUpgradeRequest::new(self, template, uri, factory, payload)
    }

    /// Build, send and bind an upgrade request in one step
    pub async fn connect<P, F>(
        &self,
        template: Option<&UpgradeRequestTemplate>,
        uri: &str,
        factory: &F,
        payload: P,
    ) -> Result<UpgradedSession>
    where
        F: HandlerFactory<P> + ?Sized,
    {
        self.upgrade_request(template, uri, factory, payload)?
            .send()
            .await
    }
}

impl fmt::Debug for WebSocketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Client builder
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            connector: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the connector
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Use a plain TCP connector
    #[cfg(feature = "transport-tcp")]
    #[cfg_attr(docsrs, doc(cfg(feature = "transport-tcp")))]
    pub fn with_tcp(self) -> Self {
        self.connector(wsbind_transport_tcp::TcpConnector::new())
    }

    /// Set the default handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.handshake_timeout(timeout);
        self
    }

    /// Set the idle timeout applied to new endpoints
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config = self.config.idle_timeout(timeout);
        self
    }

    /// Enable or disable `TCP_NODELAY`
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config = self.config.nodelay(nodelay);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(agent);
        self
    }

    /// Set origin
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.config = self.config.origin(origin);
        self
    }

    /// Add a header sent with every request
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.add_header(name, value);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<WebSocketClient> {
        self.config.validate()?;
        let connector = self.connector.ok_or_else(|| {
            Error::Config(ConfigError::Validation(
                "a connector is required".to_string(),
            ))
        })?;

        Ok(WebSocketClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                connector,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("connector", &self.connector.is_some())
            .finish()
    }
}
