//! Read-only handshake views
//!
//! Handlers see the handshake through these views instead of the transport's
//! own request and response types. A view is a thin handle over shared,
//! immutable data; building one is cheap and nothing is cached, so two views
//! over the same backing request always agree.

use crate::request::OutboundHandshakeRequest;
use http::Uri;
use std::sync::Arc;
use std::time::Duration;
use wsbind_core::protocol::http_header::SEC_WEBSOCKET_ACCEPT;
use wsbind_core::{Cookie, ExtensionConfig, HandshakeResponse, HeaderFields};

/// Read-only view of an outbound handshake request
#[derive(Debug, Clone)]
pub struct HandshakeRequestView {
    request: Arc<OutboundHandshakeRequest>,
}

impl HandshakeRequestView {
    /// Create a view over `request`
    pub fn new(request: Arc<OutboundHandshakeRequest>) -> Self {
        Self { request }
    }

    /// HTTP method
    pub fn method(&self) -> &'static str {
        self.request.method()
    }

    /// Target URI
    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// All request headers in order
    pub fn headers(&self) -> &HeaderFields {
        self.request.headers()
    }

    /// First value of a header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.headers().get(name)
    }

    /// Every value of a header, in order
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.request.headers().get_all(name).collect()
    }

    /// Cookies sent with the request
    pub fn cookies(&self) -> Vec<Cookie> {
        self.request.cookies()
    }

    /// Sub-protocols offered to the server
    pub fn sub_protocols(&self) -> &[String] {
        self.request.sub_protocols()
    }

    /// Extensions offered to the server
    pub fn extensions(&self) -> &[ExtensionConfig] {
        self.request.extensions()
    }

    /// Handshake timeout
    pub fn timeout(&self) -> Duration {
        self.request.timeout()
    }

    /// `Sec-WebSocket-Key` sent with the request
    pub fn websocket_key(&self) -> &str {
        self.request.key()
    }

    /// Returns `true` if the target scheme implies TLS
    pub fn is_secure(&self) -> bool {
        self.request.is_secure()
    }

    /// Returns `true` if both views are backed by the same request
    pub fn same_request(&self, other: &HandshakeRequestView) -> bool {
        Arc::ptr_eq(&self.request, &other.request)
    }
}

/// Read-only view of the server's handshake response
#[derive(Debug, Clone)]
pub struct HandshakeResponseView {
    response: Arc<HandshakeResponse>,
}

impl HandshakeResponseView {
    /// Create a view over `response`
    pub fn new(response: Arc<HandshakeResponse>) -> Self {
        Self { response }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// HTTP reason phrase
    pub fn reason(&self) -> &str {
        &self.response.reason
    }

    /// All response headers in order
    pub fn headers(&self) -> &HeaderFields {
        &self.response.headers
    }

    /// First value of a header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.headers.get(name)
    }

    /// Sub-protocol selected by the server
    pub fn subprotocol(&self) -> Option<&str> {
        self.response.subprotocol()
    }

    /// Extensions accepted by the server; empty if the header is unparsable
    pub fn extensions(&self) -> Vec<ExtensionConfig> {
        self.response.extensions().unwrap_or_default()
    }

    /// `Sec-WebSocket-Accept` value
    pub fn accept_key(&self) -> Option<&str> {
        self.response.headers.get(SEC_WEBSOCKET_ACCEPT)
    }
}
