//! Error types for wsbind
//!
//! Every failure of an upgrade attempt surfaces as exactly one [`Error`]. The
//! top-level variants are the taxonomy callers branch on; the nested enums
//! carry the detail.

#![allow(missing_docs)]

use std::time::Duration;
use thiserror::Error;

/// Result type alias for wsbind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for wsbind operations
#[derive(Error, Debug)]
pub enum Error {
    /// The caller-supplied template or target URI is malformed.
    ///
    /// Detected while building the request; no network activity has happened.
    #[error("Invalid upgrade template: {0}")]
    InvalidTemplate(#[from] TemplateError),

    /// No handshake response arrived within the configured timeout
    #[error("Handshake timed out after {timeout:?}")]
    HandshakeTimeout { timeout: Duration },

    /// The server did not switch protocols, or the handler refused the
    /// negotiated parameters
    #[error("Handshake rejected: {0}")]
    HandshakeRejected(#[from] RejectReason),

    /// Errors propagated unchanged from the transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The caller cancelled the upgrade attempt
    #[error("Handshake cancelled")]
    Cancelled,

    /// A lifecycle method was called out of order or more than once
    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    /// Client configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns `true` for [`Error::InvalidTemplate`]
    pub fn is_invalid_template(&self) -> bool {
        matches!(self, Error::InvalidTemplate(_))
    }

    /// Returns `true` for [`Error::HandshakeTimeout`]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::HandshakeTimeout { .. })
    }

    /// Returns `true` for [`Error::HandshakeRejected`]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Error::HandshakeRejected(_))
    }

    /// Returns `true` for [`Error::Transport`]
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Returns `true` for [`Error::Cancelled`]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Short, stable label for the error kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidTemplate(_) => "invalid_template",
            Error::HandshakeTimeout { .. } => "timeout",
            Error::HandshakeRejected(_) => "rejected",
            Error::Transport(_) => "transport",
            Error::Cancelled => "cancelled",
            Error::IllegalState(_) => "illegal_state",
            Error::Config(_) => "config",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(TransportError::Io(err))
    }
}

/// Malformed caller input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Header name is not a valid HTTP token
    #[error("Invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// Header value contains forbidden bytes
    #[error("Invalid value for header {header}")]
    InvalidHeaderValue { header: String },

    /// Target URI could not be used for a handshake
    #[error("Invalid target URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: &'static str },

    /// Cookie cannot be carried in a `Cookie` header
    #[error("Invalid cookie {name:?}: {reason}")]
    InvalidCookie { name: String, reason: &'static str },
}

/// Why a handshake was not accepted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Response status was not 101 Switching Protocols
    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),

    /// Missing required header
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// Invalid header value
    #[error("Invalid header value for {header}: {value}")]
    InvalidHeaderValue { header: String, value: String },

    /// `Sec-WebSocket-Accept` does not match the key sent
    #[error("Invalid WebSocket accept key - expected: {expected}, received: {received}")]
    InvalidAcceptKey { expected: String, received: String },

    /// Server selected a sub-protocol the client never offered
    #[error("Server selected a sub-protocol that was not offered: {0}")]
    UnofferedSubprotocol(String),

    /// Server accepted an extension the client never offered
    #[error("Server accepted an extension that was not offered: {0}")]
    UnofferedExtension(String),

    /// Response head could not be parsed
    #[error("Malformed handshake response: {0}")]
    MalformedResponse(String),

    /// Response head exceeded the configured size limit
    #[error("Handshake response too large: more than {max} bytes")]
    ResponseTooLarge { max: usize },

    /// The message handler refused the negotiated parameters
    #[error("Handler refused the upgrade: {0}")]
    Handler(String),
}

/// Errors raised by the transport layer
#[derive(Error, Debug)]
pub enum TransportError {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection could not be established
    #[error("Connect failed: {0}")]
    Connect(String),

    /// The transport cannot serve this URI scheme
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// Peer closed the connection before the handshake completed
    #[error("Connection closed during handshake")]
    Closed,
}

/// Configuration errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_transport() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert!(err.is_transport());
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn test_reject_reason_display() {
        let err = Error::from(RejectReason::UnexpectedStatus(403));
        assert!(err.is_rejected());
        assert_eq!(err.to_string(), "Handshake rejected: Unexpected HTTP status: 403");
    }

    #[test]
    fn test_timeout_is_distinct_from_io() {
        let err = Error::HandshakeTimeout {
            timeout: Duration::from_millis(5000),
        };
        assert!(err.is_timeout());
        assert!(!err.is_transport());
    }
}
