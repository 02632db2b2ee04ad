//! WebSocket opening handshake primitives
//!
//! Key generation, accept-key computation, and parsing and validation of the
//! server's handshake response as defined in RFC 6455 section 4.1.

use crate::error::RejectReason;
use crate::extension::{parse_extensions, ExtensionConfig};
use crate::headers::HeaderFields;
use crate::protocol::constants::*;
use crate::protocol::http_header::*;
use crate::protocol::http_status::SWITCHING_PROTOCOLS;
use crate::protocol::http_value;
use base64::{engine::general_purpose, Engine as _};
use http::header::{HeaderName, HeaderValue};
use sha1::{Digest, Sha1};

/// Generate a random WebSocket key
pub fn generate_key() -> String {
    use rand::RngCore;
    let mut key_bytes = [0u8; WEBSOCKET_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key_bytes);
    general_purpose::STANDARD.encode(key_bytes)
}

/// Compute WebSocket accept key from client key
pub fn compute_accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WEBSOCKET_MAGIC.as_bytes());
    general_purpose::STANDARD.encode(hasher.finalize())
}

/// Validate WebSocket key format
pub fn validate_key(key: &str) -> bool {
    key.len() == 24
        && general_purpose::STANDARD
            .decode(key)
            .map(|k| k.len() == WEBSOCKET_KEY_LEN)
            .unwrap_or(false)
}

/// The server's response to a handshake request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// HTTP status code
    pub status: u16,
    /// HTTP reason phrase
    pub reason: String,
    /// HTTP headers in the order received
    pub headers: HeaderFields,
}

impl HandshakeResponse {
    /// Create a response with no headers
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers: HeaderFields::new(),
        }
    }

    /// Returns `true` if the status is 101 Switching Protocols
    pub fn is_switching_protocols(&self) -> bool {
        self.status == SWITCHING_PROTOCOLS
    }

    /// Sub-protocol selected by the server, if any
    pub fn subprotocol(&self) -> Option<&str> {
        self.headers
            .get(SEC_WEBSOCKET_PROTOCOL)
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Extensions accepted by the server, in header order
    pub fn extensions(&self) -> Result<Vec<ExtensionConfig>, RejectReason> {
        parse_extensions(self.headers.get_all(SEC_WEBSOCKET_EXTENSIONS)).map_err(|e| {
            RejectReason::InvalidHeaderValue {
                header: SEC_WEBSOCKET_EXTENSIONS.to_string(),
                value: e.0,
            }
        })
    }
}

/// Parse a response head from the start of `buf`
///
/// Returns `Ok(None)` while the head is incomplete. On success the second
/// element is the length of the head; anything after it already belongs to
/// the upgraded connection.
pub fn parse_response(buf: &[u8]) -> Result<Option<(HandshakeResponse, usize)>, RejectReason> {
    let mut raw_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Response::new(&mut raw_headers);

    let head_len = match parsed.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(RejectReason::MalformedResponse(e.to_string())),
    };

    let status = parsed
        .code
        .ok_or_else(|| RejectReason::MalformedResponse("missing status code".to_string()))?;

    let mut headers = HeaderFields::new();
    for header in parsed.headers.iter() {
        let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|_| {
            RejectReason::MalformedResponse(format!("header name {:?}", header.name))
        })?;
        let value = HeaderValue::from_bytes(header.value).map_err(|_| {
            RejectReason::MalformedResponse(format!("value of header {}", header.name))
        })?;
        headers.append(name, value);
    }

    Ok(Some((
        HandshakeResponse {
            status,
            reason: parsed.reason.unwrap_or_default().to_string(),
            headers,
        },
        head_len,
    )))
}

/// Validate a server handshake response against the request that produced it
pub fn validate_response(
    response: &HandshakeResponse,
    client_key: &str,
    offered_protocols: &[String],
    offered_extensions: &[ExtensionConfig],
) -> Result<(), RejectReason> {
    if !response.is_switching_protocols() {
        return Err(RejectReason::UnexpectedStatus(response.status));
    }

    let upgrade = required(response, UPGRADE)?;
    if !upgrade.trim().eq_ignore_ascii_case(http_value::WEBSOCKET) {
        return Err(RejectReason::InvalidHeaderValue {
            header: UPGRADE.to_string(),
            value: upgrade.to_string(),
        });
    }

    let connection = required(response, CONNECTION)?;
    if !connection
        .split(',')
        .any(|token| token.trim().eq_ignore_ascii_case(http_value::UPGRADE))
    {
        return Err(RejectReason::InvalidHeaderValue {
            header: CONNECTION.to_string(),
            value: connection.to_string(),
        });
    }

    let accept = required(response, SEC_WEBSOCKET_ACCEPT)?;
    let expected = compute_accept_key(client_key);
    if accept.trim() != expected {
        return Err(RejectReason::InvalidAcceptKey {
            expected,
            received: accept.to_string(),
        });
    }

    if let Some(protocol) = response.subprotocol() {
        if !offered_protocols.iter().any(|p| p == protocol) {
            return Err(RejectReason::UnofferedSubprotocol(protocol.to_string()));
        }
    }

    for accepted in response.extensions()? {
        if !offered_extensions
            .iter()
            .any(|offer| offer.name().eq_ignore_ascii_case(accepted.name()))
        {
            return Err(RejectReason::UnofferedExtension(accepted.name().to_string()));
        }
    }

    Ok(())
}

fn required<'a>(response: &'a HandshakeResponse, name: &str) -> Result<&'a str, RejectReason> {
    response
        .headers
        .get(name)
        .ok_or_else(|| RejectReason::MissingHeader(name.to_string()))
}
