//! WebSocket handshake constants
//!
//! Protocol constants from RFC 6455 that the opening handshake relies on.

/// WebSocket protocol constants
pub mod constants {
    use std::time::Duration;

    /// WebSocket protocol version
    pub const WEBSOCKET_VERSION: &str = "13";

    /// WebSocket magic string for accept calculation
    pub const WEBSOCKET_MAGIC: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

    /// Default handshake timeout
    pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default idle timeout
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300); // 5 minutes

    /// WebSocket key length in bytes
    pub const WEBSOCKET_KEY_LEN: usize = 16;

    /// Maximum response head size
    pub const MAX_HEADER_SIZE: usize = 8192; // 8KB

    /// Maximum number of headers accepted in a handshake response
    pub const MAX_HEADERS: usize = 64;
}

/// HTTP status codes used in WebSocket handshake
pub mod http_status {
    /// HTTP Switching Protocols status
    pub const SWITCHING_PROTOCOLS: u16 = 101;
}

/// HTTP methods
pub mod http_method {
    /// HTTP GET method
    pub const GET: &str = "GET";
}

/// HTTP header names (lowercase for consistency)
pub mod http_header {
    /// Host header
    pub const HOST: &str = "host";

    /// User-Agent header
    pub const USER_AGENT: &str = "user-agent";

    /// Connection header
    pub const CONNECTION: &str = "connection";

    /// Upgrade header
    pub const UPGRADE: &str = "upgrade";

    /// Origin header
    pub const ORIGIN: &str = "origin";

    /// Sec-WebSocket-Key header
    pub const SEC_WEBSOCKET_KEY: &str = "sec-websocket-key";

    /// Sec-WebSocket-Version header
    pub const SEC_WEBSOCKET_VERSION: &str = "sec-websocket-version";

    /// Sec-WebSocket-Protocol header
    pub const SEC_WEBSOCKET_PROTOCOL: &str = "sec-websocket-protocol";

    /// Sec-WebSocket-Extensions header
    pub const SEC_WEBSOCKET_EXTENSIONS: &str = "sec-websocket-extensions";

    /// Sec-WebSocket-Accept header
    pub const SEC_WEBSOCKET_ACCEPT: &str = "sec-websocket-accept";

    /// Cookie header
    pub const COOKIE: &str = "cookie";
}

/// HTTP header values
pub mod http_value {
    /// WebSocket upgrade value
    pub const WEBSOCKET: &str = "websocket";

    /// Upgrade connection value
    pub const UPGRADE: &str = "Upgrade";
}

/// URI schemes a handshake target may use
pub mod scheme {
    /// Plain WebSocket
    pub const WS: &str = "ws";

    /// WebSocket over TLS
    pub const WSS: &str = "wss";

    /// Plain HTTP, treated like `ws`
    pub const HTTP: &str = "http";

    /// HTTP over TLS, treated like `wss`
    pub const HTTPS: &str = "https";

    /// Returns `true` if the scheme is accepted for a handshake target
    pub fn is_supported(scheme: &str) -> bool {
        [WS, WSS, HTTP, HTTPS]
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme))
    }

    /// Returns `true` if the scheme implies TLS
    pub fn is_secure(scheme: &str) -> bool {
        scheme.eq_ignore_ascii_case(WSS) || scheme.eq_ignore_ascii_case(HTTPS)
    }

    /// Port used when the URI does not name one
    pub fn default_port(scheme: &str) -> u16 {
        if is_secure(scheme) {
            443
        } else {
            80
        }
    }
}
