//! Outbound handshake request construction
//!
//! [`OutboundHandshakeRequest::build`] merges the client defaults, the
//! caller's template and the target URI into one finished request. It either
//! returns a complete request or an error; the transport never sees a
//! half-built one.

use crate::config::ClientConfig;
use crate::template::UpgradeRequestTemplate;
use bytes::{BufMut, Bytes, BytesMut};
use http::Uri;
use std::time::Duration;
use wsbind_core::cookie::parse_cookie_header;
use wsbind_core::error::TemplateError;
use wsbind_core::extension::format_extensions;
use wsbind_core::handshake::generate_key;
use wsbind_core::protocol::constants::WEBSOCKET_VERSION;
use wsbind_core::protocol::http_header::*;
use wsbind_core::protocol::{http_method, http_value, scheme};
use wsbind_core::{Cookie, ExtensionConfig, HeaderFields, Result};

/// Header names the handshake itself controls; template values for these are
/// kept on the request but never written to the wire.
const MANAGED_HEADERS: &[&str] = &[
    UPGRADE,
    CONNECTION,
    SEC_WEBSOCKET_KEY,
    SEC_WEBSOCKET_VERSION,
    SEC_WEBSOCKET_PROTOCOL,
    SEC_WEBSOCKET_EXTENSIONS,
];

/// A fully built WebSocket upgrade request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundHandshakeRequest {
    uri: Uri,
    headers: HeaderFields,
    sub_protocols: Vec<String>,
    extensions: Vec<ExtensionConfig>,
    timeout: Duration,
    key: String,
}

impl OutboundHandshakeRequest {
    /// Build a request for `target` from the client defaults and an optional template
    pub fn build(
        template: Option<&UpgradeRequestTemplate>,
        target: &str,
        config: &ClientConfig,
    ) -> Result<Self> {
        let uri = parse_target(target)?;

        let mut headers = HeaderFields::new();
        headers.try_append(HOST, &host_header(&uri))?;
        headers.try_append(USER_AGENT, &config.user_agent)?;
        if let Some(origin) = &config.origin {
            headers.try_append(ORIGIN, origin)?;
        }
        for (name, value) in &config.headers {
            headers.try_append(name, value)?;
        }

        let mut request = Self {
            uri,
            headers,
            sub_protocols: Vec::new(),
            extensions: Vec::new(),
            timeout: config.handshake_timeout,
            key: generate_key(),
        };

        if let Some(template) = template {
            request.apply_template(template)?;
        }

        Ok(request)
    }

    fn apply_template(&mut self, template: &UpgradeRequestTemplate) -> Result<()> {
        let mut replaced = Vec::new();
        let mut fields = Vec::new();
        for (name, values) in template.headers() {
            let name = HeaderFields::parse_name(name)?;
            for value in values {
                let value = HeaderFields::parse_value(&name, value)?;
                fields.push((name.clone(), value));
            }
            if !replaced.contains(&name) {
                replaced.push(name);
            }
        }

        // A deserialized template may spell one name several ways; its
        // entries add up and only the client defaults are displaced.
        for name in &replaced {
            self.headers.remove(name);
        }
        for (name, value) in fields {
            self.headers.append(name, value);
        }

        for cookie in template.cookies() {
            cookie.validate()?;
            self.headers.try_append(COOKIE, &cookie.to_string())?;
        }

        self.sub_protocols = template.offered_sub_protocols().to_vec();
        self.extensions = template.extensions().to_vec();

        if let Some(timeout) = template.handshake_timeout().filter(|t| !t.is_zero()) {
            self.timeout = timeout;
        }

        Ok(())
    }

    /// Target URI
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// HTTP method, always `GET` for a handshake
    pub fn method(&self) -> &'static str {
        http_method::GET
    }

    /// Merged headers in order, including one `Cookie` value per cookie
    pub fn headers(&self) -> &HeaderFields {
        &self.headers
    }

    /// Cookies carried by the `Cookie` header values, in order
    pub fn cookies(&self) -> Vec<Cookie> {
        self.headers
            .get_all(COOKIE)
            .flat_map(parse_cookie_header)
            .collect()
    }

    /// Offered sub-protocols in preference order
    pub fn sub_protocols(&self) -> &[String] {
        &self.sub_protocols
    }

    /// Offered extensions in order
    pub fn extensions(&self) -> &[ExtensionConfig] {
        &self.extensions
    }

    /// Time allowed between sending the request and receiving the response
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The `Sec-WebSocket-Key` sent with this request
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns `true` if the target scheme implies TLS
    pub fn is_secure(&self) -> bool {
        self.uri.scheme_str().is_some_and(scheme::is_secure)
    }

    /// Origin-form request target (`/path?query`)
    pub fn request_target(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .filter(|pq| !pq.is_empty())
            .unwrap_or("/")
    }

    /// Serialize the request head for HTTP/1.1
    ///
    /// All `Cookie` values are folded into a single header line as RFC 6265
    /// requires, preserving their order.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(256);
        put_line(&mut buf, &format!("{} {} HTTP/1.1", self.method(), self.request_target()));

        for host in self.headers.get_all(HOST) {
            put_header(&mut buf, "Host", host);
        }
        put_header(&mut buf, "Upgrade", http_value::WEBSOCKET);
        put_header(&mut buf, "Connection", http_value::UPGRADE);
        put_header(&mut buf, "Sec-WebSocket-Key", &self.key);
        put_header(&mut buf, "Sec-WebSocket-Version", WEBSOCKET_VERSION);
        if !self.sub_protocols.is_empty() {
            put_header(&mut buf, "Sec-WebSocket-Protocol", &self.sub_protocols.join(", "));
        }
        if !self.extensions.is_empty() {
            put_header(
                &mut buf,
                "Sec-WebSocket-Extensions",
                &format_extensions(&self.extensions),
            );
        }

        for (name, value) in &self.headers {
            let name = name.as_str();
            if name == HOST || name == COOKIE || MANAGED_HEADERS.contains(&name) {
                continue;
            }
            buf.put_slice(name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }

        let cookies: Vec<&str> = self.headers.get_all(COOKIE).collect();
        if !cookies.is_empty() {
            put_header(&mut buf, "Cookie", &cookies.join("; "));
        }

        buf.put_slice(b"\r\n");
        buf.freeze()
    }
}

/// Parse and check a handshake target URI
pub fn parse_target(target: &str) -> std::result::Result<Uri, TemplateError> {
    let invalid = |reason| TemplateError::InvalidUri {
        uri: target.to_string(),
        reason,
    };

    let uri: Uri = target.parse().map_err(|_| invalid("not a valid URI"))?;
    let scheme = uri.scheme_str().ok_or_else(|| invalid("URI is not absolute"))?;
    if !scheme::is_supported(scheme) {
        return Err(invalid("scheme must be ws, wss, http or https"));
    }
    match uri.host() {
        Some(host) if !host.is_empty() => Ok(uri),
        _ => Err(invalid("URI has no host")),
    }
}

fn host_header(uri: &Uri) -> String {
    let host = uri.host().unwrap_or_default();
    match uri.port_u16() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn put_line(buf: &mut BytesMut, line: &str) {
    buf.put_slice(line.as_bytes());
    buf.put_slice(b"\r\n");
}

fn put_header(buf: &mut BytesMut, name: &str, value: &str) {
    buf.put_slice(name.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(value.as_bytes());
    buf.put_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wsbind_core::Error;

    fn config() -> ClientConfig {
        ClientConfig::default().user_agent("test-agent")
    }

    fn build(template: &UpgradeRequestTemplate, target: &str) -> Result<OutboundHandshakeRequest> {
        OutboundHandshakeRequest::build(Some(template), target, &config())
    }

    fn wire(request: &OutboundHandshakeRequest) -> String {
        String::from_utf8(request.to_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_build_without_template_uses_defaults() {
        let request =
            OutboundHandshakeRequest::build(None, "ws://example.com:9000/chat?x=1", &config())
                .unwrap();

        assert_eq!(request.headers().get("Host"), Some("example.com:9000"));
        assert_eq!(request.headers().get("User-Agent"), Some("test-agent"));
        assert_eq!(request.request_target(), "/chat?x=1");
        assert!(request.sub_protocols().is_empty());
        assert!(request.extensions().is_empty());
        assert_eq!(request.timeout(), config().handshake_timeout);
        assert!(wsbind_core::handshake::validate_key(request.key()));
    }

    #[test]
    fn test_build_scenario_request() {
        let template = UpgradeRequestTemplate::new()
            .header("X-Test", "1")
            .cookie(Cookie::new("a", "b"))
            .sub_protocol("chat")
            .timeout(Duration::from_millis(5000));

        let request = build(&template, "wss://host/ws").unwrap();

        assert_eq!(request.headers().get("X-Test"), Some("1"));
        assert_eq!(
            request.headers().get_all("Cookie").collect::<Vec<_>>(),
            vec!["a=b"]
        );
        assert_eq!(request.sub_protocols(), &["chat".to_string()]);
        assert_eq!(request.timeout(), Duration::from_millis(5000));
        assert!(request.is_secure());
        assert_eq!(request.headers().get("Host"), Some("host"));
    }

    #[test]
    fn test_template_header_replaces_default() {
        let template = UpgradeRequestTemplate::new().header("User-Agent", "custom");
        let request = build(&template, "ws://example.com/").unwrap();

        assert_eq!(
            request.headers().get_all("user-agent").collect::<Vec<_>>(),
            vec!["custom"]
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_case_variant_template_entries_accumulate() {
        let template: UpgradeRequestTemplate = serde_json::from_str(
            r#"{"headers": [["X-A", ["1"]], ["User-Agent", ["custom"]], ["x-a", ["2"]]]}"#,
        )
        .unwrap();
        let request = build(&template, "ws://example.com/").unwrap();

        assert_eq!(
            request.headers().get_all("x-a").collect::<Vec<_>>(),
            vec!["1", "2"]
        );
        assert_eq!(
            request.headers().get_all("user-agent").collect::<Vec<_>>(),
            vec!["custom"]
        );
    }

    #[test]
    fn test_cookies_append_after_header_cookies() {
        let template = UpgradeRequestTemplate::new()
            .header("Cookie", "h=1")
            .cookie(Cookie::new("a", "b"))
            .cookie(Cookie::new("a", "b"))
            .cookie(Cookie::new("c", "d"));

        let request = build(&template, "ws://example.com/").unwrap();

        assert_eq!(
            request.headers().get_all("cookie").collect::<Vec<_>>(),
            vec!["h=1", "a=b", "a=b", "c=d"]
        );
        let names: Vec<_> = request
            .cookies()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["h", "a", "a", "c"]);
    }

    #[test]
    fn test_offers_are_copied_without_dedup() {
        let template = UpgradeRequestTemplate::new()
            .sub_protocols(["chat", "chat", "v2"])
            .extension(ExtensionConfig::new("permessage-deflate"))
            .extension(
                ExtensionConfig::new("permessage-deflate").flag("client_no_context_takeover"),
            );

        let request = build(&template, "ws://example.com/").unwrap();

        assert_eq!(request.sub_protocols(), &["chat", "chat", "v2"]);
        assert_eq!(request.extensions().len(), 2);
    }

    #[test]
    fn test_zero_template_timeout_keeps_default() {
        let template = UpgradeRequestTemplate::new().timeout(Duration::ZERO);
        let request = build(&template, "ws://example.com/").unwrap();
        assert_eq!(request.timeout(), config().handshake_timeout);
    }

    #[test]
    fn test_invalid_inputs_fail_at_build() {
        let target = "ws://example.com/";
        let cases = [
            (UpgradeRequestTemplate::new().header("bad name", "x"), target),
            (UpgradeRequestTemplate::new().header("X-Test", "a\r\nb"), target),
            (UpgradeRequestTemplate::new().header("X-Name", "café"), target),
            (UpgradeRequestTemplate::new().cookie(Cookie::new("a b", "c")), target),
            (UpgradeRequestTemplate::new(), "/relative/path"),
            (UpgradeRequestTemplate::new(), "ftp://example.com/"),
        ];

        for (template, target) in cases {
            let err = build(&template, target).unwrap_err();
            assert!(matches!(err, Error::InvalidTemplate(_)), "{target}: {err}");
        }
    }

    #[test]
    fn test_wire_format() {
        let template = UpgradeRequestTemplate::new()
            .header("X-Test", "1")
            .header("Sec-WebSocket-Version", "8")
            .cookie(Cookie::new("a", "b"))
            .cookie(Cookie::new("c", "d"))
            .sub_protocols(["chat", "v2"])
            .extension(ExtensionConfig::new("permessage-deflate").flag("client_max_window_bits"));

        let request = build(&template, "ws://example.com/ws").unwrap();
        let text = wire(&request);

        assert!(text.starts_with("GET /ws HTTP/1.1\r\nHost: example.com\r\n"));
        assert!(text.contains("Upgrade: websocket\r\n"));
        assert!(text.contains("Connection: Upgrade\r\n"));
        assert!(text.contains(&format!("Sec-WebSocket-Key: {}\r\n", request.key())));
        assert!(text.contains("Sec-WebSocket-Version: 13\r\n"));
        assert!(!text.contains("Sec-WebSocket-Version: 8"));
        assert!(text.contains("Sec-WebSocket-Protocol: chat, v2\r\n"));
        assert!(text.contains(
            "Sec-WebSocket-Extensions: permessage-deflate; client_max_window_bits\r\n"
        ));
        assert!(text.contains("x-test: 1\r\n"));
        assert!(text.contains("Cookie: a=b; c=d\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_request_target_defaults_to_root() {
        let request = OutboundHandshakeRequest::build(None, "ws://example.com", &config()).unwrap();
        assert_eq!(request.request_target(), "/");
    }

    proptest! {
        #[test]
        fn prop_template_header_order_and_multiplicity(
            entries in proptest::collection::vec(
                ("x-[a-z]{1,8}", proptest::collection::vec("[a-zA-Z0-9]{0,12}", 1..4)),
                0..12,
            )
        ) {
            let mut template = UpgradeRequestTemplate::new();
            for (name, values) in &entries {
                for value in values {
                    template = template.header(name.clone(), value.clone());
                }
            }

            let request = build(&template, "ws://example.com/").unwrap();

            let expected: Vec<(String, String)> = template
                .headers()
                .iter()
                .flat_map(|(n, vs)| vs.iter().map(move |v| (n.clone(), v.clone())))
                .collect();
            let actual: Vec<(String, String)> = request
                .headers()
                .iter()
                .filter(|(n, _)| n.as_str().starts_with("x-"))
                .map(|(n, v)| (n.as_str().to_string(), v.to_str().unwrap().to_string()))
                .collect();

            prop_assert_eq!(actual, expected);
        }
    }
}
