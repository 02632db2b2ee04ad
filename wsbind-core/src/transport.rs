//! Transport layer abstraction
//!
//! An [`Endpoint`] is the raw duplex byte connection underneath a WebSocket
//! session, independent of framing. A [`Connector`] produces endpoints for a
//! target URI. The handshake drives both through these traits so any
//! transport can be plugged in.

use crate::error::Result;
use bytes::{Buf, Bytes};
use std::net::SocketAddr;
use std::time::Duration;

/// Trait for transport endpoints
#[async_trait::async_trait]
pub trait Endpoint: Send + Sync + std::fmt::Debug {
    /// Read data from the endpoint, returning 0 at end of stream
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all data to the endpoint
    async fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Flush the endpoint
    async fn flush(&mut self) -> Result<()>;

    /// Close the endpoint
    async fn close(&mut self) -> Result<()>;

    /// Returns `false` once the endpoint has been closed
    fn is_open(&self) -> bool;

    /// Get the remote address, if the transport has one
    fn remote_addr(&self) -> Option<SocketAddr>;

    /// Current idle timeout applied to reads and writes
    fn idle_timeout(&self) -> Option<Duration>;

    /// Set the idle timeout applied to reads and writes
    fn set_idle_timeout(&mut self, timeout: Option<Duration>);

    /// Enable or disable Nagle's algorithm where the transport supports it
    fn set_nodelay(&mut self, _nodelay: bool) -> Result<()> {
        Ok(())
    }
}

/// Trait for establishing endpoints
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a connection to the host named by `uri`
    async fn connect(&self, uri: &http::Uri) -> Result<Box<dyn Endpoint>>;
}

/// Endpoint wrapper that yields already-buffered bytes before reading from
/// the inner endpoint
#[derive(Debug)]
pub struct Rewind {
    prefix: Bytes,
    inner: Box<dyn Endpoint>,
}

impl Rewind {
    /// Wrap `inner`, replaying `prefix` first
    pub fn new(prefix: Bytes, inner: Box<dyn Endpoint>) -> Self {
        Self { prefix, inner }
    }

    /// Bytes not yet replayed
    pub fn buffered(&self) -> &[u8] {
        &self.prefix
    }

    /// Unwrap, returning unreplayed bytes and the inner endpoint
    pub fn into_parts(self) -> (Bytes, Box<dyn Endpoint>) {
        (self.prefix, self.inner)
    }
}

#[async_trait::async_trait]
impl Endpoint for Rewind {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.prefix.has_remaining() {
            let n = std::cmp::min(buf.len(), self.prefix.len());
            self.prefix.copy_to_slice(&mut buf[..n]);
            return Ok(n);
        }
        self.inner.read(buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf).await
    }

    async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await
    }

    async fn close(&mut self) -> Result<()> {
        self.prefix.clear();
        self.inner.close().await
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.inner.remote_addr()
    }

    fn idle_timeout(&self) -> Option<Duration> {
        self.inner.idle_timeout()
    }

    fn set_idle_timeout(&mut self, timeout: Option<Duration>) {
        self.inner.set_idle_timeout(timeout)
    }

    fn set_nodelay(&mut self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay)
    }
}

/// In-memory endpoints for testing handshakes without sockets
#[cfg(all(feature = "tokio-runtime", any(test, feature = "test-util")))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod mock {
    use super::*;
    use crate::error::TransportError;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    #[derive(Debug, Default)]
    struct MockState {
        closed: bool,
        idle_timeout: Option<Duration>,
        nodelay: Option<bool>,
    }

    /// Endpoint backed by one half of a `tokio::io::duplex` pipe
    #[derive(Debug)]
    pub struct MockEndpoint {
        stream: DuplexStream,
        state: Arc<Mutex<MockState>>,
    }

    /// Observes a [`MockEndpoint`] after it has been moved elsewhere
    #[derive(Debug, Clone)]
    pub struct MockProbe {
        state: Arc<Mutex<MockState>>,
    }

    impl MockEndpoint {
        /// Create an endpoint and the peer half a test server talks to
        pub fn pair(capacity: usize) -> (Self, DuplexStream) {
            let (local, peer) = tokio::io::duplex(capacity);
            let endpoint = Self {
                stream: local,
                state: Arc::new(Mutex::new(MockState::default())),
            };
            (endpoint, peer)
        }

        /// Probe for inspecting endpoint state from tests
        pub fn probe(&self) -> MockProbe {
            MockProbe {
                state: Arc::clone(&self.state),
            }
        }

        fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut state)
        }

        fn ensure_open(&self) -> Result<()> {
            if self.with_state(|s| s.closed) {
                return Err(TransportError::Closed.into());
            }
            Ok(())
        }
    }

    impl MockProbe {
        fn with_state<R>(&self, f: impl FnOnce(&MockState) -> R) -> R {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            f(&state)
        }

        /// Returns `true` once `close` was called on the endpoint
        pub fn is_closed(&self) -> bool {
            self.with_state(|s| s.closed)
        }

        /// Idle timeout last set on the endpoint
        pub fn idle_timeout(&self) -> Option<Duration> {
            self.with_state(|s| s.idle_timeout)
        }

        /// `TCP_NODELAY` value last set on the endpoint
        pub fn nodelay(&self) -> Option<bool> {
            self.with_state(|s| s.nodelay)
        }
    }

    #[async_trait::async_trait]
    impl Endpoint for MockEndpoint {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.ensure_open()?;
            Ok(self.stream.read(buf).await?)
        }

        async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
            self.ensure_open()?;
            Ok(self.stream.write_all(buf).await?)
        }

        async fn flush(&mut self) -> Result<()> {
            Ok(self.stream.flush().await?)
        }

        async fn close(&mut self) -> Result<()> {
            if self.with_state(|s| std::mem::replace(&mut s.closed, true)) {
                return Ok(());
            }
            Ok(self.stream.shutdown().await?)
        }

        fn is_open(&self) -> bool {
            !self.with_state(|s| s.closed)
        }

        fn remote_addr(&self) -> Option<SocketAddr> {
            None
        }

        fn idle_timeout(&self) -> Option<Duration> {
            self.with_state(|s| s.idle_timeout)
        }

        fn set_idle_timeout(&mut self, timeout: Option<Duration>) {
            self.with_state(|s| s.idle_timeout = timeout)
        }

        fn set_nodelay(&mut self, nodelay: bool) -> Result<()> {
            self.with_state(|s| s.nodelay = Some(nodelay));
            Ok(())
        }
    }

    /// Read one HTTP message head, up to and including the blank line
    pub async fn read_head<S>(stream: &mut S) -> std::io::Result<String>
    where
        S: tokio::io::AsyncRead + Unpin,
    {
        let mut head = Vec::with_capacity(256);
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            if stream.read(&mut byte).await? == 0 {
                return Err(std::io::ErrorKind::UnexpectedEof.into());
            }
            head.push(byte[0]);
        }
        String::from_utf8(head).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Build a `101 Switching Protocols` head accepting the key in `request_head`
    pub fn accept_response(request_head: &str, extra_headers: &[(&str, &str)]) -> String {
        let key = request_head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("sec-websocket-key"))
            .map(|(_, value)| value.trim())
            .unwrap_or_default();

        let mut response = format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Accept: {}\r\n",
            crate::handshake::compute_accept_key(key)
        );
        for (name, value) in extra_headers {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }
        response.push_str("\r\n");
        response
    }

    /// Connector that hands out prepared mock endpoints in order
    #[derive(Debug, Default)]
    pub struct MockConnector {
        endpoints: Mutex<Vec<MockEndpoint>>,
        connects: Mutex<Vec<String>>,
    }

    impl MockConnector {
        /// Create a connector that will serve `endpoint` on the first connect
        pub fn new(endpoint: MockEndpoint) -> Self {
            Self {
                endpoints: Mutex::new(vec![endpoint]),
                connects: Mutex::new(Vec::new()),
            }
        }

        /// URIs passed to `connect`, in call order
        pub fn connects(&self) -> Vec<String> {
            self.connects
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }
    }

    #[async_trait::async_trait]
    impl Connector for MockConnector {
        async fn connect(&self, uri: &http::Uri) -> Result<Box<dyn Endpoint>> {
            self.connects
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(uri.to_string());

            let mut endpoints = self.endpoints.lock().unwrap_or_else(|e| e.into_inner());
            if endpoints.is_empty() {
                return Err(TransportError::Connect("no mock endpoint left".to_string()).into());
            }
            Ok(Box::new(endpoints.remove(0)))
        }
    }
}
