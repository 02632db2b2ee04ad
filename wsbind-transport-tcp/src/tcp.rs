//! TCP transport implementation for wsbind
//!
//! [`TcpConnector`] resolves the target URI's host and port and opens a
//! plain TCP connection. Secure schemes are refused; TLS belongs to a
//! different connector.

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wsbind_core::protocol::scheme;
use wsbind_core::{Connector, Endpoint, Result, TransportError};

/// Plain TCP connector
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    connect_timeout: Option<Duration>,
}

impl TcpConnector {
    /// Create a connector with no connect timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the time spent establishing the TCP connection
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// `host:port` to dial for `uri`
    pub fn authority(uri: &http::Uri) -> Result<String> {
        let scheme_str = uri.scheme_str().unwrap_or_default();
        if !scheme::is_supported(scheme_str) {
            return Err(TransportError::UnsupportedScheme(scheme_str.to_string()).into());
        }
        if scheme::is_secure(scheme_str) {
            return Err(TransportError::UnsupportedScheme(format!(
                "{} (TLS is not provided by the TCP connector)",
                scheme_str
            ))
            .into());
        }

        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TransportError::Connect(format!("no host in {}", uri)))?;
        let port = uri
            .port_u16()
            .unwrap_or_else(|| scheme::default_port(scheme_str));

        // Bracketed IPv6 hosts keep their brackets in `Uri::host`.
        Ok(format!("{}:{}", host, port))
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, uri: &http::Uri) -> Result<Box<dyn Endpoint>> {
        let authority = Self::authority(uri)?;
        let connecting = TcpStream::connect(authority.as_str());

        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connecting).await.map_err(|_| {
                TransportError::Connect(format!("timed out connecting to {}", authority))
            })?,
            None => connecting.await,
        }
        .map_err(|e| TransportError::Connect(format!("{}: {}", authority, e)))?;

        Ok(Box::new(TcpEndpoint::from_tokio(stream)))
    }
}

/// Endpoint over a tokio TCP stream
#[derive(Debug)]
pub struct TcpEndpoint {
    stream: Option<TcpStream>,
    remote_addr: Option<SocketAddr>,
    idle_timeout: Option<Duration>,
}

impl TcpEndpoint {
    /// Wrap a connected tokio TCP stream
    pub fn from_tokio(stream: TcpStream) -> Self {
        let remote_addr = stream.peer_addr().ok();
        Self {
            stream: Some(stream),
            remote_addr,
            idle_timeout: None,
        }
    }

    /// Local address of the connection
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream()?.local_addr()?)
    }

    /// Unwrap into the tokio stream, if still open
    pub fn into_inner(self) -> Option<TcpStream> {
        self.stream
    }

    fn stream(&self) -> Result<&TcpStream> {
        self.stream
            .as_ref()
            .ok_or_else(|| TransportError::Closed.into())
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| TransportError::Closed.into())
    }
}

/// Apply the idle timeout to one I/O operation
async fn with_idle_timeout<T, F>(timeout: Option<Duration>, io: F) -> Result<T>
where
    F: std::future::Future<Output = io::Result<T>>,
{
    let result = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, io)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "idle timeout expired"))?,
        None => io.await,
    };
    Ok(result?)
}

#[async_trait]
impl Endpoint for TcpEndpoint {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let timeout = self.idle_timeout;
        let stream = self.stream_mut()?;
        with_idle_timeout(timeout, stream.read(buf)).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let timeout = self.idle_timeout;
        let stream = self.stream_mut()?;
        with_idle_timeout(timeout, stream.write_all(buf)).await
    }

    async fn flush(&mut self) -> Result<()> {
        let timeout = self.idle_timeout;
        let stream = self.stream_mut()?;
        with_idle_timeout(timeout, stream.flush()).await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    fn set_idle_timeout(&mut self, timeout: Option<Duration>) {
        self.idle_timeout = timeout;
    }

    fn set_nodelay(&mut self, nodelay: bool) -> Result<()> {
        Ok(self.stream()?.set_nodelay(nodelay)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn uri(s: &str) -> http::Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_authority_uses_default_ports() {
        assert_eq!(
            TcpConnector::authority(&uri("ws://example.com/ws")).unwrap(),
            "example.com:80"
        );
        assert_eq!(
            TcpConnector::authority(&uri("http://example.com:8080/")).unwrap(),
            "example.com:8080"
        );
        assert_eq!(
            TcpConnector::authority(&uri("ws://[::1]:9000/")).unwrap(),
            "[::1]:9000"
        );
    }

    #[test]
    fn test_secure_schemes_are_refused() {
        for target in ["wss://example.com/", "https://example.com/", "ftp://example.com/"] {
            let err = TcpConnector::authority(&uri(target)).unwrap_err();
            assert!(matches!(
                err,
                wsbind_core::Error::Transport(TransportError::UnsupportedScheme(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_loopback_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(&buf).await.unwrap();
        });

        let connector = TcpConnector::new().connect_timeout(Duration::from_secs(5));
        let mut endpoint = connector
            .connect(&uri(&format!("ws://{}/", addr)))
            .await
            .unwrap();

        endpoint.set_nodelay(true).unwrap();
        endpoint.set_idle_timeout(Some(Duration::from_secs(5)));
        assert_eq!(endpoint.remote_addr(), Some(addr));

        endpoint.write_all(b"ping").await.unwrap();
        endpoint.flush().await.unwrap();
        let mut buf = [0u8; 4];
        let mut read = 0;
        while read < buf.len() {
            read += endpoint.read(&mut buf[read..]).await.unwrap();
        }
        assert_eq!(&buf, b"ping");

        server.await.unwrap();
        endpoint.close().await.unwrap();
        assert!(!endpoint.is_open());
        assert!(endpoint.read(&mut buf).await.is_err());
    }

    #[tokio::test]
    async fn test_idle_timeout_expires_reads() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { listener.accept().await.unwrap() });

        let stream = TcpStream::connect(addr).await.unwrap();
        let _peer = server.await.unwrap();
        let mut endpoint = TcpEndpoint::from_tokio(stream);
        endpoint.set_idle_timeout(Some(Duration::from_millis(20)));

        let mut buf = [0u8; 1];
        let err = endpoint.read(&mut buf).await.unwrap_err();
        match err {
            wsbind_core::Error::Transport(TransportError::Io(e)) => {
                assert_eq!(e.kind(), io::ErrorKind::TimedOut)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = TcpConnector::new()
            .connect(&uri(&format!("ws://{}/", addr)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            wsbind_core::Error::Transport(TransportError::Connect(_))
        ));
    }
}
