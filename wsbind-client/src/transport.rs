//! HTTP/1.1 upgrade transport
//!
//! Drives one handshake attempt over any [`Connector`]: connect, customize,
//! send the request head, read the response head, validate it and hand the
//! endpoint to the [`UpgradeHooks`]. The hooks are the only place the
//! transport calls back into the caller.

use crate::config::ClientConfig;
use crate::handler::MessageHandler;
use crate::request::OutboundHandshakeRequest;
use crate::{log_debug, log_trace};
use bytes::{Bytes, BytesMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use wsbind_core::handshake::{parse_response, validate_response};
use wsbind_core::{
    Connector, Endpoint, Error, HandshakeResponse, RejectReason, Result, Rewind, TransportError,
};

const READ_CHUNK: usize = 1024;

/// Callbacks a transport invokes during one upgrade attempt
///
/// Both hooks are synchronous and must not block.
pub trait UpgradeHooks: Send {
    /// The request to send
    fn request(&self) -> &Arc<OutboundHandshakeRequest>;

    /// Called once the endpoint is connected, before any handshake bytes
    fn on_customize(&mut self, endpoint: &mut dyn Endpoint) -> Result<()>;

    /// Called once with a `101` response and the endpoint to hand off
    fn on_upgrade(
        &mut self,
        response: HandshakeResponse,
        endpoint: Box<dyn Endpoint>,
    ) -> std::result::Result<(), UpgradeError>;
}

/// Failed upgrade, returning the endpoint so the transport can close it
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct UpgradeError {
    /// Error reported to the caller
    #[source]
    pub error: Error,
    /// Endpoint that was not handed off
    pub endpoint: Box<dyn Endpoint>,
}

impl UpgradeError {
    /// Pair an error with the endpoint being returned
    pub fn new(error: Error, endpoint: Box<dyn Endpoint>) -> Self {
        Self { error, endpoint }
    }
}

/// Cancels an in-flight upgrade attempt
///
/// Clones share the same flag. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    /// Create a handle that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Returns `true` once cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Base endpoint customization from the client configuration
pub fn customize_endpoint(config: &ClientConfig, endpoint: &mut dyn Endpoint) -> Result<()> {
    endpoint.set_idle_timeout(config.idle_timeout);
    endpoint.set_nodelay(config.nodelay)
}

/// Base upgrade completion: the handler takes ownership of the endpoint
pub fn complete_upgrade(handler: &mut dyn MessageHandler, endpoint: Box<dyn Endpoint>) {
    handler.upgrade(endpoint);
}

/// Run one upgrade attempt to completion
///
/// Exactly one error is returned on failure, and the endpoint is closed
/// unless it was handed off through [`UpgradeHooks::on_upgrade`].
#[cfg_attr(feature = "logging", tracing::instrument(skip_all))]
pub async fn perform_upgrade<H>(
    connector: &dyn Connector,
    config: &ClientConfig,
    hooks: &mut H,
    cancel: &CancelHandle,
) -> Result<()>
where
    H: UpgradeHooks + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let request = Arc::clone(hooks.request());
    log_debug!("Connecting to {}", request.uri());

    let mut endpoint = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        connected = connector.connect(request.uri()) => connected?,
    };

    if let Err(e) = hooks.on_customize(endpoint.as_mut()) {
        close_quietly(endpoint).await;
        return Err(e);
    }

    let timeout = request.timeout();
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        exchanged = tokio::time::timeout(
            timeout,
            exchange(endpoint.as_mut(), &request, config.max_response_head_size),
        ) => exchanged.unwrap_or(Err(Error::HandshakeTimeout { timeout })),
    };

    let (response, leftover) = match outcome {
        Ok(exchanged) => exchanged,
        Err(e) => {
            log_debug!("Handshake with {} failed: {}", request.uri(), e);
            close_quietly(endpoint).await;
            return Err(e);
        }
    };

    if let Err(reason) = validate_response(
        &response,
        request.key(),
        request.sub_protocols(),
        request.extensions(),
    ) {
        log_debug!("Rejected handshake response: {}", reason);
        close_quietly(endpoint).await;
        return Err(reason.into());
    }

    let endpoint: Box<dyn Endpoint> = if leftover.is_empty() {
        endpoint
    } else {
        log_trace!("Replaying {} bytes received after the response head", leftover.len());
        Box::new(Rewind::new(leftover, endpoint))
    };

    match hooks.on_upgrade(response, endpoint) {
        Ok(()) => Ok(()),
        Err(UpgradeError { error, endpoint }) => {
            close_quietly(endpoint).await;
            Err(error)
        }
    }
}

/// Send the request head and read the response head
///
/// Returns the parsed response and any bytes that followed it.
async fn exchange(
    endpoint: &mut dyn Endpoint,
    request: &OutboundHandshakeRequest,
    max_head_size: usize,
) -> Result<(HandshakeResponse, Bytes)> {
    endpoint.write_all(&request.to_bytes()).await?;
    endpoint.flush().await?;

    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = endpoint.read(&mut chunk).await?;
        if n == 0 {
            return Err(TransportError::Closed.into());
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some((response, consumed)) = parse_response(&buf)? {
            let leftover = buf.split_off(consumed).freeze();
            return Ok((response, leftover));
        }
        if buf.len() > max_head_size {
            return Err(RejectReason::ResponseTooLarge { max: max_head_size }.into());
        }
    }
}

async fn close_quietly(mut endpoint: Box<dyn Endpoint>) {
    if let Err(_e) = endpoint.close().await {
        log_debug!("Error closing endpoint: {}", _e);
    }
}
