//! Client upgrade requests and handler binding
//!
//! A [`ClientUpgradeRequest`] ties one outbound handshake request to the
//! message handler built for it. It implements [`UpgradeHooks`]: at
//! customization it runs the base endpoint setup and then the handler's own,
//! and at upgrade it binds the handler to fresh request and response views
//! before handing over the endpoint.

use crate::client::WebSocketClient;
use crate::handler::{HandlerFactory, Message, MessageHandler};
use crate::request::OutboundHandshakeRequest;
use crate::template::UpgradeRequestTemplate;
use crate::transport::{
    complete_upgrade, customize_endpoint, perform_upgrade, CancelHandle, UpgradeError,
    UpgradeHooks,
};
use crate::view::{HandshakeRequestView, HandshakeResponseView};
use crate::{log_debug, log_info};
use std::sync::Arc;
use wsbind_core::{Endpoint, Error, ExtensionConfig, HandshakeResponse, RejectReason, Result};

/// Lifecycle of one upgrade attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeState {
    /// Built, not yet connected
    Created,
    /// Endpoint customized, waiting for the response
    Customized,
    /// Handler bound and endpoint handed over
    Upgraded,
    /// Attempt failed; the handler is discarded
    Failed,
}

/// An upgradeable client request bound to its message handler
#[derive(Debug)]
pub struct ClientUpgradeRequest {
    client: WebSocketClient,
    request: Arc<OutboundHandshakeRequest>,
    handler: Box<dyn MessageHandler>,
    state: UpgradeState,
    cancel: CancelHandle,
    response: Option<Arc<HandshakeResponse>>,
}

impl ClientUpgradeRequest {
    /// Build the request for `uri` and create its handler
    ///
    /// The request is built before the factory runs, so a malformed template
    /// fails without creating a handler.
    pub fn new<P, F>(
        client: &WebSocketClient,
        template: Option<&UpgradeRequestTemplate>,
        uri: &str,
        factory: &F,
        payload: P,
    ) -> Result<Self>
    where
        F: HandlerFactory<P> + ?Sized,
    {
        let request = OutboundHandshakeRequest::build(template, uri, client.config())?;
        let handler = factory.new_handler(payload)?;

        Ok(Self {
            client: client.clone(),
            request: Arc::new(request),
            handler,
            state: UpgradeState::Created,
            cancel: CancelHandle::new(),
            response: None,
        })
    }

    /// Fresh view over the outbound request
    pub fn request_view(&self) -> HandshakeRequestView {
        HandshakeRequestView::new(Arc::clone(&self.request))
    }

    /// Handle that cancels this attempt
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> UpgradeState {
        self.state
    }

    /// Handler that frames are dispatched to
    pub fn frame_handler(&self) -> &dyn MessageHandler {
        self.handler.as_ref()
    }

    /// Mutable access to the bound handler
    pub fn frame_handler_mut(&mut self) -> &mut dyn MessageHandler {
        self.handler.as_mut()
    }

    /// Connect, perform the handshake and bind the handler
    #[cfg_attr(
        feature = "logging",
        tracing::instrument(skip(self), fields(uri = %self.request.uri()))
    )]
    pub async fn send(mut self) -> Result<UpgradedSession> {
        if self.state != UpgradeState::Created {
            return Err(Error::IllegalState("upgrade request already sent"));
        }

        #[cfg(feature = "metrics")]
        metrics::counter!("wsbind_handshake_attempts_total").increment(1);

        let client = self.client.clone();
        let cancel = self.cancel.clone();
        let result = perform_upgrade(client.connector(), client.config(), &mut self, &cancel).await;

        match result {
            Ok(()) => {
                log_info!("WebSocket upgrade to {} completed", self.request.uri());
                #[cfg(feature = "metrics")]
                metrics::counter!("wsbind_handshake_success_total").increment(1);
                UpgradedSession::from_request(self)
            }
            Err(e) => {
                log_debug!("WebSocket upgrade to {} failed: {}", self.request.uri(), e);
                #[cfg(feature = "metrics")]
                metrics::counter!("wsbind_handshake_failures_total", "kind" => e.kind())
                    .increment(1);
                self.state = UpgradeState::Failed;
                Err(e)
            }
        }
    }

    fn fail(&mut self, error: Error, endpoint: Box<dyn Endpoint>) -> UpgradeError {
        self.state = UpgradeState::Failed;
        UpgradeError::new(error, endpoint)
    }
}

impl UpgradeHooks for ClientUpgradeRequest {
    fn request(&self) -> &Arc<OutboundHandshakeRequest> {
        &self.request
    }

    fn on_customize(&mut self, endpoint: &mut dyn Endpoint) -> Result<()> {
        if self.state != UpgradeState::Created {
            return Err(Error::IllegalState("endpoint already customized"));
        }
        self.state = UpgradeState::Customized;

        customize_endpoint(self.client.config(), endpoint)?;
        let request = self.request_view();
        self.handler.configure_endpoint(&request, endpoint)
    }

    fn on_upgrade(
        &mut self,
        response: HandshakeResponse,
        endpoint: Box<dyn Endpoint>,
    ) -> std::result::Result<(), UpgradeError> {
        match self.state {
            UpgradeState::Customized => {}
            UpgradeState::Created => {
                return Err(UpgradeError::new(
                    Error::IllegalState("upgrade before endpoint customization"),
                    endpoint,
                ))
            }
            UpgradeState::Upgraded | UpgradeState::Failed => {
                return Err(UpgradeError::new(
                    Error::IllegalState("upgrade already completed"),
                    endpoint,
                ))
            }
        }

        if self.cancel.is_cancelled() {
            return Err(self.fail(Error::Cancelled, endpoint));
        }
        if !response.is_switching_protocols() {
            let error = RejectReason::UnexpectedStatus(response.status).into();
            return Err(self.fail(error, endpoint));
        }

        let response = Arc::new(response);
        if let Err(e) = self.handler.set_upgrade_request(self.request_view()) {
            return Err(self.fail(handler_rejection(e), endpoint));
        }
        let response_view = HandshakeResponseView::new(Arc::clone(&response));
        if let Err(e) = self.handler.set_upgrade_response(response_view) {
            return Err(self.fail(handler_rejection(e), endpoint));
        }

        self.response = Some(response);
        self.state = UpgradeState::Upgraded;
        complete_upgrade(self.handler.as_mut(), endpoint);
        Ok(())
    }
}

/// Handler errors surface as a rejected handshake unless they already say why
fn handler_rejection(error: Error) -> Error {
    match error {
        Error::HandshakeRejected(_) | Error::Cancelled => error,
        other => RejectReason::Handler(other.to_string()).into(),
    }
}

/// A completed upgrade: the bound handler plus what was negotiated
#[derive(Debug)]
pub struct UpgradedSession {
    handler: Box<dyn MessageHandler>,
    request: Arc<OutboundHandshakeRequest>,
    response: Arc<HandshakeResponse>,
}

impl UpgradedSession {
    fn from_request(upgrade: ClientUpgradeRequest) -> Result<Self> {
        let response = upgrade
            .response
            .ok_or(Error::IllegalState("upgrade finished without a response"))?;
        Ok(Self {
            handler: upgrade.handler,
            request: upgrade.request,
            response,
        })
    }

    /// The bound handler
    pub fn handler(&self) -> &dyn MessageHandler {
        self.handler.as_ref()
    }

    /// Mutable access to the bound handler
    pub fn handler_mut(&mut self) -> &mut dyn MessageHandler {
        self.handler.as_mut()
    }

    /// Unwrap into the bound handler
    pub fn into_handler(self) -> Box<dyn MessageHandler> {
        self.handler
    }

    /// Fresh view over the request that was sent
    pub fn request_view(&self) -> HandshakeRequestView {
        HandshakeRequestView::new(Arc::clone(&self.request))
    }

    /// Fresh view over the server's response
    pub fn response_view(&self) -> HandshakeResponseView {
        HandshakeResponseView::new(Arc::clone(&self.response))
    }

    /// Sub-protocol selected by the server
    pub fn subprotocol(&self) -> Option<&str> {
        self.response.subprotocol()
    }

    /// Extensions accepted by the server
    pub fn extensions(&self) -> Vec<ExtensionConfig> {
        self.response.extensions().unwrap_or_default()
    }

    /// Deliver one decoded message to the handler
    pub fn dispatch(&mut self, message: Message) -> Result<()> {
        if !self.handler.capability().accepts(&message) {
            return Err(Error::IllegalState("handler does not accept this message type"));
        }
        self.handler.on_message(message)
    }
}
