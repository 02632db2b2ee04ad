//! Per-connection message handlers
//!
//! A [`HandlerFactory`] turns the caller's opaque payload into a
//! [`MessageHandler`] once per handshake attempt. The handler is told about
//! the finished request and response before it receives the upgraded
//! endpoint, and only then sees messages.
//!
//! The bundled [`ListenerHandlerFactory`] dispatches on the payload's declared
//! [`MessageCapability`] rather than inspecting its type at runtime.

use crate::view::{HandshakeRequestView, HandshakeResponseView};
use bytes::Bytes;
use std::fmt;
use wsbind_core::{Endpoint, Error, RejectReason, Result};

/// A complete data message delivered after the upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// UTF-8 text message
    Text(String),
    /// Binary message
    Binary(Bytes),
}

/// Kinds of data messages a handler can consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCapability {
    /// Text messages only
    Text,
    /// Binary messages only
    Binary,
    /// Both text and binary messages
    TextAndBinary,
}

impl MessageCapability {
    /// Returns `true` if text messages are accepted
    pub fn accepts_text(self) -> bool {
        matches!(self, MessageCapability::Text | MessageCapability::TextAndBinary)
    }

    /// Returns `true` if binary messages are accepted
    pub fn accepts_binary(self) -> bool {
        matches!(self, MessageCapability::Binary | MessageCapability::TextAndBinary)
    }

    /// Returns `true` if `message` is accepted
    pub fn accepts(self, message: &Message) -> bool {
        match message {
            Message::Text(_) => self.accepts_text(),
            Message::Binary(_) => self.accepts_binary(),
        }
    }
}

/// Handler bound to one upgraded connection
///
/// The binder calls `set_upgrade_request`, then `set_upgrade_response`, then
/// `upgrade`, each exactly once. Returning an error from either setter fails
/// the whole handshake; `upgrade` is then never called.
pub trait MessageHandler: Send + fmt::Debug {
    /// Message kinds this handler consumes
    fn capability(&self) -> MessageCapability;

    /// Adjust transport-level settings before any handshake bytes are sent
    fn configure_endpoint(
        &mut self,
        _request: &HandshakeRequestView,
        _endpoint: &mut dyn Endpoint,
    ) -> Result<()> {
        Ok(())
    }

    /// Receive the finished handshake request
    fn set_upgrade_request(&mut self, request: HandshakeRequestView) -> Result<()>;

    /// Receive the server's handshake response
    fn set_upgrade_response(&mut self, response: HandshakeResponseView) -> Result<()>;

    /// Take ownership of the upgraded endpoint
    fn upgrade(&mut self, endpoint: Box<dyn Endpoint>);

    /// Handle one data message
    fn on_message(&mut self, message: Message) -> Result<()>;

    /// Request view, once set
    fn upgrade_request(&self) -> Option<&HandshakeRequestView>;

    /// Response view, once set
    fn upgrade_response(&self) -> Option<&HandshakeResponseView>;

    /// Give up the endpoint, e.g. to hand it to a frame codec
    fn take_endpoint(&mut self) -> Option<Box<dyn Endpoint>>;
}

/// Builds one handler per handshake attempt from an opaque payload
///
/// Factories may be shared between concurrent attempts.
pub trait HandlerFactory<P>: Send + Sync {
    /// Create the handler for one attempt
    fn new_handler(&self, payload: P) -> Result<Box<dyn MessageHandler>>;
}

impl<P, F> HandlerFactory<P> for F
where
    F: Fn(P) -> Result<Box<dyn MessageHandler>> + Send + Sync,
{
    fn new_handler(&self, payload: P) -> Result<Box<dyn MessageHandler>> {
        self(payload)
    }
}

/// Application callbacks for a WebSocket connection
///
/// This is the payload handed to [`ListenerHandlerFactory`].
pub trait WebSocketListener: Send + 'static {
    /// Message kinds this listener wants
    fn capability(&self) -> MessageCapability;

    /// Adjust the endpoint before the handshake is sent
    fn configure_endpoint(
        &mut self,
        _request: &HandshakeRequestView,
        _endpoint: &mut dyn Endpoint,
    ) -> Result<()> {
        Ok(())
    }

    /// Accept or refuse the negotiated parameters
    fn on_handshake(
        &mut self,
        _request: &HandshakeRequestView,
        _response: &HandshakeResponseView,
    ) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Called once the connection is upgraded
    fn on_open(&mut self) {}

    /// Called for each text message
    fn on_text(&mut self, _text: &str) {}

    /// Called for each binary message
    fn on_binary(&mut self, _data: &[u8]) {}
}

/// Handler variant chosen from a listener's capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Dispatches text messages only
    Text,
    /// Dispatches binary messages only
    Binary,
    /// Dispatches both
    Duplex,
}

impl From<MessageCapability> for HandlerKind {
    fn from(capability: MessageCapability) -> Self {
        match capability {
            MessageCapability::Text => HandlerKind::Text,
            MessageCapability::Binary => HandlerKind::Binary,
            MessageCapability::TextAndBinary => HandlerKind::Duplex,
        }
    }
}

impl HandlerKind {
    fn capability(self) -> MessageCapability {
        match self {
            HandlerKind::Text => MessageCapability::Text,
            HandlerKind::Binary => MessageCapability::Binary,
            HandlerKind::Duplex => MessageCapability::TextAndBinary,
        }
    }
}

/// [`MessageHandler`] that forwards to a [`WebSocketListener`]
pub struct ListenerHandler {
    kind: HandlerKind,
    listener: Box<dyn WebSocketListener>,
    request: Option<HandshakeRequestView>,
    response: Option<HandshakeResponseView>,
    endpoint: Option<Box<dyn Endpoint>>,
    upgraded: bool,
}

impl ListenerHandler {
    /// Wrap a listener, choosing the variant from its declared capability
    pub fn new(listener: Box<dyn WebSocketListener>) -> Self {
        Self {
            kind: HandlerKind::from(listener.capability()),
            listener,
            request: None,
            response: None,
            endpoint: None,
            upgraded: false,
        }
    }

    /// Variant chosen for this listener
    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// Returns `true` once the endpoint has been handed over, even if it
    /// was taken again afterwards
    pub fn is_upgraded(&self) -> bool {
        self.upgraded
    }
}

impl fmt::Debug for ListenerHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandler")
            .field("kind", &self.kind)
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .field("endpoint", &self.endpoint)
            .field("upgraded", &self.upgraded)
            .finish()
    }
}

impl MessageHandler for ListenerHandler {
    fn capability(&self) -> MessageCapability {
        self.kind.capability()
    }

    fn configure_endpoint(
        &mut self,
        request: &HandshakeRequestView,
        endpoint: &mut dyn Endpoint,
    ) -> Result<()> {
        self.listener.configure_endpoint(request, endpoint)
    }

    fn set_upgrade_request(&mut self, request: HandshakeRequestView) -> Result<()> {
        self.request = Some(request);
        Ok(())
    }

    fn set_upgrade_response(&mut self, response: HandshakeResponseView) -> Result<()> {
        let request = self
            .request
            .as_ref()
            .ok_or(Error::IllegalState("upgrade response set before request"))?;
        self.listener
            .on_handshake(request, &response)
            .map_err(RejectReason::Handler)?;
        self.response = Some(response);
        Ok(())
    }

    fn upgrade(&mut self, endpoint: Box<dyn Endpoint>) {
        self.endpoint = Some(endpoint);
        self.upgraded = true;
        self.listener.on_open();
    }

    fn on_message(&mut self, message: Message) -> Result<()> {
        if !self.upgraded {
            return Err(Error::IllegalState("message dispatched before upgrade"));
        }
        match (self.kind, message) {
            (HandlerKind::Text | HandlerKind::Duplex, Message::Text(text)) => {
                self.listener.on_text(&text);
                Ok(())
            }
            (HandlerKind::Binary | HandlerKind::Duplex, Message::Binary(data)) => {
                self.listener.on_binary(&data);
                Ok(())
            }
            (HandlerKind::Binary, Message::Text(_)) => {
                Err(Error::IllegalState("text message sent to a binary-only handler"))
            }
            (HandlerKind::Text, Message::Binary(_)) => {
                Err(Error::IllegalState("binary message sent to a text-only handler"))
            }
        }
    }

    fn upgrade_request(&self) -> Option<&HandshakeRequestView> {
        self.request.as_ref()
    }

    fn upgrade_response(&self) -> Option<&HandshakeResponseView> {
        self.response.as_ref()
    }

    fn take_endpoint(&mut self) -> Option<Box<dyn Endpoint>> {
        self.endpoint.take()
    }
}

/// Factory producing a [`ListenerHandler`] for any [`WebSocketListener`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerHandlerFactory;

impl<L: WebSocketListener> HandlerFactory<L> for ListenerHandlerFactory {
    fn new_handler(&self, payload: L) -> Result<Box<dyn MessageHandler>> {
        Ok(Box::new(ListenerHandler::new(Box::new(payload))))
    }
}
