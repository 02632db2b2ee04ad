//! wsbind Client
//!
//! Client side of the WebSocket opening handshake: turns a caller's
//! [`UpgradeRequestTemplate`] into an HTTP/1.1 upgrade request, drives the
//! exchange over a pluggable [`Connector`](wsbind_core::Connector), and binds
//! the upgraded connection to a per-connection [`MessageHandler`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wsbind_client::prelude::*;
//!
//! #[derive(Debug)]
//! struct Echo;
//!
//! impl WebSocketListener for Echo {
//!     fn capability(&self) -> MessageCapability {
//!         MessageCapability::Text
//!     }
//!
//!     fn on_text(&mut self, text: &str) {
//!         println!("received {text}");
//!     }
//! }
//!
//! # #[cfg(feature = "transport-tcp")]
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let client = WebSocketClient::builder().with_tcp().build()?;
//!     let template = UpgradeRequestTemplate::new()
//!         .header("Authorization", "Bearer token")
//!         .sub_protocol("chat");
//!
//!     let session = client
//!         .connect(Some(&template), "ws://127.0.0.1:9000/ws", &ListenerHandlerFactory, Echo)
//!         .await?;
//!     println!("negotiated {:?}", session.subprotocol());
//!     Ok(())
//! }
//! # #[cfg(not(feature = "transport-tcp"))]
//! # fn main() {}
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wsbind-client/")]

// Public modules
pub mod client;
pub mod config;
pub mod handler;
pub mod logging;
pub mod request;
pub mod template;
pub mod transport;
pub mod upgrade;
pub mod view;

// Prelude module
pub mod prelude;

// Re-export key types for convenience
pub use client::{ClientBuilder, WebSocketClient};
pub use config::ClientConfig;
pub use handler::{
    HandlerFactory, HandlerKind, ListenerHandler, ListenerHandlerFactory, Message,
    MessageCapability, MessageHandler, WebSocketListener,
};
pub use logging::init_logging;
pub use request::OutboundHandshakeRequest;
pub use template::UpgradeRequestTemplate;
pub use transport::{CancelHandle, UpgradeError, UpgradeHooks};
pub use upgrade::{ClientUpgradeRequest, UpgradeState, UpgradedSession};
pub use view::{HandshakeRequestView, HandshakeResponseView};
