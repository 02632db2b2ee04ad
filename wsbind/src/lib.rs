//! # wsbind
//!
//! **Client-side WebSocket upgrade handshake adapter**
//!
//! wsbind turns a protocol-agnostic upgrade request description (target URI,
//! headers, cookies, sub-protocols, extensions, timeout) into an HTTP/1.1
//! upgrade exchange, and once the server answers `101 Switching Protocols`
//! binds the live connection to a per-connection message handler.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wsbind::prelude::*;
//!
//! struct Printer;
//!
//! impl WebSocketListener for Printer {
//!     fn capability(&self) -> MessageCapability {
//!         MessageCapability::TextAndBinary
//!     }
//!
//!     fn on_text(&mut self, text: &str) {
//!         println!("text: {text}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let client = WebSocketClient::builder()
//!         .connector(TcpConnector::new())
//!         .handshake_timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let template = UpgradeRequestTemplate::new()
//!         .cookie(Cookie::new("session", "abc"))
//!         .sub_protocol("chat");
//!
//!     let mut session = client
//!         .connect(Some(&template), "ws://127.0.0.1:9000/ws", &ListenerHandlerFactory, Printer)
//!         .await?;
//!     session.dispatch(Message::Text("hello".into()))?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wsbind/")]

// Re-export core components
pub use wsbind_core::*;

#[cfg(feature = "transport-tcp")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport-tcp")))]
pub use wsbind_transport_tcp as transport_tcp;

#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub use wsbind_client as client;

/// Prelude module with common imports
pub mod prelude {
    pub use wsbind_core::prelude::*;

    #[cfg(feature = "client")]
    pub use wsbind_client::prelude::*;

    #[cfg(feature = "transport-tcp")]
    pub use wsbind_transport_tcp::prelude::*;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_crate_name() {
        assert_eq!(env!("CARGO_PKG_NAME"), "wsbind");
    }
}
