//! TCP Transport for wsbind
//!
//! Plain TCP [`Connector`](wsbind_core::Connector) and
//! [`Endpoint`](wsbind_core::Endpoint) implementations over tokio.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wsbind-transport-tcp/")]

pub mod tcp;

// Re-export TCP transport types
pub use tcp::{TcpConnector, TcpEndpoint};

/// Prelude module
pub mod prelude {
    pub use crate::tcp::{TcpConnector, TcpEndpoint};
    pub use wsbind_core::transport::{Connector, Endpoint};
}
