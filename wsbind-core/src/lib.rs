//! # wsbind Core
//!
//! Core types for the wsbind client-side WebSocket upgrade handshake adapter.
//!
//! This crate holds everything the handshake needs that is not tied to a
//! particular client:
//!
//! - Error taxonomy and result type
//! - Protocol constants for the opening handshake
//! - Ordered header lists, request cookies and extension configs
//! - Key generation, response parsing and response validation
//! - Endpoint and connector abstractions over the raw transport

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wsbind-core/")]

// Core modules
pub mod cookie;
pub mod error;
pub mod extension;
pub mod handshake;
pub mod headers;
pub mod protocol;
pub mod transport;

// Prelude module with common imports
pub mod prelude;

// Re-export key types for convenience
pub use cookie::Cookie;
pub use error::{Error, RejectReason, Result, TemplateError, TransportError};
pub use extension::ExtensionConfig;
pub use handshake::HandshakeResponse;
pub use headers::HeaderFields;
pub use transport::{Connector, Endpoint, Rewind};
