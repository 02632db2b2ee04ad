//! Prelude module for wsbind Core
//!
//! This module re-exports commonly used types and traits to make them
//! easily accessible for users of the library.

pub use crate::cookie::Cookie;
pub use crate::error::{Error, RejectReason, Result, TemplateError, TransportError};
pub use crate::extension::ExtensionConfig;
pub use crate::handshake::HandshakeResponse;
pub use crate::headers::HeaderFields;
pub use crate::transport::{Connector, Endpoint};

// Re-export commonly used external dependencies
pub use bytes::{Bytes, BytesMut};
pub use http::Uri;
