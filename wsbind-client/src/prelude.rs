//! Prelude module for wsbind Client
//!
//! This module re-exports commonly used types and traits to make them
//! easily accessible for users of the client library.

pub use crate::client::{ClientBuilder, WebSocketClient};
pub use crate::config::ClientConfig;
pub use crate::handler::{
    HandlerFactory, ListenerHandlerFactory, Message, MessageCapability, MessageHandler,
    WebSocketListener,
};
pub use crate::template::UpgradeRequestTemplate;
pub use crate::transport::CancelHandle;
pub use crate::upgrade::{ClientUpgradeRequest, UpgradedSession};
pub use crate::view::{HandshakeRequestView, HandshakeResponseView};

// Re-export core types for convenience
pub use wsbind_core::prelude::*;

// Re-export commonly used external dependencies
pub use std::time::Duration;
