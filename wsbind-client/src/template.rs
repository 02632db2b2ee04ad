//! Caller-supplied upgrade request templates
//!
//! A template describes what the caller wants on the handshake request
//! without knowing anything about the transport. The builder only ever
//! borrows it, so one template can seed many attempts.

use std::time::Duration;
use wsbind_core::{Cookie, ExtensionConfig};

/// Protocol-agnostic description of an upgrade request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UpgradeRequestTemplate {
    headers: Vec<(String, Vec<String>)>,
    cookies: Vec<Cookie>,
    sub_protocols: Vec<String>,
    extensions: Vec<ExtensionConfig>,
    timeout: Option<Duration>,
}

impl UpgradeRequestTemplate {
    /// Create an empty template
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header value
    ///
    /// Values for a name that is already present (compared
    /// case-insensitively) are appended to that entry, so the entry keeps its
    /// original position.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some((_, values)) => values.push(value),
            None => self.headers.push((name, vec![value])),
        }
        self
    }

    /// Replace every value of a header
    pub fn set_header<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some((_, existing)) => *existing = values,
            None => self.headers.push((name, values)),
        }
        self
    }

    /// Add a cookie
    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Offer a sub-protocol, appended in preference order
    pub fn sub_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.sub_protocols.push(protocol.into());
        self
    }

    /// Replace the offered sub-protocols
    pub fn sub_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// Offer an extension
    pub fn extension(mut self, extension: ExtensionConfig) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Set the handshake timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Headers in insertion order, each with all of its values
    pub fn headers(&self) -> &[(String, Vec<String>)] {
        &self.headers
    }

    /// Cookies in insertion order
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Offered sub-protocols in preference order
    pub fn offered_sub_protocols(&self) -> &[String] {
        &self.sub_protocols
    }

    /// Offered extensions in order
    pub fn extensions(&self) -> &[ExtensionConfig] {
        &self.extensions
    }

    /// Handshake timeout, if set
    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
