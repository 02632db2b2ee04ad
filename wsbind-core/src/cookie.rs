//! Request cookies
//!
//! A cookie travels in the handshake as one `Cookie` header value. Only the
//! `name=value` pair goes on the wire; attributes such as `Path` or `Domain`
//! describe where the cookie came from and are kept for callers that inspect
//! the template.

use crate::error::TemplateError;
use std::fmt;
use std::str::FromStr;

/// A single request cookie
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cookie {
    name: String,
    value: String,
    #[cfg_attr(feature = "serde", serde(default))]
    attributes: Vec<(String, String)>,
}

impl Cookie {
    /// Create a cookie without attributes
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute, keeping insertion order
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Cookie name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Cookie attributes in insertion order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Look up an attribute by case-insensitive name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Check the cookie can be sent in a `Cookie` header (RFC 6265 section 4.1.1)
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.name.is_empty() {
            return Err(self.invalid("empty name"));
        }
        if !self.name.bytes().all(is_token_byte) {
            return Err(self.invalid("name is not an HTTP token"));
        }

        let value = self
            .value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(&self.value);
        if !value.bytes().all(is_cookie_octet) {
            return Err(self.invalid("value contains forbidden characters"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &'static str) -> TemplateError {
        TemplateError::InvalidCookie {
            name: self.name.clone(),
            reason,
        }
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl FromStr for Cookie {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s.trim().split_once('=').ok_or(TemplateError::InvalidCookie {
            name: s.trim().to_string(),
            reason: "missing '='",
        })?;
        let cookie = Cookie::new(name.trim(), value.trim());
        cookie.validate()?;
        Ok(cookie)
    }
}

/// Split one `Cookie` header value into its pairs, skipping malformed ones
pub fn parse_cookie_header(value: &str) -> Vec<Cookie> {
    value
        .split(';')
        .filter(|pair| !pair.trim().is_empty())
        .filter_map(|pair| pair.parse().ok())
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}
