//! WebSocket extension configuration
//!
//! An [`ExtensionConfig`] is a name plus ordered parameters, as carried by the
//! `Sec-WebSocket-Extensions` header (RFC 6455 section 9.1). No negotiation
//! happens here; offers and acceptances are opaque ordered lists.

use std::fmt;
use std::str::FromStr;

/// A named, parameterized extension offer or acceptance
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtensionConfig {
    name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    parameters: Vec<(String, Option<String>)>,
}

impl ExtensionConfig {
    /// Create an extension config without parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Create an extension config from a name and parameter list
    pub fn with_parameters<I, K>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Add a parameter with a value
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), Some(value.into())));
        self
    }

    /// Add a valueless parameter
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.parameters.push((name.into(), None));
        self
    }

    /// Extension name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in order
    pub fn parameters(&self) -> &[(String, Option<String>)] {
        &self.parameters
    }

    /// Look up a parameter; `Some(None)` means present without a value
    pub fn parameter(&self, name: &str) -> Option<Option<&str>> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref())
    }
}

impl fmt::Display for ExtensionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (name, value) in &self.parameters {
            match value {
                Some(value) => write!(f, "; {}={}", name, value)?,
                None => write!(f, "; {}", name)?,
            }
        }
        Ok(())
    }
}

/// Error parsing an extension header element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseExtensionError(pub String);

impl fmt::Display for ParseExtensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid extension: {:?}", self.0)
    }
}

impl std::error::Error for ParseExtensionError {}

impl FromStr for ExtensionConfig {
    type Err = ParseExtensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(';').map(str::trim);
        let name = parts
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ParseExtensionError(s.to_string()))?;

        let mut config = ExtensionConfig::new(name);
        for part in parts.filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((key, value)) => {
                    let value = value.trim().trim_matches('"');
                    config.parameters.push((key.trim().to_string(), Some(value.to_string())));
                }
                None => config.parameters.push((part.to_string(), None)),
            }
        }
        Ok(config)
    }
}

/// Render an ordered list as a single `Sec-WebSocket-Extensions` value
pub fn format_extensions(extensions: &[ExtensionConfig]) -> String {
    extensions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse every element of one or more `Sec-WebSocket-Extensions` values
pub fn parse_extensions<'a, I>(values: I) -> Result<Vec<ExtensionConfig>, ParseExtensionError>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_display() {
        let ext = ExtensionConfig::new("permessage-deflate")
            .flag("client_no_context_takeover")
            .param("server_max_window_bits", "10");
        assert_eq!(
            ext.to_string(),
            "permessage-deflate; client_no_context_takeover; server_max_window_bits=10"
        );
    }

    #[test]
    fn test_extension_parse() {
        let ext: ExtensionConfig = "permessage-deflate; client_max_window_bits=\"15\"; x"
            .parse()
            .unwrap();
        assert_eq!(ext.name(), "permessage-deflate");
        assert_eq!(ext.parameter("client_max_window_bits"), Some(Some("15")));
        assert_eq!(ext.parameter("x"), Some(None));
        assert_eq!(ext.parameter("missing"), None);
    }

    #[test]
    fn test_parse_extension_list_keeps_order() {
        let list = parse_extensions(["foo, bar; a=1", "baz"]).unwrap();
        let names: Vec<_> = list.iter().map(ExtensionConfig::name).collect();
        assert_eq!(names, vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_empty_extension_name_rejected() {
        assert!("; a=1".parse::<ExtensionConfig>().is_err());
    }
}
