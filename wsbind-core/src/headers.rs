//! Ordered, multi-valued HTTP header list
//!
//! `http::HeaderMap` does not promise insertion order across names, and the
//! handshake must reproduce the caller's header order exactly, so headers are
//! kept as a plain list of validated name/value pairs.

use crate::error::TemplateError;
use http::header::{HeaderName, HeaderValue};

/// Ordered list of header fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    fields: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderFields {
    /// Create an empty header list
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a header name
    pub fn parse_name(name: &str) -> Result<HeaderName, TemplateError> {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TemplateError::InvalidHeaderName(name.to_string()))
    }

    /// Validate a header value for the given header
    ///
    /// Only visible ASCII, spaces and tabs are accepted. `HeaderValue` alone
    /// would also take obs-text bytes, which `get` could not return as `&str`.
    pub fn parse_value(name: &HeaderName, value: &str) -> Result<HeaderValue, TemplateError> {
        HeaderValue::from_str(value)
            .ok()
            .filter(|v| v.to_str().is_ok())
            .ok_or_else(|| TemplateError::InvalidHeaderValue {
                header: name.as_str().to_string(),
            })
    }

    /// Append a field after all existing ones
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        self.fields.push((name, value));
    }

    /// Validate and append a field
    pub fn try_append(&mut self, name: &str, value: &str) -> Result<(), TemplateError> {
        let name = Self::parse_name(name)?;
        let value = Self::parse_value(&name, value)?;
        self.append(name, value);
        Ok(())
    }

    /// Replace every field named `name` with `values`, appended in order
    pub fn put<I>(&mut self, name: HeaderName, values: I)
    where
        I: IntoIterator<Item = HeaderValue>,
    {
        self.remove(&name);
        for value in values {
            self.fields.push((name.clone(), value));
        }
    }

    /// Remove every field named `name`, returning how many were removed
    pub fn remove(&mut self, name: &HeaderName) -> usize {
        let before = self.fields.len();
        self.fields.retain(|(n, _)| n != name);
        before - self.fields.len()
    }

    /// First value of `name` as a string, if it is visible ASCII
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    /// Every value of `name` that is visible ASCII, in order
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        // Stored names are lowercase.
        let name = name.to_ascii_lowercase();
        self.fields
            .iter()
            .filter(move |(n, _)| n.as_str() == name)
            .filter_map(|(_, v)| v.to_str().ok())
    }

    /// Returns `true` if at least one field is named `name`
    pub fn contains(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
    }

    /// Iterate over all fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.fields.iter().map(|(n, v)| (n, v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a HeaderFields {
    type Item = &'a (HeaderName, HeaderValue);
    type IntoIter = std::slice::Iter<'a, (HeaderName, HeaderValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let mut fields = HeaderFields::new();
        fields.try_append("X-A", "1").unwrap();
        fields.try_append("X-B", "2").unwrap();
        fields.try_append("x-a", "3").unwrap();

        let names: Vec<_> = fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["x-a", "x-b", "x-a"]);
        assert_eq!(fields.get_all("X-A").collect::<Vec<_>>(), vec!["1", "3"]);
    }

    #[test]
    fn test_put_replaces_all_values() {
        let mut fields = HeaderFields::new();
        fields.try_append("User-Agent", "default").unwrap();
        fields.try_append("Accept", "*/*").unwrap();

        let name = HeaderFields::parse_name("user-agent").unwrap();
        fields.put(name, vec![HeaderValue::from_static("custom")]);

        assert_eq!(fields.get("User-Agent"), Some("custom"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut fields = HeaderFields::new();
        let err = fields.try_append("bad name", "x").unwrap_err();
        assert_eq!(err, TemplateError::InvalidHeaderName("bad name".to_string()));
    }

    #[test]
    fn test_invalid_value_rejected() {
        let mut fields = HeaderFields::new();
        assert!(fields.try_append("X-Test", "line\nbreak").is_err());
        assert!(fields.is_empty());
    }

    #[test]
    fn test_non_ascii_value_rejected() {
        let mut fields = HeaderFields::new();
        let err = fields.try_append("X-Name", "café").unwrap_err();
        assert_eq!(
            err,
            TemplateError::InvalidHeaderValue {
                header: "x-name".to_string()
            }
        );
        assert!(fields.is_empty());

        fields.try_append("X-Name", "tab\tand space").unwrap();
        assert_eq!(fields.get("x-name"), Some("tab\tand space"));
    }

    #[test]
    fn test_lookup_outlives_name() {
        let mut fields = HeaderFields::new();
        fields.try_append("X-A", "1").unwrap();
        fields.try_append("X-A", "2").unwrap();

        let (first, all) = {
            let name = String::from("X-A");
            (fields.get(&name), fields.get_all(&name).collect::<Vec<_>>())
        };
        assert_eq!(first, Some("1"));
        assert_eq!(all, vec!["1", "2"]);
    }
}
