//! OpenRouter API key wrapper.
//!
//! Backed by `secrecy`; formatting never reveals the key. The raw value is
//! only read to build the `Authorization` header.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// An API key that prints as `[REDACTED]`.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// The raw key.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.expose().trim())
    }

    /// Empty or whitespace-only keys are treated as missing.
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

// SecretBox<str> is not Clone
impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

const REDACTED: &str = "[REDACTED]";

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretString").field(&REDACTED).finish()
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_never_formatted() {
        let key = SecretString::new("sk-or-v1-abcdef");

        assert_eq!(key.to_string(), "[REDACTED]");
        let debug = format!("{:?}", Some(key.clone()));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-or"));
    }

    #[test]
    fn test_bearer_header() {
        let key: SecretString = " sk-or-v1-abcdef\n".into();
        assert_eq!(key.bearer(), "Bearer sk-or-v1-abcdef");
        assert_eq!(key.expose(), " sk-or-v1-abcdef\n");
    }

    #[test]
    fn test_blank_keys() {
        assert!(SecretString::new("").is_blank());
        assert!(SecretString::new(" \t").is_blank());
        assert!(!SecretString::new("k").is_blank());
    }
}
