//! # Domain Value Objects
//!
//! Immutable value types that represent concepts in the layer validation domain.
//! Value objects are defined by their attributes rather than identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written wherever a credential would otherwise appear
pub const REDACTED_TOKEN: &str = "[TOKEN]";

/// Name of an imagery layer as it appears in the catalog
///
/// Never mutated after being read; used both to classify the layer and as the
/// key of its probe result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerName(String);

impl LayerName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part of the name before the first `_`, or the whole name without one
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for LayerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// API token appended to probe URLs
///
/// The secret never shows up in `Debug` output; anything that leaves the
/// process should go through [`Credential::redact`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank tokens so an empty env var means "no credential"
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Form-encoded secret as it appears inside a query string
    #[must_use]
    pub fn encoded(&self) -> String {
        url::form_urlencoded::byte_serialize(self.0.as_bytes()).collect()
    }

    /// Replaces every occurrence of the secret, raw or encoded, with [`REDACTED_TOKEN`]
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        let redacted = text.replace(&self.0, REDACTED_TOKEN);
        let encoded = self.encoded();
        if encoded == self.0 {
            redacted
        } else {
            redacted.replace(&encoded, REDACTED_TOKEN)
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&REDACTED_TOKEN).finish()
    }
}

/// Redacts `text` when a credential is configured, otherwise returns it untouched
#[must_use]
pub fn redact_with(credential: Option<&Credential>, text: &str) -> String {
    match credential {
        Some(credential) => credential.redact(text),
        None => text.to_string(),
    }
}
