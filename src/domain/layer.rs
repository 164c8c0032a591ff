//! Layer classification
//!
//! A layer's type selects which URL pattern applies to it. The type is derived
//! from the layer name every time it is needed and never stored.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::pattern::{DEFAULT_TYPE_KEY, PatternTable};
use super::value_objects::LayerName;

/// Prefix rules consulted when the name prefix is not a table key; first match wins
pub const SPECIAL_CASE_PREFIXES: &[(&str, &str)] = &[
    ("BlueMarble", "BlueMarble"),
    ("Coastlines", "Coastlines"),
    ("Reference", "Reference"),
    ("IMERG", "IMERG"),
    ("TRMM", "TRMM"),
    // PACE instruments
    ("OCI_PACE", "OCI"),
    ("HARP2_PACE", "HARP2"),
    ("SPEXONE_PACE", "SPEXONE"),
    // Geostationary satellites
    ("GOES-", "GOES"),
    ("Himawari", "Himawari"),
];

/// Layers whose names contain any of these are static and probed with the `default` time
pub const TIME_AGNOSTIC_KEYWORDS: &[&str] = &["BlueMarble", "Coastlines", "Reference"];

/// Classification label used to pick a URL pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerType(String);

impl LayerType {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn default_type() -> Self {
        Self(DEFAULT_TYPE_KEY.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_TYPE_KEY
    }

    /// Classifies `layer`: exact prefix key, then special-case prefix, then `DEFAULT`
    #[must_use]
    pub fn classify(layer: &LayerName, table: &PatternTable) -> Self {
        let prefix = layer.prefix();
        if table.contains(prefix) {
            return Self::new(prefix);
        }

        SPECIAL_CASE_PREFIXES
            .iter()
            .find(|(literal, _)| layer.as_str().starts_with(literal))
            .map_or_else(Self::default_type, |(_, key)| Self::new(*key))
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Planetary body the catalog belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    #[default]
    Earth,
    Moon,
    Mars,
}

impl Body {
    /// Fixed type key for bodies that bypass name-based classification
    #[must_use]
    pub const fn fixed_type_key(self) -> Option<&'static str> {
        match self {
            Self::Earth => None,
            Self::Moon => Some("Moon"),
            Self::Mars => Some("Mars"),
        }
    }

    /// Only Earth layers are served with daily time dimensions
    #[must_use]
    pub const fn supports_time(self) -> bool {
        matches!(self, Self::Earth)
    }

    /// Only Earth endpoints expect the API token
    #[must_use]
    pub const fn needs_token(self) -> bool {
        matches!(self, Self::Earth)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earth => "earth",
            Self::Moon => "moon",
            Self::Mars => "mars",
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Body {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "earth" => Ok(Self::Earth),
            "moon" => Ok(Self::Moon),
            "mars" => Ok(Self::Mars),
            other => Err(format!("unknown body '{other}' (expected earth, moon or mars)")),
        }
    }
}

/// Whether the layer is static imagery without a time dimension
#[must_use]
pub fn is_time_agnostic(layer: &LayerName) -> bool {
    TIME_AGNOSTIC_KEYWORDS
        .iter()
        .any(|keyword| layer.as_str().contains(keyword))
}
