//! Outcome of probing a single layer

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::value_objects::LayerName;

/// Detail text recorded for timed-out probes
pub const TIMEOUT_DETAIL: &str = "Timeout occurred";

/// HTTP status codes that mark a layer as reachable
pub const VALID_STATUS_CODES: [u16; 2] = [200, 204];

/// Status of a probe: an HTTP status code or one of the transport sentinels
///
/// Serialized as the bare integer code, or as the strings `"TIMEOUT"` / `"ERROR"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStatus {
    Http(u16),
    Timeout,
    Error,
}

impl ProbeStatus {
    #[must_use]
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Http(code) if VALID_STATUS_CODES.contains(&code))
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{code}"),
            Self::Timeout => f.write_str("TIMEOUT"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

impl Serialize for ProbeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Http(code) => serializer.serialize_u16(*code),
            Self::Timeout => serializer.serialize_str("TIMEOUT"),
            Self::Error => serializer.serialize_str("ERROR"),
        }
    }
}

impl<'de> Deserialize<'de> for ProbeStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl Visitor<'_> for StatusVisitor {
            type Value = ProbeStatus;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an HTTP status code or \"TIMEOUT\" / \"ERROR\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                u16::try_from(v)
                    .map(ProbeStatus::Http)
                    .map_err(|_| E::custom(format!("status code {v} out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u16::try_from(v)
                    .map(ProbeStatus::Http)
                    .map_err(|_| E::custom(format!("status code {v} out of range")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                match v {
                    "TIMEOUT" => Ok(ProbeStatus::Timeout),
                    "ERROR" => Ok(ProbeStatus::Error),
                    other => Err(E::unknown_variant(other, &["TIMEOUT", "ERROR"])),
                }
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

/// Result of probing one layer; created once and never modified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub layer: LayerName,
    pub valid: bool,
    pub status_code: ProbeStatus,
    /// Redacted probe URL, or the error description
    #[serde(rename = "url")]
    pub detail: String,
}

impl ProbeResult {
    /// Result for an HTTP response; validity follows from the status code
    #[must_use]
    pub fn from_status(layer: LayerName, code: u16, detail: impl Into<String>) -> Self {
        let status_code = ProbeStatus::Http(code);
        Self {
            layer,
            valid: status_code.is_valid(),
            status_code,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn timeout(layer: LayerName) -> Self {
        Self {
            layer,
            valid: false,
            status_code: ProbeStatus::Timeout,
            detail: TIMEOUT_DETAIL.to_string(),
        }
    }

    #[must_use]
    pub fn error(layer: LayerName, detail: impl Into<String>) -> Self {
        Self {
            layer,
            valid: false,
            status_code: ProbeStatus::Error,
            detail: detail.into(),
        }
    }
}
