//! URL pattern table
//!
//! A pattern table maps a layer type key to the base URL and path template used
//! to build that layer's probe URL. Templates are parsed once, at load time, into
//! literal and placeholder segments; rendering never sees an unknown token.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Type key that must always resolve to a pattern
pub const DEFAULT_TYPE_KEY: &str = "DEFAULT";

/// Built-in fallback used when no pattern table can be read
pub mod builtin {
    pub const BASE_URL: &str = "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best";
    pub const PATH_TEMPLATE: &str =
        "{layer}/default/{time}/GoogleMapsCompatible_Level7/{z}/{y}/{x}.png";
    pub const MAX_ZOOM: u32 = 7;
}

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{([^{}]*)\}").expect("placeholder regex");
}

/// Pattern table validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern '{key}': unknown placeholder '{{{name}}}' in path template")]
    UnknownPlaceholder { key: String, name: String },

    #[error("pattern '{key}': unbalanced brace in path template '{template}'")]
    UnbalancedBrace { key: String, template: String },

    #[error("pattern '{key}': invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { key: String, url: String, reason: String },

    #[error("pattern '{key}': maxZoom must be at least 1")]
    InvalidMaxZoom { key: String },
}

/// Named placeholders a path template may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Layer,
    Time,
    Z,
    Y,
    X,
}

impl Placeholder {
    pub const ALL: [Self; 5] = [Self::Layer, Self::Time, Self::Z, Self::Y, Self::X];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Layer => "layer",
            Self::Time => "time",
            Self::Z => "z",
            Self::Y => "y",
            Self::X => "x",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// Path template split into literal text and placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parses `source`, rejecting unknown placeholders and stray braces.
    /// `key` only labels the error.
    pub fn parse(key: &str, source: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        for caps in PLACEHOLDER_RE.captures_iter(source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_literal(key, source, &source[cursor..whole.start()], &mut segments)?;

            let placeholder =
                Placeholder::from_token(name.as_str()).ok_or_else(|| PatternError::UnknownPlaceholder {
                    key: key.to_string(),
                    name: name.as_str().to_string(),
                })?;
            segments.push(Segment::Placeholder(placeholder));
            cursor = whole.end();
        }
        push_literal(key, source, &source[cursor..], &mut segments)?;

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn contains(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(p) if *p == placeholder))
    }

    /// Substitutes every placeholder with the value returned by `value_of`
    pub fn render<'a, F>(&self, value_of: F) -> String
    where
        F: Fn(Placeholder) -> &'a str,
    {
        let mut out = String::with_capacity(self.source.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => out.push_str(value_of(*p)),
            }
        }
        out
    }
}

fn push_literal(
    key: &str,
    template: &str,
    text: &str,
    segments: &mut Vec<Segment>,
) -> Result<(), PatternError> {
    if text.contains('{') || text.contains('}') {
        return Err(PatternError::UnbalancedBrace {
            key: key.to_string(),
            template: template.to_string(),
        });
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

/// Pattern entry as it appears on disk (`api.json` → `layerTypes`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUrlPattern {
    pub base_url: String,
    pub path_template: String,
    pub max_zoom: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_token: Option<bool>,
}

/// Validated URL pattern for one layer type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPattern {
    base_url: String,
    path_template: PathTemplate,
    max_zoom: u32,
    needs_token: bool,
}

impl UrlPattern {
    pub fn from_raw(key: &str, raw: &RawUrlPattern) -> Result<Self, PatternError> {
        let parsed = url::Url::parse(&raw.base_url).map_err(|e| PatternError::InvalidBaseUrl {
            key: key.to_string(),
            url: raw.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PatternError::InvalidBaseUrl {
                key: key.to_string(),
                url: raw.base_url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if raw.max_zoom == 0 {
            return Err(PatternError::InvalidMaxZoom {
                key: key.to_string(),
            });
        }

        Ok(Self {
            base_url: raw.base_url.clone(),
            path_template: PathTemplate::parse(key, &raw.path_template)?,
            max_zoom: raw.max_zoom,
            needs_token: raw.needs_token.unwrap_or(true),
        })
    }

    /// Built-in GIBS EPSG:3857 pattern
    #[must_use]
    pub fn builtin_default() -> Self {
        Self {
            base_url: builtin::BASE_URL.to_string(),
            path_template: PathTemplate {
                source: builtin::PATH_TEMPLATE.to_string(),
                segments: vec![
                    Segment::Placeholder(Placeholder::Layer),
                    Segment::Literal("/default/".to_string()),
                    Segment::Placeholder(Placeholder::Time),
                    Segment::Literal("/GoogleMapsCompatible_Level7/".to_string()),
                    Segment::Placeholder(Placeholder::Z),
                    Segment::Literal("/".to_string()),
                    Segment::Placeholder(Placeholder::Y),
                    Segment::Literal("/".to_string()),
                    Segment::Placeholder(Placeholder::X),
                    Segment::Literal(".png".to_string()),
                ],
            },
            max_zoom: builtin::MAX_ZOOM,
            needs_token: true,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn path_template(&self) -> &PathTemplate {
        &self.path_template
    }

    #[must_use]
    pub const fn max_zoom(&self) -> u32 {
        self.max_zoom
    }

    #[must_use]
    pub const fn needs_token(&self) -> bool {
        self.needs_token
    }
}

/// Pattern table keyed by layer type; always holds a `DEFAULT` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTable {
    patterns: BTreeMap<String, UrlPattern>,
}

impl PatternTable {
    /// Table holding only the built-in `DEFAULT` pattern
    #[must_use]
    pub fn builtin() -> Self {
        let mut patterns = BTreeMap::new();
        patterns.insert(DEFAULT_TYPE_KEY.to_string(), UrlPattern::builtin_default());
        Self { patterns }
    }

    /// Validates every raw entry. A missing `DEFAULT` is filled with the built-in
    /// pattern; the returned flag reports whether that happened.
    pub fn from_raw(raw: &BTreeMap<String, RawUrlPattern>) -> Result<(Self, bool), PatternError> {
        let mut patterns = BTreeMap::new();
        for (key, entry) in raw {
            patterns.insert(key.clone(), UrlPattern::from_raw(key, entry)?);
        }

        let inserted_default = !patterns.contains_key(DEFAULT_TYPE_KEY);
        if inserted_default {
            patterns.insert(DEFAULT_TYPE_KEY.to_string(), UrlPattern::builtin_default());
        }

        Ok((Self { patterns }, inserted_default))
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.patterns.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&UrlPattern> {
        self.patterns.get(key)
    }

    /// Pattern for `key`, or the `DEFAULT` pattern when `key` is absent
    #[must_use]
    pub fn get_or_default(&self, key: &str) -> &UrlPattern {
        self.patterns
            .get(key)
            .or_else(|| self.patterns.get(DEFAULT_TYPE_KEY))
            .unwrap_or_else(|| unreachable!("pattern table always holds {DEFAULT_TYPE_KEY}"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::builtin()
    }
}
