//! URL pattern resolver
//!
//! Turns a layer name into the concrete URL used to probe it. Resolution is a
//! pure function of the layer name, the pattern table, the probe date and the
//! credential, so the same inputs always produce the same URL.

use chrono::{Days, Local, NaiveDate};
use std::sync::Arc;

use crate::domain::layer::{Body, LayerType, is_time_agnostic};
use crate::domain::pattern::{PatternTable, Placeholder, UrlPattern};
use crate::domain::value_objects::{Credential, LayerName};

/// Time token used for layers without a time dimension
pub const DEFAULT_TIME_TOKEN: &str = "default";

/// Query parameter carrying the API credential
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Fixed root tile used as the existence probe coordinate
pub const PROBE_TILE_Z: &str = "1";
pub const PROBE_TILE_Y: &str = "0";
pub const PROBE_TILE_X: &str = "0";

/// Resolves probe URLs for layers against a loaded pattern table
#[derive(Debug, Clone)]
pub struct UrlResolver {
    table: Arc<PatternTable>,
    credential: Option<Credential>,
    body: Body,
}

impl UrlResolver {
    #[must_use]
    pub const fn new(table: Arc<PatternTable>, credential: Option<Credential>, body: Body) -> Self {
        Self {
            table,
            credential,
            body,
        }
    }

    #[must_use]
    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Type key used for `layer`
    #[must_use]
    pub fn layer_type(&self, layer: &LayerName) -> LayerType {
        match self.body.fixed_type_key() {
            Some(key) => LayerType::new(key),
            None => LayerType::classify(layer, &self.table),
        }
    }

    /// Pattern used for `layer`; falls back to the `DEFAULT` pattern object
    #[must_use]
    pub fn pattern_for(&self, layer: &LayerName) -> &UrlPattern {
        self.table.get_or_default(self.layer_type(layer).as_str())
    }

    /// Time token for `layer` when probing on `today`: yesterday's date, or `default`
    #[must_use]
    pub fn time_token(&self, layer: &LayerName, today: NaiveDate) -> String {
        if !self.body.supports_time() || is_time_agnostic(layer) {
            return DEFAULT_TIME_TOKEN.to_string();
        }
        today
            .checked_sub_days(Days::new(1))
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Renders the probe URL for `layer` as of `today`
    #[must_use]
    pub fn resolve(&self, layer: &LayerName, today: NaiveDate) -> String {
        let pattern = self.pattern_for(layer);
        let time = self.time_token(layer, today);

        let path = pattern.path_template().render(|placeholder| match placeholder {
            Placeholder::Layer => layer.as_str(),
            Placeholder::Time => time.as_str(),
            Placeholder::Z => PROBE_TILE_Z,
            Placeholder::Y => PROBE_TILE_Y,
            Placeholder::X => PROBE_TILE_X,
        });

        let mut url = format!("{}/{}", pattern.base_url(), path);

        if let Some(credential) = &self.credential {
            if pattern.needs_token() && self.body.needs_token() {
                let separator = if url.contains('?') { '&' } else { '?' };
                url.push(separator);
                url.push_str(TOKEN_QUERY_PARAM);
                url.push('=');
                url.push_str(&credential.encoded());
            }
        }

        url
    }

    /// Renders the probe URL for `layer` using the local calendar date
    #[must_use]
    pub fn resolve_now(&self, layer: &LayerName) -> String {
        self.resolve(layer, Local::now().date_naive())
    }
}
