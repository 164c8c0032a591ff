//! HTTP prober
//!
//! Issues a single HEAD request per layer and turns whatever happens into a
//! [`ProbeResult`]. Nothing here returns an error to the caller.

use async_trait::async_trait;
use std::error::Error as StdError;
use tracing::debug;

use crate::domain::probe_result::ProbeResult;
use crate::domain::services::Prober;
use crate::domain::value_objects::{Credential, LayerName, redact_with};
use crate::infrastructure::http_client::HttpClient;

/// [`Prober`] backed by the shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: HttpClient,
    credential: Option<Credential>,
}

impl HttpProber {
    /// `credential` is only used to scrub details; URLs arrive already signed
    #[must_use]
    pub const fn new(client: HttpClient, credential: Option<Credential>) -> Self {
        Self { client, credential }
    }

    fn redact(&self, text: &str) -> String {
        redact_with(self.credential.as_ref(), text)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, layer: &LayerName, url: &str) -> ProbeResult {
        match self.client.head(url).await {
            Ok(response) => {
                let status = response.status();
                debug!("HEAD {} -> {}", self.redact(url), status);
                ProbeResult::from_status(layer.clone(), status.as_u16(), self.redact(url))
            }
            Err(e) if e.is_timeout() => {
                debug!("HEAD {} timed out", self.redact(url));
                ProbeResult::timeout(layer.clone())
            }
            Err(e) => {
                let detail = self.redact(&describe(&e));
                debug!("HEAD {} failed: {}", self.redact(url), detail);
                ProbeResult::error(layer.clone(), detail)
            }
        }
    }
}

/// Error message followed by its source chain, e.g.
/// `error sending request for url (..): client error (Connect): Connection refused`
fn describe(error: &reqwest::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
