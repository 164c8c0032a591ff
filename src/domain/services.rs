//! Domain services
//!
//! Interfaces the application layer depends on; implementations live in
//! `infrastructure`.

use async_trait::async_trait;

use crate::domain::probe_result::ProbeResult;
use crate::domain::value_objects::LayerName;

/// Performs one existence check for a resolved layer URL
///
/// Implementations never fail: every outcome, including transport errors and
/// timeouts, is folded into the returned [`ProbeResult`].
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `url` on behalf of `layer`
    async fn probe(&self, layer: &LayerName, url: &str) -> ProbeResult;
}
