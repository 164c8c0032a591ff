//! Validation report built once all probes have completed

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::probe_result::ProbeResult;
use super::value_objects::LayerName;

/// Summary of a validation run
///
/// Invariant: `valid_layers + invalid_layers == total_layers`, and
/// `invalid_details` holds exactly the invalid results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub timestamp: DateTime<FixedOffset>,
    pub total_layers: usize,
    /// Count of valid layers
    pub valid_layers: usize,
    /// Count of invalid layers
    pub invalid_layers: usize,
    pub invalid_details: Vec<ProbeResult>,
}

/// Final aggregate of a run: the valid layer names plus the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid_layers: Vec<LayerName>,
    pub report: ValidationReport,
}

impl ValidationReport {
    /// Folds every probe result into the valid names and the report.
    /// Input order is preserved in both outputs.
    #[must_use]
    pub fn fold<I>(timestamp: DateTime<FixedOffset>, results: I) -> ValidationOutcome
    where
        I: IntoIterator<Item = ProbeResult>,
    {
        let mut valid_layers = Vec::new();
        let mut invalid_details = Vec::new();

        for result in results {
            if result.valid {
                valid_layers.push(result.layer);
            } else {
                invalid_details.push(result);
            }
        }

        let report = Self {
            timestamp,
            total_layers: valid_layers.len() + invalid_details.len(),
            valid_layers: valid_layers.len(),
            invalid_layers: invalid_details.len(),
            invalid_details,
        };

        ValidationOutcome {
            valid_layers,
            report,
        }
    }

    /// Percentage of layers that probed valid, 0.0 for an empty run
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total_layers == 0 {
            0.0
        } else {
            self.valid_layers as f64 / self.total_layers as f64 * 100.0
        }
    }
}
