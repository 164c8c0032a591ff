//! Report emitter
//!
//! Writes the valid-layer list and the validation report as pretty JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::domain::report::ValidationOutcome;

const REPORT_SUFFIX: &str = "_report.json";

/// Report file written next to `output`: `x.json` becomes `x_report.json`,
/// any other name gets `_report.json` appended
#[must_use]
pub fn report_path_for(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let report_name = match name.strip_suffix(".json") {
        Some(stem) => format!("{stem}{REPORT_SUFFIX}"),
        None => format!("{name}{REPORT_SUFFIX}"),
    };
    output.with_file_name(report_name)
}

/// Paths of the two files a run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutputs {
    pub valid_layers: PathBuf,
    pub report: PathBuf,
}

/// Writes both output files for `outcome`
pub async fn write_outputs(output: &Path, outcome: &ValidationOutcome) -> Result<WrittenOutputs> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let report = report_path_for(output);
    write_json(output, &outcome.valid_layers).await?;
    write_json(&report, &outcome.report).await?;

    info!("💾 Saved {} valid layers to {}", outcome.valid_layers.len(), output.display());
    info!("💾 Saved validation report to {}", report.display());

    Ok(WrittenOutputs {
        valid_layers: output.to_path_buf(),
        report,
    })
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
