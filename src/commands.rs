//! Command handlers invoked by the binary

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::application::coordinator::{ProbeCoordinator, ProbeSettings};
use crate::cli::ValidateArgs;
use crate::domain::report::ValidationOutcome;
use crate::domain::value_objects::Credential;
use crate::infrastructure::catalog::{load_layer_catalog, load_pattern_table};
use crate::infrastructure::config::{AppConfig, ConfigManager};
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};
use crate::infrastructure::prober::HttpProber;
use crate::infrastructure::report_writer::{WrittenOutputs, write_outputs};

/// Loads layered configuration and applies the command-line overrides
pub fn load_settings(args: &ValidateArgs) -> Result<AppConfig> {
    let mut config = ConfigManager::new(args.config.clone())
        .load_config()
        .context("Failed to load configuration")?;
    args.apply_to(&mut config);
    config.validate().context("Invalid command-line options")?;
    Ok(config)
}

/// Runs a full validation pass and writes both output files
pub async fn run_validate(
    config: &AppConfig,
    credential: Option<Credential>,
) -> Result<(ValidationOutcome, WrittenOutputs)> {
    let layers = load_layer_catalog(&config.paths.layers_file).await?;
    let table = load_pattern_table(&config.paths.patterns_file).await?;

    if credential.is_some() {
        info!("🔑 API token configured");
    } else {
        info!("No API token configured; probing without one");
    }

    let client = HttpClient::new(HttpClientConfig::from(&config.probe))?;
    let prober = Arc::new(HttpProber::new(client, credential.clone()));
    let settings = ProbeSettings::new(config.probe.concurrency_limit, config.probe.timeout())
        .with_credential(credential);

    let coordinator = ProbeCoordinator::new(Arc::new(table), config.probe.body, prober, settings);
    let outcome = coordinator.run_all(&layers).await;

    let written = write_outputs(&config.paths.output_file, &outcome).await?;
    Ok((outcome, written))
}

/// Human-readable end-of-run summary
#[must_use]
pub fn format_summary(outcome: &ValidationOutcome, written: &WrittenOutputs) -> String {
    let report = &outcome.report;
    format!(
        "\nValidation complete!\n  - Valid layers: {}\n  - Invalid layers: {}\n  - Success rate: {:.1}%\n\nFiles created:\n  - Valid layers: {}\n  - Validation report: {}",
        report.valid_layers,
        report.invalid_layers,
        report.success_rate(),
        written.valid_layers.display(),
        written.report.display()
    )
}

/// Writes the default configuration to `path` (or the per-user location)
pub async fn run_init_config(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let path = path
        .or_else(ConfigManager::default_config_path)
        .context("Could not determine the user config directory; pass a path")?;

    if tokio::fs::try_exists(&path).await.unwrap_or(false) && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let manager = ConfigManager::new(Some(path.clone()));
    manager.save_config(&AppConfig::default(), &path).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::probe_result::ProbeResult;
    use crate::domain::report::ValidationReport;
    use chrono::Local;
    use tempfile::TempDir;

    #[test]
    fn summary_shows_rate_with_one_decimal() {
        let outcome = ValidationReport::fold(
            Local::now().fixed_offset(),
            vec![
                ProbeResult::from_status("A".into(), 200, "u"),
                ProbeResult::from_status("B".into(), 404, "u"),
                ProbeResult::from_status("C".into(), 404, "u"),
            ],
        );
        let written = WrittenOutputs {
            valid_layers: PathBuf::from("v.json"),
            report: PathBuf::from("v_report.json"),
        };

        let summary = format_summary(&outcome, &written);
        assert!(summary.contains("Valid layers: 1"));
        assert!(summary.contains("Invalid layers: 2"));
        assert!(summary.contains("Success rate: 33.3%"));
        assert!(summary.contains("v_report.json"));
    }

    #[tokio::test]
    async fn init_config_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let written = run_init_config(Some(path.clone()), false).await.unwrap();
        assert_eq!(written, path);
        assert!(run_init_config(Some(path.clone()), false).await.is_err());
        assert!(run_init_config(Some(path), true).await.is_ok());
    }

    #[test]
    fn cli_overrides_win_over_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"probe": {"concurrency_limit": 8, "timeout_seconds": 20}}"#).unwrap();

        let args = ValidateArgs {
            config: Some(path),
            workers: Some(2),
            ..ValidateArgs::default()
        };
        let config = load_settings(&args).unwrap();
        assert_eq!(config.probe.concurrency_limit, 2);
        assert_eq!(config.probe.timeout_seconds, 20);
    }
}
