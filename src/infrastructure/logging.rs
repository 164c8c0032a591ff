//! Logging system configuration and initialization
//!
//! - Console output on stdout
//! - Optional file output through a non-blocking writer
//! - Structured JSON file logging (optional)
//! - Local-time timestamps

use anyhow::{Context, Result};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

// Re-export LoggingConfig from config module
pub use crate::infrastructure::config::LoggingConfig;

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Dependencies that are only interesting at trace level
const QUIET_TARGETS: &[(&str, &str)] = &[
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("h2", "warn"),
    ("tokio", "info"),
    ("runtime", "warn"),
];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Timestamps in the machine's local timezone
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LoggingConfig::default())
}

/// Filter directives applied when `RUST_LOG` is not set
///
/// HTTP client and runtime internals are suppressed unless the level is trace.
pub fn default_directives(level: &str) -> Vec<String> {
    let mut directives = vec![level.to_string()];
    if !level.to_lowercase().contains("trace") {
        directives.extend(
            QUIET_TARGETS
                .iter()
                .map(|(target, target_level)| format!("{target}={target_level}")),
        );
        directives.push(format!("gibs_layer_validator_lib={level}"));
        directives.push(format!("gibs_layer_validator={level}"));
    }
    directives
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(level);
        for directive in default_directives(level).iter().skip(1) {
            match directive.parse() {
                Ok(parsed) => filter = filter.add_directive(parsed),
                Err(e) => warn!("Ignoring log directive {}: {}", directive, e),
            }
        }
        filter
    })
}

fn file_layer(path: &Path, json: bool) -> Result<BoxedLayer> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) = non_blocking(rolling::never(dir, file_name));
    // Keep the writer alive for the rest of the process
    LOG_GUARDS
        .lock()
        .map_err(|_| anyhow::anyhow!("Log guard registry poisoned"))?
        .push(guard);

    let layer = if json {
        fmt::Layer::new()
            .json()
            .with_writer(writer)
            .with_timer(LocalTimeFormatter)
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::Layer::new()
            .with_writer(writer)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
            .with_ansi(false)
            .boxed()
    };
    Ok(layer)
}

/// Initialize logging with custom configuration
///
/// `RUST_LOG` overrides the configured level entirely:
/// ```bash
/// RUST_LOG="debug,reqwest=debug,hyper=debug" gibs-layer-validator validate
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        layers.push(
            fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .boxed(),
        );
    }

    if let Some(path) = &config.file_path {
        layers.push(file_layer(path, config.json_format)?);
    }

    Registry::default()
        .with(layers)
        .with(build_env_filter(&config.level))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(path) = &config.file_path {
        info!("Logging to file: {}", path.display());
    }
    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== GIBS Layer Validator ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}
