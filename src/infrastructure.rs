//! Infrastructure layer for HTTP probing, file adapters, configuration and logging

pub mod catalog; // Layer catalog and pattern table loading
pub mod config; // Configuration layering and defaults
pub mod http_client;
pub mod logging;
pub mod prober; // reqwest-backed Prober
pub mod report_writer;

// Re-export commonly used items
pub use catalog::{CatalogError, load_layer_catalog, load_pattern_table};
pub use config::{AppConfig, ConfigError, ConfigManager, LoggingConfig, PathsConfig, ProbeConfig};
pub use http_client::{HttpClient, HttpClientConfig, HttpClientError};
pub use logging::{init_logging, init_logging_with_config, log_system_info};
pub use prober::HttpProber;
pub use report_writer::{WrittenOutputs, report_path_for, write_outputs};
