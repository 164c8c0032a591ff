//! GIBS Layer Validator
//!
//! Probes every layer of a GIBS imagery catalog with a bounded pool of
//! concurrent HEAD requests and reports which layers are reachable.

// Module declarations
pub mod application;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infrastructure;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::infrastructure::logging::{init_logging_with_config, log_system_info};

/// Entry point shared by the binary: dispatches the parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    match cli.into_command() {
        Commands::Validate(args) => {
            let config = commands::load_settings(&args)?;
            init_logging_with_config(config.logging.clone())?;
            log_system_info();

            let (outcome, written) = commands::run_validate(&config, args.credential()).await?;
            println!("{}", commands::format_summary(&outcome, &written));
        }
        Commands::InitConfig { path, force } => {
            let path = commands::run_init_config(path, force).await?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
