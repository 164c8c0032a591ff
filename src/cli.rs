use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::layer::Body;
use crate::domain::value_objects::Credential;
use crate::infrastructure::config::AppConfig;

/// Environment variable holding the GIBS API token
pub const TOKEN_ENV_VAR: &str = "NASA_API_KEY";

#[derive(Parser, Debug)]
#[command(
    name = "gibs-layer-validator",
    version,
    about = "Probe every layer of a GIBS catalog and report which ones are reachable",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Options for the default `validate` command
    #[command(flatten)]
    pub validate: ValidateArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe all layers and write the valid list plus a report (default)
    Validate(ValidateArgs),
    /// Write the default configuration file
    InitConfig {
        /// Destination; defaults to the per-user config location
        path: Option<PathBuf>,
        #[arg(long, default_value_t = false, help = "Overwrite an existing file")]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    #[arg(short, long, help = "Layer catalog (JSON array of names)")]
    pub layers: Option<PathBuf>,

    #[arg(short, long, help = "Pattern table (JSON with a layerTypes object)")]
    pub patterns: Option<PathBuf>,

    #[arg(short, long, help = "Valid-layers output; the report is written next to it")]
    pub output: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Maximum concurrent probes"
    )]
    pub workers: Option<u16>,

    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Per-probe timeout in seconds"
    )]
    pub timeout: Option<u64>,

    #[arg(long, help = "Planetary body: earth, moon or mars")]
    pub body: Option<Body>,

    #[arg(long, env = TOKEN_ENV_VAR, hide_env_values = true, help = "GIBS API token")]
    pub token: Option<String>,

    #[arg(short, long, help = "Configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Log level: error, warn, info, debug, trace")]
    pub log_level: Option<String>,

    #[arg(long, help = "Also write logs to this file")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Subcommand to run; a bare invocation means `validate`
    #[must_use]
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Validate(self.validate))
    }
}

impl ValidateArgs {
    /// Applies command-line values over the loaded configuration
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(layers) = &self.layers {
            config.paths.layers_file.clone_from(layers);
        }
        if let Some(patterns) = &self.patterns {
            config.paths.patterns_file.clone_from(patterns);
        }
        if let Some(output) = &self.output {
            config.paths.output_file.clone_from(output);
        }
        if let Some(workers) = self.workers {
            config.probe.concurrency_limit = usize::from(workers);
        }
        if let Some(timeout) = self.timeout {
            config.probe.timeout_seconds = timeout;
        }
        if let Some(body) = self.body {
            config.probe.body = body;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if let Some(file) = &self.log_file {
            config.logging.file_path = Some(file.clone());
        }
    }

    /// Configured credential; an empty token counts as none
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.token.as_deref().and_then(Credential::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_validates_with_top_level_options() {
        let cli = Cli::try_parse_from(["gibs-layer-validator", "-w", "4", "--body", "moon"]).unwrap();
        match cli.into_command() {
            Commands::Validate(args) => {
                assert_eq!(args.workers, Some(4));
                assert_eq!(args.body, Some(Body::Moon));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn validate_subcommand_parses_paths() {
        let cli = Cli::try_parse_from([
            "gibs-layer-validator",
            "validate",
            "--layers",
            "in.json",
            "-o",
            "out.json",
            "--timeout",
            "3",
        ])
        .unwrap();
        let Commands::Validate(args) = cli.into_command() else {
            panic!("expected validate");
        };
        assert_eq!(args.layers, Some(PathBuf::from("in.json")));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert_eq!(args.timeout, Some(3));
    }

    #[test]
    fn zero_workers_are_rejected() {
        assert!(Cli::try_parse_from(["gibs-layer-validator", "--workers", "0"]).is_err());
        assert!(Cli::try_parse_from(["gibs-layer-validator", "--body", "venus"]).is_err());
    }

    #[test]
    fn init_config_takes_optional_path() {
        let cli = Cli::try_parse_from(["gibs-layer-validator", "init-config", "cfg.json", "--force"]).unwrap();
        match cli.into_command() {
            Commands::InitConfig { path, force } => {
                assert_eq!(path, Some(PathBuf::from("cfg.json")));
                assert!(force);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let mut config = AppConfig::default();
        let args = ValidateArgs {
            workers: Some(3),
            output: Some(PathBuf::from("x.json")),
            ..ValidateArgs::default()
        };
        args.apply_to(&mut config);

        assert_eq!(config.probe.concurrency_limit, 3);
        assert_eq!(config.paths.output_file, PathBuf::from("x.json"));
        assert_eq!(config.probe.timeout_seconds, AppConfig::default().probe.timeout_seconds);
    }

    #[test]
    fn blank_token_means_no_credential() {
        let args = ValidateArgs {
            token: Some(String::new()),
            ..ValidateArgs::default()
        };
        assert!(args.credential().is_none());
    }
}
