//! Global CLI options shared across all commands

use crate::cli::{Cli, OutputFormat};

/// Global CLI options passed to command handlers.
///
/// Precedence for each option is CLI flag > environment variable > settings
/// file > default. This struct captures the CLI/env layer; settings file
/// values are resolved in `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Settings file path (defaults to ./udns-postman.yaml when present)
    pub config: Option<String>,

    /// Debug logging requested
    pub debug: bool,

    /// Explicit release version, ahead of the CI environment
    pub release_version: Option<String>,
}

impl GlobalOptions {
    /// Build from the parsed CLI, once, in main.rs
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            debug: cli.debug,
            release_version: cli.release_version.clone(),
        }
    }

    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn release_version_ref(&self) -> Option<&str> {
        self.release_version.as_deref()
    }
}
