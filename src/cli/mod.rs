//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod completions;
pub mod context;
pub mod convert;
pub mod publish;
pub mod release;
pub mod sanitize;
pub mod status;
pub mod validate;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// udns-postman - keep the UltraDNS Postman collection valid, clean and
/// published, and derive the OpenAPI document from it
#[derive(Parser, Debug)]
#[command(name = "udns-postman")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "UDNS_POSTMAN_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Settings file (default: ./udns-postman.yaml if present)
    #[arg(long, global = true, env = "UDNS_POSTMAN_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "UDNS_POSTMAN_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Release version (default: RELEASE_VERSION, GITHUB_REF_NAME, GITHUB_REF)
    #[arg(long = "release-version", global = true, value_name = "VERSION")]
    pub release_version: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate collection and environment files against their schemas
    Validate {
        /// Directory holding the Postman files
        dir: PathBuf,
    },

    /// Strip volatile export metadata and version suffixes in place
    Sanitize {
        /// Directory holding the Postman files
        dir: PathBuf,

        /// Report files that would change and fail instead of writing
        #[arg(long)]
        check: bool,
    },

    /// Push the collection and environments to Postman with the release version
    #[command(after_help = "\
Environment:
  POSTMAN_API_KEY          API key (required)
  POSTMAN_COLLECTION_ID    update this collection instead of creating one
  POSTMAN_ENVIRONMENT_ID   update this environment instead of creating one
  POSTMAN_WORKSPACE_ID     workspace for newly created objects")]
    Publish {
        /// Directory holding the Postman files
        dir: PathBuf,
    },

    /// Wait for the published collection, then write the OpenAPI document
    #[command(after_help = "\
Environment:
  POSTMAN_API_KEY          API key (required)
  POSTMAN_COLLECTION_ID    collection to convert (required)")]
    Convert {
        /// Output file (default: settings output_path, spec/udns_openapi.yml)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Publish then convert, using one release version for both
    Release {
        /// Directory holding the Postman files
        dir: PathBuf,

        /// Output file for the OpenAPI document
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show settings, credentials and release version as resolved
    Status,

    /// Display version information
    Version,

    /// Generate shell completions
    #[command(after_help = "\
Install:
  bash:   udns-postman completion bash > /etc/bash_completion.d/udns-postman
  zsh:    udns-postman completion zsh > \"${fpath[1]}/_udns-postman\"
  fish:   udns-postman completion fish > ~/.config/fish/completions/udns-postman.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
