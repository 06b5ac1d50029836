//! Command execution context
//!
//! Bundles what the networked commands share: resolved settings, credentials
//! from the environment, and a ready API client.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::PostmanClient;
use crate::config::{Credentials, Settings};
use crate::error::Result;

/// Context for commands that talk to Postman
pub struct CommandContext {
    /// Settings file values with defaults applied
    pub settings: Settings,
    /// Credentials and remote identifiers
    pub credentials: Credentials,
    /// Rate-limited API client
    pub client: Arc<PostmanClient>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load settings and credentials and build the client.
    ///
    /// # Errors
    /// Returns error if the settings file is missing or invalid, or if
    /// `POSTMAN_API_KEY` is not set.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let settings = Settings::load_at(opts.config_ref())?;
        let credentials = Credentials::from_env();
        log::debug!("Using credentials {:?}", credentials);

        let api_key = credentials.require_api_key()?;
        let client = Arc::new(PostmanClient::new(
            &settings.api_base_url,
            api_key,
            settings.rate_limit_per_second,
        )?);

        Ok(Self {
            settings,
            credentials,
            client,
            format: opts.format,
        })
    }

    /// Apply a `--output` override to the settings
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        if let Some(path) = output {
            self.settings.output_path = path;
        }
        self
    }
}
