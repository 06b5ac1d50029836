//! Status command implementation

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::GlobalOptions;
use crate::config::{self, Credentials, DEFAULT_SETTINGS_FILE, Settings};
use crate::error::Result;
use crate::output;
use crate::release::ReleaseVersion;

/// Resolved configuration, with secrets masked
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Settings file in use, if any
    pub settings_file: Option<PathBuf>,
    /// Set when the settings file could not be loaded
    pub settings_error: Option<String>,
    pub api_base_url: String,
    pub server_url: String,
    pub output_path: PathBuf,
    pub api_key: Option<String>,
    pub collection_id: Option<String>,
    pub workspace_id: Option<String>,
    pub environment_id: Option<String>,
    pub release_version: Option<String>,
    pub release_version_error: Option<String>,
}

impl StatusReport {
    /// Gather everything without failing; problems are part of the report
    pub fn collect(opts: &GlobalOptions, credentials: &Credentials) -> Self {
        let settings_file = match opts.config_ref() {
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(DEFAULT_SETTINGS_FILE)).filter(|p| p.exists()),
        };
        let (settings, settings_error) = match Settings::load_at(opts.config_ref()) {
            Ok(settings) => (settings, None),
            Err(e) => (Settings::default(), Some(e.to_string())),
        };
        let (release_version, release_version_error) =
            match ReleaseVersion::resolve(opts.release_version_ref()) {
                Ok(v) => (Some(v.to_string()), None),
                Err(e) => (None, Some(e.to_string())),
            };

        Self {
            settings_file,
            settings_error,
            api_base_url: settings.api_base_url,
            server_url: settings.server_url,
            output_path: settings.output_path,
            api_key: credentials.api_key.as_deref().map(config::mask),
            collection_id: credentials.collection_id.clone(),
            workspace_id: credentials.workspace_id.clone(),
            environment_id: credentials.environment_id.clone(),
            release_version,
            release_version_error,
        }
    }

    /// Ready to publish and convert
    pub fn is_ready(&self) -> bool {
        self.settings_error.is_none()
            && self.api_key.is_some()
            && self.release_version.is_some()
            && (self.collection_id.is_some() || self.workspace_id.is_some())
    }
}

/// Run the status command to display configuration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let report = StatusReport::collect(opts, &Credentials::from_env());
    output::print(&report, opts.format)
}
