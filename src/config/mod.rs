//! Configuration for udns-postman
//!
//! Two layers: an optional YAML settings file for non-secret knobs, and
//! environment variables for credentials and remote identifiers. Credentials
//! are only ever read, never persisted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::readiness::PollConfig;
use crate::error::{ConfigError, Result};

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "udns-postman.yaml";

/// Postman API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.getpostman.com";

pub const ENV_API_KEY: &str = "POSTMAN_API_KEY";
pub const ENV_COLLECTION_ID: &str = "POSTMAN_COLLECTION_ID";
pub const ENV_WORKSPACE_ID: &str = "POSTMAN_WORKSPACE_ID";
pub const ENV_ENVIRONMENT_ID: &str = "POSTMAN_ENVIRONMENT_ID";
pub const ENV_API_BASE: &str = "POSTMAN_API_BASE";

/// Non-secret settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Postman API base URL
    pub api_base_url: String,

    /// Server URL written into the OpenAPI document
    pub server_url: String,

    /// Description of that server
    pub server_description: String,

    /// Where the converted OpenAPI YAML is written
    pub output_path: PathBuf,

    /// Readiness polling before conversion
    pub poll: PollSettings,

    /// Client-side request rate limit
    pub rate_limit_per_second: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            server_url: "https://api.ultradns.com".to_string(),
            server_description: "Primary UltraDNS API".to_string(),
            output_path: PathBuf::from("spec/udns_openapi.yml"),
            poll: PollSettings::default(),
            rate_limit_per_second: 5,
        }
    }
}

/// Poll loop knobs as they appear in the settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub attempts: u32,
    pub delay_secs: u64,
    pub timeout_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay_secs: 6,
            timeout_secs: 120,
        }
    }
}

impl PollSettings {
    pub fn to_config(&self) -> PollConfig {
        PollConfig {
            attempts: self.attempts,
            delay: Duration::from_secs(self.delay_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl Settings {
    /// Load settings from an explicit path, or from the default file if it
    /// exists. An explicit path that does not exist is an error; a missing
    /// default file just means defaults.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => Self::load_from(Path::new(p))?,
            None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
                Self::load_from(Path::new(DEFAULT_SETTINGS_FILE))?
            }
            None => Self::default(),
        };

        if let Ok(base) = std::env::var(ENV_API_BASE) {
            if !base.trim().is_empty() {
                settings.api_base_url = base;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.poll.attempts == 0 {
            return Err(ConfigError::Invalid("poll.attempts must be at least 1".into()).into());
        }
        if self.rate_limit_per_second == 0 {
            return Err(
                ConfigError::Invalid("rate_limit_per_second must be at least 1".into()).into(),
            );
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            ))
            .into());
        }
        Ok(())
    }
}

/// Credentials and remote identifiers, read from the environment
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub collection_id: Option<String>,
    pub workspace_id: Option<String>,
    pub environment_id: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_deref().map(mask))
            .field("collection_id", &self.collection_id)
            .field("workspace_id", &self.workspace_id)
            .field("environment_id", &self.environment_id)
            .finish()
    }
}

impl Credentials {
    /// Read from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_key: get(ENV_API_KEY),
            collection_id: get(ENV_COLLECTION_ID),
            workspace_id: get(ENV_WORKSPACE_ID),
            environment_id: get(ENV_ENVIRONMENT_ID),
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnv(ENV_API_KEY).into())
    }

    pub fn require_collection_id(&self) -> Result<&str> {
        self.collection_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnv(ENV_COLLECTION_ID).into())
    }

    pub fn require_workspace_id(&self) -> Result<&str> {
        self.workspace_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnv(ENV_WORKSPACE_ID).into())
    }
}

/// Show only the last four characters of a secret
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
