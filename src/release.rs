//! Release version derivation
//!
//! The version is resolved exactly once per run and handed to the publisher and
//! the converter, so both always agree on what "this release" means.

use std::fmt;

use semver::Version;

use crate::error::{ConfigError, Result};

/// Environment variables consulted, in order, when no explicit version is given
const VERSION_ENV_VARS: [&str; 3] = ["RELEASE_VERSION", "GITHUB_REF_NAME", "GITHUB_REF"];

/// A semantic release version such as `1.2.3` or `2.0.0-rc.1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion(Version);

impl ReleaseVersion {
    /// Parse a version from a tag or ref. Accepts `1.2.3`, `v1.2.3` and
    /// `refs/tags/v1.2.3`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let tag = trimmed.strip_prefix("refs/tags/").unwrap_or(trimmed);
        let bare = tag.strip_prefix('v').unwrap_or(tag);

        Version::parse(bare)
            .map(Self)
            .map_err(|_| ConfigError::InvalidVersion(raw.to_string()).into())
    }

    /// Resolve the version from an explicit flag, falling back to the CI
    /// environment.
    pub fn resolve(explicit: Option<&str>) -> Result<Self> {
        Self::resolve_with(explicit, |name| std::env::var(name).ok())
    }

    /// Resolution with an injectable environment lookup
    pub fn resolve_with<F>(explicit: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = explicit {
            return Self::parse(raw);
        }

        for name in VERSION_ENV_VARS {
            if let Some(raw) = lookup(name).filter(|v| !v.trim().is_empty()) {
                log::debug!("Release version taken from {}: {}", name, raw);
                return Self::parse(&raw);
            }
        }

        Err(ConfigError::MissingVersion.into())
    }

    /// The underlying semantic version
    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
