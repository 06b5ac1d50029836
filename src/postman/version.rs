//! Display-name version suffixes
//!
//! Published copies carry ` v<version>` at the end of their name; the
//! checked-in copies never do. `append_version` and `strip_version` are kept
//! exact inverses so suffixes cannot pile up across releases.

use semver::Version;

use crate::release::ReleaseVersion;

/// Separator placed between a name and its version
const SUFFIX_MARKER: &str = " v";

/// Split a trailing ` v<semver>` suffix off `name`, if there is one
fn split_suffix(name: &str) -> Option<(&str, Version)> {
    let (base, candidate) = name.rsplit_once(SUFFIX_MARKER)?;
    let version = Version::parse(candidate).ok()?;
    Some((base, version))
}

/// Remove every trailing version suffix from `name`
pub fn strip_version(name: &str) -> String {
    let mut current = name.trim_end();
    while let Some((base, _)) = split_suffix(current) {
        current = base.trim_end();
    }
    current.to_string()
}

/// Replace any existing suffix with ` v<version>`
pub fn append_version(name: &str, version: &ReleaseVersion) -> String {
    format!("{}{}{}", strip_version(name), SUFFIX_MARKER, version)
}

/// The version carried by `name`'s suffix, if any
pub fn extract_version(name: &str) -> Option<Version> {
    split_suffix(name.trim_end()).map(|(_, version)| version)
}
