//! `--format json`: the report under `data`, run details under `meta`

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// What every JSON document is wrapped in
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: ?Sized> {
    pub data: &'a T,
    pub meta: Meta,
}

/// Run details, so CI logs can be matched to a build of the tool
#[derive(Debug, Serialize)]
pub struct Meta {
    pub tool: &'static str,
    pub version: &'static str,
    /// RFC 3339, UTC, second precision
    pub timestamp: String,
}

impl Meta {
    fn now() -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Pretty-printed JSON envelope around `data`
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&Envelope {
        data,
        meta: Meta::now(),
    })
}
