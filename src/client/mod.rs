//! Postman API client

use async_trait::async_trait;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::postman::version::extract_version;

#[cfg(test)]
pub mod mock;
pub mod postman;
pub mod readiness;

#[cfg(test)]
pub use mock::MockPostmanClient;
pub use postman::PostmanClient;

/// The slice of the Postman API this tool talks to
#[async_trait]
pub trait PostmanApi: Send + Sync {
    /// Fetch a collection's metadata and contents
    async fn get_collection(&self, collection_id: &str) -> Result<RemoteCollection>;

    /// Create a collection in a workspace
    async fn create_collection(
        &self,
        workspace_id: &str,
        collection: &Value,
    ) -> Result<PublishedObject>;

    /// Replace an existing collection
    async fn update_collection(
        &self,
        collection_id: &str,
        collection: &Value,
    ) -> Result<PublishedObject>;

    /// Create an environment in a workspace
    async fn create_environment(
        &self,
        workspace_id: &str,
        environment: &Value,
    ) -> Result<PublishedObject>;

    /// Replace an existing environment
    async fn update_environment(
        &self,
        environment_id: &str,
        environment: &Value,
    ) -> Result<PublishedObject>;

    /// Ask Postman to render a collection as OpenAPI. Returns the parsed
    /// OpenAPI JSON.
    async fn transform_collection(&self, collection_id: &str) -> Result<Value>;
}

/// A collection as returned by `GET /collections/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCollection {
    pub info: RemoteCollectionInfo,
}

/// Collection metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCollectionInfo {
    pub name: String,

    /// Optional explicit version, string or `{major, minor, patch}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
}

impl RemoteCollection {
    /// The release version this collection carries: the name suffix first,
    /// then `info.version`.
    pub fn version(&self) -> Option<Version> {
        extract_version(&self.info.name).or_else(|| match self.info.version.as_ref()? {
            Value::String(raw) => Version::parse(raw.trim_start_matches('v')).ok(),
            Value::Object(parts) => {
                let part = |key: &str| parts.get(key).and_then(Value::as_u64);
                Some(Version::new(part("major")?, part("minor")?, part("patch")?))
            }
            _ => None,
        })
    }
}

/// Identifiers of a created or updated remote object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishedObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl PublishedObject {
    /// Best identifier to show a user
    pub fn display_id(&self) -> &str {
        self.uid
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("(unknown)")
    }
}
