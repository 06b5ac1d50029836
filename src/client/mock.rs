//! Mock Postman API client for testing
//!
//! Implements [`PostmanApi`] in memory so publish, readiness and convert
//! logic can be exercised without a network.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{PostmanApi, PublishedObject, RemoteCollection, RemoteCollectionInfo};
use crate::error::{ApiError, Result};

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockPostmanClient::new()
///     .with_collection_names(["UDNS v1.2.2", "UDNS v1.2.3"])
///     .await;
///
/// let first = mock.get_collection("c1").await?;
/// assert_eq!(first.info.name, "UDNS v1.2.2");
/// ```
#[derive(Default)]
pub struct MockPostmanClient {
    /// Replies for successive get_collection calls; the last name repeats
    collection_replies: Arc<Mutex<VecDeque<std::result::Result<String, ApiError>>>>,
    /// Name returned once the queue is drained
    last_name: Arc<Mutex<Option<String>>>,
    /// OpenAPI document returned from transform_collection
    transformation: Arc<Mutex<Option<Value>>>,
    /// Error returned by the next call of any kind, consumed on use
    error: Arc<Mutex<Option<ApiError>>>,
    /// Captured requests for test assertions
    captured_requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// A captured API request for test assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// The trait method called (e.g. "update_collection")
    pub method: &'static str,
    /// Collection, environment or workspace ID the call targeted
    pub target: String,
    /// Document sent, for create/update calls
    pub body: Option<Value>,
}

impl MockPostmanClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the collection names get_collection reports, one per call.
    pub async fn with_collection_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut replies = self.collection_replies.lock().await;
            replies.extend(names.into_iter().map(|n| Ok(n.into())));
        }
        self
    }

    /// Queue a failing get_collection reply ahead of any configured names.
    pub async fn with_collection_error(self, error: ApiError) -> Self {
        self.collection_replies.lock().await.push_front(Err(error));
        self
    }

    /// Configure the document transform_collection returns.
    pub async fn with_transformation(self, doc: Value) -> Self {
        *self.transformation.lock().await = Some(doc);
        self
    }

    /// Configure an error for the next call.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    /// Get all captured requests.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests.lock().await.clone()
    }

    /// Number of get_collection calls made so far.
    pub async fn poll_count(&self) -> usize {
        self.captured_requests
            .lock()
            .await
            .iter()
            .filter(|r| r.method == "get_collection")
            .count()
    }

    async fn record(&self, method: &'static str, target: &str, body: Option<&Value>) -> Result<()> {
        self.captured_requests.lock().await.push(CapturedRequest {
            method,
            target: target.to_string(),
            body: body.cloned(),
        });
        if let Some(err) = self.error.lock().await.take() {
            return Err(err.into());
        }
        Ok(())
    }

    fn published(id: &str) -> PublishedObject {
        PublishedObject {
            id: Some(id.to_string()),
            uid: Some(format!("0000-{}", id)),
        }
    }
}

#[async_trait]
impl PostmanApi for MockPostmanClient {
    async fn get_collection(&self, collection_id: &str) -> Result<RemoteCollection> {
        self.record("get_collection", collection_id, None).await?;

        let next = self.collection_replies.lock().await.pop_front();
        let name = match next {
            Some(Ok(name)) => {
                *self.last_name.lock().await = Some(name.clone());
                name
            }
            Some(Err(err)) => return Err(err.into()),
            None => self
                .last_name
                .lock()
                .await
                .clone()
                .ok_or_else(|| ApiError::NotFound(format!("collection {}", collection_id)))?,
        };

        Ok(RemoteCollection {
            info: RemoteCollectionInfo {
                name,
                version: None,
            },
        })
    }

    async fn create_collection(
        &self,
        workspace_id: &str,
        collection: &Value,
    ) -> Result<PublishedObject> {
        self.record("create_collection", workspace_id, Some(collection))
            .await?;
        Ok(Self::published("new-collection"))
    }

    async fn update_collection(
        &self,
        collection_id: &str,
        collection: &Value,
    ) -> Result<PublishedObject> {
        self.record("update_collection", collection_id, Some(collection))
            .await?;
        Ok(Self::published(collection_id))
    }

    async fn create_environment(
        &self,
        workspace_id: &str,
        environment: &Value,
    ) -> Result<PublishedObject> {
        self.record("create_environment", workspace_id, Some(environment))
            .await?;
        Ok(Self::published("new-environment"))
    }

    async fn update_environment(
        &self,
        environment_id: &str,
        environment: &Value,
    ) -> Result<PublishedObject> {
        self.record("update_environment", environment_id, Some(environment))
            .await?;
        Ok(Self::published(environment_id))
    }

    async fn transform_collection(&self, collection_id: &str) -> Result<Value> {
        self.record("transform_collection", collection_id, None)
            .await?;
        self.transformation
            .lock()
            .await
            .clone()
            .ok_or_else(|| ApiError::InvalidResponse("no transformation configured".into()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_collection_names_in_order_then_repeat() {
        let mock = MockPostmanClient::new()
            .with_collection_names(["A v1.0.0", "A v1.0.1"])
            .await;

        assert_eq!(mock.get_collection("c").await.unwrap().info.name, "A v1.0.0");
        assert_eq!(mock.get_collection("c").await.unwrap().info.name, "A v1.0.1");
        assert_eq!(mock.get_collection("c").await.unwrap().info.name, "A v1.0.1");
        assert_eq!(mock.poll_count().await, 3);
    }

    #[tokio::test]
    async fn test_error_consumed_once() {
        let mock = MockPostmanClient::new()
            .with_error(ApiError::Unauthorized)
            .await;
        let doc = json!({"name": "env", "values": []});

        assert!(mock.create_environment("ws", &doc).await.is_err());
        let ok = mock.create_environment("ws", &doc).await.unwrap();
        assert_eq!(ok.display_id(), "0000-new-environment");
    }

    #[tokio::test]
    async fn test_captures_bodies() {
        let mock = MockPostmanClient::new();
        let doc = json!({"info": {"name": "UDNS v1.2.3"}, "item": []});
        mock.update_collection("c1", &doc).await.unwrap();

        let captured = mock.captured_requests().await;
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].method, "update_collection");
        assert_eq!(captured[0].target, "c1");
        assert_eq!(captured[0].body.as_ref(), Some(&doc));
    }
}
