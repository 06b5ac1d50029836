//! Postman API client implementation

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{PostmanApi, PublishedObject, RemoteCollection};
use crate::error::{ApiError, Result};

/// Header carrying the Postman API key
const API_KEY_HEADER: &str = "X-API-Key";

/// Postman API client
pub struct PostmanClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl PostmanClient {
    /// Create a client for `base_url` authenticating with `api_key`
    pub fn new(base_url: &str, api_key: &str, requests_per_second: u32) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("udns-postman/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let quota =
            Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Send an authenticated request and decode a 2xx JSON body
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(API_KEY_HEADER, &self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::from)?;
        let status = response.status();

        if status.is_success() {
            let data = response.json::<T>().await.map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
            })?;
            return Ok(data);
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);
        let body = response.text().await.unwrap_or_default();
        log::debug!("{} returned {}: {}", url, status, body);

        Err(status_error(status, body, retry_after).into())
    }
}

/// Map a non-2xx status to an error
fn status_error(status: StatusCode, body: String, retry_after: u64) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::NOT_FOUND => ApiError::NotFound(if body.is_empty() {
            "Resource not found".to_string()
        } else {
            body
        }),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimit(Duration::from_secs(retry_after)),
        s if s.is_client_error() => ApiError::BadRequest {
            status: s.as_u16(),
            body,
        },
        s if s.is_server_error() => ApiError::ServerError {
            status: s.as_u16(),
            body,
        },
        s => ApiError::InvalidResponse(format!("Unexpected status code: {}", s)),
    }
}

#[derive(Deserialize)]
struct CollectionEnvelope<T> {
    collection: T,
}

#[derive(Deserialize)]
struct EnvironmentEnvelope {
    environment: PublishedObject,
}

#[derive(Deserialize)]
struct TransformationResponse {
    output: Option<Value>,
}

#[async_trait]
impl PostmanApi for PostmanClient {
    async fn get_collection(&self, collection_id: &str) -> Result<RemoteCollection> {
        let path = format!("/collections/{}", collection_id);
        let response: CollectionEnvelope<RemoteCollection> =
            self.request(Method::GET, &path, None).await?;
        Ok(response.collection)
    }

    async fn create_collection(
        &self,
        workspace_id: &str,
        collection: &Value,
    ) -> Result<PublishedObject> {
        let path = format!("/collections?workspace={}", workspace_id);
        let payload = json!({ "collection": collection });
        let response: CollectionEnvelope<PublishedObject> =
            self.request(Method::POST, &path, Some(&payload)).await?;
        Ok(response.collection)
    }

    async fn update_collection(
        &self,
        collection_id: &str,
        collection: &Value,
    ) -> Result<PublishedObject> {
        let path = format!("/collections/{}", collection_id);
        let payload = json!({ "collection": collection });
        let response: CollectionEnvelope<PublishedObject> =
            self.request(Method::PUT, &path, Some(&payload)).await?;
        Ok(response.collection)
    }

    async fn create_environment(
        &self,
        workspace_id: &str,
        environment: &Value,
    ) -> Result<PublishedObject> {
        let path = format!("/environments?workspace={}", workspace_id);
        let payload = json!({ "environment": environment });
        let response: EnvironmentEnvelope =
            self.request(Method::POST, &path, Some(&payload)).await?;
        Ok(response.environment)
    }

    async fn update_environment(
        &self,
        environment_id: &str,
        environment: &Value,
    ) -> Result<PublishedObject> {
        let path = format!("/environments/{}", environment_id);
        let payload = json!({ "environment": environment });
        let response: EnvironmentEnvelope =
            self.request(Method::PUT, &path, Some(&payload)).await?;
        Ok(response.environment)
    }

    async fn transform_collection(&self, collection_id: &str) -> Result<Value> {
        let path = format!("/collections/{}/transformations", collection_id);
        let response: TransformationResponse = self.request(Method::GET, &path, None).await?;

        match response.output {
            Some(Value::String(text)) => serde_json::from_str(&text).map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse 'output' JSON: {}", e)).into()
            }),
            Some(doc @ Value::Object(_)) => Ok(doc),
            Some(_) => Err(ApiError::InvalidResponse("'output' is not a JSON document".into()).into()),
            None => Err(ApiError::InvalidResponse("Unexpected response: no 'output' field".into()).into()),
        }
    }
}
