//! Wait for a published collection to report the release version
//!
//! Postman processes collection updates asynchronously, so the OpenAPI
//! transformation can lag behind a publish. Conversion polls the collection
//! until its name (or `info.version`) carries the expected version.

use std::time::{Duration, Instant};

use semver::Version;

use super::PostmanApi;
use crate::error::{Error, Result};
use crate::release::ReleaseVersion;

/// Poll loop limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of fetches
    pub attempts: u32,
    /// Pause between fetches
    pub delay: Duration,
    /// Overall deadline for the whole loop
    pub timeout: Duration,
}

/// A successful wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    /// Fetches made, including the one that matched
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Poll `collection_id` until it reports `expected`.
///
/// `observer` is called after every attempt with the attempt number and the
/// version seen (if any), which lets the caller drive a spinner.
pub async fn wait_for_version<A, F>(
    api: &A,
    collection_id: &str,
    expected: &ReleaseVersion,
    config: &PollConfig,
    mut observer: F,
) -> Result<Readiness>
where
    A: PostmanApi + ?Sized,
    F: FnMut(u32, Option<&Version>),
{
    let started = Instant::now();
    let target = expected.as_semver();
    let mut observed: Option<Version> = None;
    let mut attempts = 0;

    while attempts < config.attempts {
        let remaining = config.timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            log::warn!("Readiness deadline of {:?} reached", config.timeout);
            break;
        }
        attempts += 1;

        match tokio::time::timeout(remaining, api.get_collection(collection_id)).await {
            Ok(Ok(collection)) => {
                let seen = collection.version();
                log::debug!(
                    "Attempt {}/{}: '{}' reports {:?}",
                    attempts,
                    config.attempts,
                    collection.info.name,
                    seen.as_ref().map(ToString::to_string)
                );
                observer(attempts, seen.as_ref());
                if seen.as_ref() == Some(target) {
                    return Ok(Readiness {
                        attempts,
                        elapsed: started.elapsed(),
                    });
                }
                if seen.is_some() {
                    observed = seen;
                }
            }
            Ok(Err(Error::Api(err))) if err.is_auth() => return Err(err.into()),
            Ok(Err(err)) => {
                log::warn!("Attempt {}/{} failed: {}", attempts, config.attempts, err);
                observer(attempts, None);
            }
            Err(_) => {
                log::warn!("Attempt {} hit the readiness deadline", attempts);
                observer(attempts, None);
                break;
            }
        }

        if attempts < config.attempts {
            let pause = config
                .delay
                .min(config.timeout.saturating_sub(started.elapsed()));
            tokio::time::sleep(pause).await;
        }
    }

    Err(Error::ReadinessTimeout {
        expected: target.to_string(),
        observed: observed.map(|v| v.to_string()),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockPostmanClient;
    use crate::error::ApiError;

    fn fast(attempts: u32) -> PollConfig {
        PollConfig {
            attempts,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(30),
        }
    }

    fn v(raw: &str) -> ReleaseVersion {
        ReleaseVersion::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_ready_on_first_attempt() {
        let mock = MockPostmanClient::new()
            .with_collection_names(["UDNS Collection v1.2.3"])
            .await;

        let ready = wait_for_version(&mock, "c1", &v("1.2.3"), &fast(10), |_, _| {})
            .await
            .unwrap();
        assert_eq!(ready.attempts, 1);
    }

    #[tokio::test]
    async fn test_ready_after_lag() {
        let mock = MockPostmanClient::new()
            .with_collection_names(["UDNS v1.2.2", "UDNS v1.2.2", "UDNS v1.2.3"])
            .await;

        let mut seen = Vec::new();
        let ready = wait_for_version(&mock, "c1", &v("v1.2.3"), &fast(10), |n, ver| {
            seen.push((n, ver.map(ToString::to_string)))
        })
        .await
        .unwrap();

        assert_eq!(ready.attempts, 3);
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], (3, Some("1.2.3".to_string())));
    }

    #[tokio::test]
    async fn test_stale_version_exhausts_attempts() {
        let mock = MockPostmanClient::new()
            .with_collection_names(["UDNS Collection v1.2.2"])
            .await;

        let err = wait_for_version(&mock, "c1", &v("1.2.3"), &fast(10), |_, _| {})
            .await
            .unwrap_err();

        match err {
            Error::ReadinessTimeout {
                expected,
                observed,
                attempts,
            } => {
                assert_eq!(expected, "1.2.3");
                assert_eq!(observed.as_deref(), Some("1.2.2"));
                assert_eq!(attempts, 10);
            }
            other => panic!("Expected ReadinessTimeout, got {other:?}"),
        }
        assert_eq!(mock.poll_count().await, 10);
    }

    #[tokio::test]
    async fn test_transient_error_counts_as_attempt() {
        let mock = MockPostmanClient::new()
            .with_collection_names(["UDNS v1.2.3"])
            .await
            .with_collection_error(ApiError::ServerError {
                status: 503,
                body: String::new(),
            })
            .await;

        let ready = wait_for_version(&mock, "c1", &v("1.2.3"), &fast(5), |_, _| {})
            .await
            .unwrap();
        assert_eq!(ready.attempts, 2);
    }

    #[tokio::test]
    async fn test_auth_error_aborts() {
        let mock = MockPostmanClient::new()
            .with_collection_names(["UDNS v1.2.3"])
            .await
            .with_collection_error(ApiError::Unauthorized)
            .await;

        let err = wait_for_version(&mock, "c1", &v("1.2.3"), &fast(5), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Unauthorized)));
        assert_eq!(mock.poll_count().await, 1);
    }

    #[tokio::test]
    async fn test_unversioned_name_reports_no_observation() {
        let mock = MockPostmanClient::new()
            .with_collection_names(["UDNS Collection"])
            .await;

        let err = wait_for_version(&mock, "c1", &v("1.0.0"), &fast(2), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ReadinessTimeout {
                observed: None,
                attempts: 2,
                ..
            }
        ));
    }
}
