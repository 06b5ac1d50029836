//! Release command implementation: publish, then convert, with one version

use std::path::Path;

use serde::Serialize;

use crate::cli::CommandContext;
use crate::cli::convert::{self, ConvertReport};
use crate::cli::publish::{self, PublishReport};
use crate::client::PostmanApi;
use crate::config::{Credentials, ENV_COLLECTION_ID, Settings};
use crate::error::{ConfigError, Result};
use crate::output;
use crate::postman::DocumentKind;
use crate::release::ReleaseVersion;

/// Result of a release run
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReport {
    pub publish: PublishReport,
    pub convert: ConvertReport,
}

/// The collection to convert: the configured ID, or the one publish created
fn collection_to_convert<'a>(creds: &'a Credentials, report: &'a PublishReport) -> Result<&'a str> {
    if let Some(id) = creds.collection_id.as_deref() {
        return Ok(id);
    }
    report
        .published
        .iter()
        .filter(|p| p.kind == DocumentKind::Collection)
        .find_map(|p| p.remote.uid.as_deref().or(p.remote.id.as_deref()))
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "No collection was published and {} is not set",
                ENV_COLLECTION_ID
            ))
            .into()
        })
}

/// Publish `dir` and convert the published collection
pub async fn release<A>(
    api: &A,
    dir: &Path,
    creds: &Credentials,
    version: &ReleaseVersion,
    settings: &Settings,
) -> Result<ReleaseReport>
where
    A: PostmanApi + ?Sized,
{
    let publish = publish::publish_dir(api, dir, creds, version).await?;
    let collection_id = collection_to_convert(creds, &publish)?;
    let convert = convert::convert(api, collection_id, version, settings).await?;
    Ok(ReleaseReport { publish, convert })
}

/// Run the release command
pub async fn run(ctx: &CommandContext, dir: &Path, version: &ReleaseVersion) -> Result<()> {
    let report = release(
        ctx.client.as_ref(),
        dir,
        &ctx.credentials,
        version,
        &ctx.settings,
    )
    .await?;
    output::print(&report, ctx.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockPostmanClient;
    use crate::config::PollSettings;
    use serde_json::json;
    use tempfile::tempdir;

    fn settings(output: &Path) -> Settings {
        Settings {
            output_path: output.to_path_buf(),
            poll: PollSettings {
                attempts: 3,
                delay_secs: 0,
                timeout_secs: 30,
            },
            ..Default::default()
        }
    }

    fn write_collection(dir: &Path) {
        let doc = json!({
            "info": {
                "name": "UDNS Collection",
                "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
            },
            "item": []
        });
        std::fs::write(
            dir.join("udns.postman_collection.json"),
            serde_json::to_string_pretty(&doc).unwrap(),
        )
        .unwrap();
    }

    fn openapi() -> serde_json::Value {
        json!({"openapi": "3.0.0", "info": {}, "paths": {}})
    }

    #[tokio::test]
    async fn test_release_uses_one_version_for_both_steps() {
        let temp = tempdir().unwrap();
        write_collection(temp.path());
        let out = temp.path().join("udns_openapi.yml");
        let mock = MockPostmanClient::new()
            .with_collection_names(["UDNS Collection v1.2.3"])
            .await
            .with_transformation(openapi())
            .await;
        let creds = Credentials {
            api_key: Some("k".into()),
            collection_id: Some("c-1".into()),
            ..Default::default()
        };
        let version = ReleaseVersion::parse("v1.2.3").unwrap();

        let report = release(&mock, temp.path(), &creds, &version, &settings(&out))
            .await
            .unwrap();

        assert_eq!(report.publish.version, "1.2.3");
        assert_eq!(report.convert.version, "1.2.3");
        assert!(out.exists());

        let methods: Vec<_> = mock
            .captured_requests()
            .await
            .iter()
            .map(|r| r.method)
            .collect();
        assert_eq!(
            methods,
            vec!["update_collection", "get_collection", "transform_collection"]
        );
    }

    #[tokio::test]
    async fn test_release_converts_newly_created_collection() {
        let temp = tempdir().unwrap();
        write_collection(temp.path());
        let out = temp.path().join("udns_openapi.yml");
        let mock = MockPostmanClient::new()
            .with_collection_names(["UDNS Collection v2.0.0"])
            .await
            .with_transformation(openapi())
            .await;
        let creds = Credentials {
            api_key: Some("k".into()),
            workspace_id: Some("ws-1".into()),
            ..Default::default()
        };
        let version = ReleaseVersion::parse("2.0.0").unwrap();

        release(&mock, temp.path(), &creds, &version, &settings(&out))
            .await
            .unwrap();

        let captured = mock.captured_requests().await;
        assert_eq!(captured[1].method, "get_collection");
        assert_eq!(captured[1].target, "0000-new-collection");
    }
}
