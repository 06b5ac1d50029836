//! Publish command implementation
//!
//! Every collection and environment in the directory is sent to Postman with
//! the release version appended to its display name. The suffix only ever
//! exists in the request payload; the files on disk are left as they are.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::CommandContext;
use crate::client::{PostmanApi, PublishedObject};
use crate::config::{Credentials, ENV_COLLECTION_ID, ENV_ENVIRONMENT_ID};
use crate::error::{ConfigError, InputError, Result};
use crate::output;
use crate::postman::document::{self, DocumentKind, Environment, PostmanFile};
use crate::postman::version::append_version;
use crate::release::ReleaseVersion;

/// Whether a remote object was created or replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishAction {
    Created,
    Updated,
}

/// One published document
#[derive(Debug, Clone, Serialize)]
pub struct PublishedFile {
    pub path: PathBuf,
    pub kind: DocumentKind,
    /// Name as sent, including the version suffix
    pub name: String,
    pub action: PublishAction,
    pub remote: PublishedObject,
    /// Environment variables flagged secret, sent with their values as-is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_values: Option<usize>,
}

/// Result of a publish run
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub version: String,
    pub published: Vec<PublishedFile>,
}

/// Where a document of a given kind goes
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target<'a> {
    Update(&'a str),
    Create(&'a str),
}

/// Resolve the target for `kind`. A configured ID can only name one remote
/// object, so it is rejected when the directory holds several of that kind.
fn resolve_target<'a>(creds: &'a Credentials, kind: DocumentKind, count: usize) -> Result<Target<'a>> {
    let (id, env_name) = match kind {
        DocumentKind::Collection => (creds.collection_id.as_deref(), ENV_COLLECTION_ID),
        DocumentKind::Environment => (creds.environment_id.as_deref(), ENV_ENVIRONMENT_ID),
    };

    match id {
        Some(_) if count > 1 => Err(ConfigError::Invalid(format!(
            "{} is set but {} {} files were found",
            env_name, count, kind
        ))
        .into()),
        Some(id) => Ok(Target::Update(id)),
        None => Ok(Target::Create(creds.require_workspace_id()?)),
    }
}

/// Copy of `doc` whose display name carries `version`
fn versioned(file: &PostmanFile, doc: &Value, version: &ReleaseVersion) -> Result<(Value, String)> {
    let base = document::display_name(doc, file.kind)
        .ok_or_else(|| InputError::MissingName(file.path.clone()))?;
    let name = append_version(base, version);

    let mut payload = doc.clone();
    document::set_display_name(&mut payload, file.kind, name.clone());
    Ok((payload, name))
}

/// Publish every Postman file under `dir`.
///
/// All files are parsed before the first request, so a malformed file stops
/// the run without anything being sent. The first failed request aborts.
pub async fn publish_dir<A>(
    api: &A,
    dir: &Path,
    creds: &Credentials,
    version: &ReleaseVersion,
) -> Result<PublishReport>
where
    A: PostmanApi + ?Sized,
{
    let files = document::discover(dir)?;
    if files.is_empty() {
        log::warn!("Nothing to publish under {}", dir.display());
    }

    let count = |kind| files.iter().filter(|f| f.kind == kind).count();
    let collections = count(DocumentKind::Collection);
    let environments = count(DocumentKind::Environment);

    let mut prepared = Vec::with_capacity(files.len());
    for file in &files {
        let doc = file.load()?;
        let (payload, name) = versioned(file, &doc, version)?;
        let same_kind = match file.kind {
            DocumentKind::Collection => collections,
            DocumentKind::Environment => environments,
        };
        let target = resolve_target(creds, file.kind, same_kind)?;
        let secret_values = match file.kind {
            DocumentKind::Environment => Environment::deserialize(&doc).ok().map(|env| {
                let secrets: Vec<&str> = env.secret_keys().collect();
                log::debug!(
                    "Environment '{}' carries {} secret(s): {}",
                    env.name,
                    secrets.len(),
                    secrets.join(", ")
                );
                secrets.len()
            }),
            DocumentKind::Collection => None,
        };
        prepared.push((file, payload, name, target, secret_values));
    }

    let mut published = Vec::with_capacity(prepared.len());
    for (file, payload, name, target, secret_values) in prepared {
        log::info!("Publishing {} '{}'", file.kind, name);
        let (action, remote) = match (file.kind, target) {
            (DocumentKind::Collection, Target::Update(id)) => {
                (PublishAction::Updated, api.update_collection(id, &payload).await?)
            }
            (DocumentKind::Collection, Target::Create(ws)) => {
                (PublishAction::Created, api.create_collection(ws, &payload).await?)
            }
            (DocumentKind::Environment, Target::Update(id)) => {
                (PublishAction::Updated, api.update_environment(id, &payload).await?)
            }
            (DocumentKind::Environment, Target::Create(ws)) => {
                (PublishAction::Created, api.create_environment(ws, &payload).await?)
            }
        };

        published.push(PublishedFile {
            path: file.path.clone(),
            kind: file.kind,
            name,
            action,
            remote,
            secret_values,
        });
    }

    Ok(PublishReport {
        version: version.to_string(),
        published,
    })
}

/// Run the publish command
pub async fn run(ctx: &CommandContext, dir: &Path, version: &ReleaseVersion) -> Result<()> {
    let report = publish_dir(ctx.client.as_ref(), dir, &ctx.credentials, version).await?;
    output::print(&report, ctx.format)
}
