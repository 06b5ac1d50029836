//! Convert command implementation

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::cli::CommandContext;
use crate::client::PostmanApi;
use crate::client::readiness::wait_for_version;
use crate::config::Settings;
use crate::error::Result;
use crate::openapi::transform::TransformStats;
use crate::openapi::{TransformOptions, TransformWarning, transform, writer};
use crate::output;
use crate::release::ReleaseVersion;

/// Result of a convert run
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub version: String,
    pub output: PathBuf,
    /// Polls needed before the collection reported the version
    pub readiness_attempts: u32,
    pub stats: TransformStats,
    pub warnings: Vec<TransformWarning>,
}

/// Spinner on stderr, hidden when stderr is not a terminal
fn poll_spinner(expected: &ReleaseVersion) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Waiting for collection to report v{}", expected));
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Wait for `collection_id` to carry `version`, fetch its OpenAPI
/// rendering, post-process it and write the YAML.
///
/// Nothing is written unless every step succeeds.
pub async fn convert<A>(
    api: &A,
    collection_id: &str,
    version: &ReleaseVersion,
    settings: &Settings,
) -> Result<ConvertReport>
where
    A: PostmanApi + ?Sized,
{
    let poll = settings.poll.to_config();
    let spinner = poll_spinner(version);
    let readiness = wait_for_version(api, collection_id, version, &poll, |attempt, seen| {
        spinner.set_message(format!(
            "Waiting for collection to report v{} (attempt {}/{}, seen {})",
            version,
            attempt,
            poll.attempts,
            seen.map(|v| format!("v{}", v))
                .unwrap_or_else(|| "nothing".to_string())
        ));
    })
    .await;
    spinner.finish_and_clear();
    let readiness = readiness?;
    log::info!(
        "Collection ready after {} attempt(s) in {:?}",
        readiness.attempts,
        readiness.elapsed
    );

    let raw = api.transform_collection(collection_id).await?;
    let options = TransformOptions {
        server_url: settings.server_url.clone(),
        server_description: settings.server_description.clone(),
    };
    let outcome = transform(raw, &options)?;

    writer::write_yaml(&outcome.document, &settings.output_path)?;

    Ok(ConvertReport {
        version: version.to_string(),
        output: settings.output_path.clone(),
        readiness_attempts: readiness.attempts,
        stats: outcome.stats,
        warnings: outcome.warnings,
    })
}

/// Run the convert command
pub async fn run(ctx: &CommandContext, version: &ReleaseVersion) -> Result<()> {
    let collection_id = ctx.credentials.require_collection_id()?;
    let report = convert(ctx.client.as_ref(), collection_id, version, &ctx.settings).await?;
    output::print(&report, ctx.format)
}
