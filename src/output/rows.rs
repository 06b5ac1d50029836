//! Display rows and renderings for each command report

use std::fmt::Write as _;
use std::path::Path;

use colored::Colorize;
use tabled::Tabled;

use super::Report;
use crate::cli::convert::ConvertReport;
use crate::cli::publish::{PublishAction, PublishReport};
use crate::cli::release::ReleaseReport;
use crate::cli::status::StatusReport;
use crate::postman::sanitize::SanitizeReport;
use crate::postman::validate::ValidationReport;

/// File name for display, falling back to the full path
fn short(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Validation row
#[derive(Debug, Clone, Tabled)]
pub struct ValidationRow {
    #[tabled(rename = "FILE")]
    pub file: String,
    #[tabled(rename = "KIND")]
    pub kind: String,
    #[tabled(rename = "STATUS")]
    pub status: String,
}

impl Report for ValidationReport {
    type Row = ValidationRow;

    fn rows(&self) -> Vec<ValidationRow> {
        self.files
            .iter()
            .map(|f| ValidationRow {
                file: f.path.display().to_string(),
                kind: f.kind.to_string(),
                status: if f.is_valid() {
                    "valid".to_string()
                } else {
                    format!("{} issue(s)", f.issues.len())
                },
            })
            .collect()
    }

    fn pretty(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            if file.is_valid() {
                let _ = writeln!(out, "{} {}", "✓".green(), file.path.display());
                continue;
            }
            let _ = writeln!(out, "{} {}", "✗".red(), file.path.display());
            for issue in &file.issues {
                let at = if issue.pointer.is_empty() {
                    "(root)"
                } else {
                    issue.pointer.as_str()
                };
                let _ = writeln!(out, "    {} {}", at.dimmed(), issue.message);
            }
        }

        let total = self.files.len();
        let invalid = self.invalid_count();
        if invalid == 0 {
            let _ = write!(out, "{} file(s) valid", total);
        } else {
            let _ = write!(
                out,
                "{}",
                format!("{} of {} file(s) failed validation", invalid, total).red()
            );
        }
        out
    }
}

/// Sanitizer row
#[derive(Debug, Clone, Tabled)]
pub struct SanitizeRow {
    #[tabled(rename = "FILE")]
    pub file: String,
    #[tabled(rename = "STATUS")]
    pub status: String,
    #[tabled(rename = "FIELDS REMOVED")]
    pub removed: usize,
    #[tabled(rename = "NAME")]
    pub name: String,
}

impl SanitizeReport {
    fn status_word(&self, changed: bool) -> &'static str {
        match (changed, self.written) {
            (false, _) => "unchanged",
            (true, true) => "modified",
            (true, false) => "needs sanitizing",
        }
    }
}

impl Report for SanitizeReport {
    type Row = SanitizeRow;

    fn rows(&self) -> Vec<SanitizeRow> {
        self.files
            .iter()
            .map(|f| SanitizeRow {
                file: f.path.display().to_string(),
                status: self.status_word(f.changed).to_string(),
                removed: f.changes.removed_fields,
                name: f
                    .changes
                    .renamed
                    .as_ref()
                    .map(|(_, after)| after.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn pretty(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            let mark = match (file.changed, self.written) {
                (false, _) => "○".dimmed(),
                (true, true) => "✓".green(),
                (true, false) => "✗".red(),
            };
            let _ = write!(
                out,
                "{} {} ({})",
                mark,
                file.path.display(),
                self.status_word(file.changed)
            );
            if file.changes.removed_fields > 0 {
                let _ = write!(out, ", {} field(s) removed", file.changes.removed_fields);
            }
            if let Some((before, after)) = &file.changes.renamed {
                let _ = write!(out, ", renamed '{}' -> '{}'", before, after);
            }
            out.push('\n');
        }

        let changed = self.changed_count();
        let _ = write!(
            out,
            "{} modified, {} unchanged",
            changed,
            self.files.len() - changed
        );
        out
    }
}

/// Published object row
#[derive(Debug, Clone, Tabled)]
pub struct PublishRow {
    #[tabled(rename = "KIND")]
    pub kind: String,
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "ACTION")]
    pub action: String,
    #[tabled(rename = "UID")]
    pub uid: String,
}

impl Report for PublishReport {
    type Row = PublishRow;

    fn rows(&self) -> Vec<PublishRow> {
        self.published
            .iter()
            .map(|p| PublishRow {
                kind: p.kind.to_string(),
                name: p.name.clone(),
                action: match p.action {
                    PublishAction::Created => "created".to_string(),
                    PublishAction::Updated => "updated".to_string(),
                },
                uid: p.remote.display_id().to_string(),
            })
            .collect()
    }

    fn pretty(&self) -> String {
        let mut out = String::new();
        for p in &self.published {
            let verb = match p.action {
                PublishAction::Created => "Created",
                PublishAction::Updated => "Updated",
            };
            let _ = write!(
                out,
                "{} {} {} '{}' ({}) from {}",
                "✓".green(),
                verb,
                p.kind,
                p.name.bold(),
                p.remote.display_id().cyan(),
                short(&p.path)
            );
            if let Some(n) = p.secret_values.filter(|n| *n > 0) {
                let _ = write!(out, ", {} secret value(s)", n);
            }
            out.push('\n');
        }
        let _ = write!(
            out,
            "Published {} object(s) as v{}",
            self.published.len(),
            self.version
        );
        out
    }
}

/// Label and value row, for summaries
#[derive(Debug, Clone, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "ITEM")]
    pub item: String,
    #[tabled(rename = "VALUE")]
    pub value: String,
}

impl SummaryRow {
    fn new(item: impl Into<String>, value: impl ToString) -> Self {
        Self {
            item: item.into(),
            value: value.to_string(),
        }
    }
}

impl Report for ConvertReport {
    type Row = SummaryRow;

    fn rows(&self) -> Vec<SummaryRow> {
        let s = &self.stats;
        let mut rows = vec![
            SummaryRow::new("output", self.output.display()),
            SummaryRow::new("version", &self.version),
            SummaryRow::new("readiness attempts", self.readiness_attempts),
            SummaryRow::new("operations", s.operations),
            SummaryRow::new("request bodies removed", s.request_bodies_removed),
            SummaryRow::new("operationIds added", s.operation_ids_added),
            SummaryRow::new("operationIds renamed", s.operation_ids_renamed),
            SummaryRow::new("parameter schemas added", s.parameter_schemas_added),
            SummaryRow::new("request schemas added", s.request_schemas_added),
            SummaryRow::new("response schemas added", s.response_schemas_added),
            SummaryRow::new("vendor keys removed", s.vendor_keys_removed),
        ];
        rows.extend(
            self.warnings
                .iter()
                .map(|w| SummaryRow::new("skipped", w)),
        );
        rows
    }

    fn pretty(&self) -> String {
        let s = &self.stats;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} Wrote {} ({} operations, v{})",
            "✓".green(),
            self.output.display().to_string().cyan(),
            s.operations,
            self.version
        );
        let _ = writeln!(
            out,
            "  collection ready after {} attempt(s)",
            self.readiness_attempts
        );
        let _ = writeln!(
            out,
            "  {} request bodies removed, {} operationIds added, {} renamed",
            s.request_bodies_removed, s.operation_ids_added, s.operation_ids_renamed
        );
        let _ = write!(
            out,
            "  schemas added: {} parameter, {} request, {} response",
            s.parameter_schemas_added, s.request_schemas_added, s.response_schemas_added
        );
        for warning in &self.warnings {
            let _ = write!(out, "\n{} skipped {}", "⚠".yellow(), warning);
        }
        out
    }
}

impl Report for ReleaseReport {
    type Row = SummaryRow;

    fn rows(&self) -> Vec<SummaryRow> {
        let mut rows: Vec<SummaryRow> = self
            .publish
            .published
            .iter()
            .map(|p| SummaryRow::new(format!("{} '{}'", p.kind, p.name), p.remote.display_id()))
            .collect();
        rows.extend(self.convert.rows());
        rows
    }

    fn pretty(&self) -> String {
        format!("{}\n{}", self.publish.pretty(), self.convert.pretty())
    }
}

impl Report for StatusReport {
    type Row = SummaryRow;

    fn rows(&self) -> Vec<SummaryRow> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        vec![
            SummaryRow::new(
                "settings file",
                self.settings_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(defaults)".to_string()),
            ),
            SummaryRow::new("api base url", &self.api_base_url),
            SummaryRow::new("server url", &self.server_url),
            SummaryRow::new("output path", self.output_path.display()),
            SummaryRow::new("POSTMAN_API_KEY", opt(&self.api_key)),
            SummaryRow::new("POSTMAN_COLLECTION_ID", opt(&self.collection_id)),
            SummaryRow::new("POSTMAN_WORKSPACE_ID", opt(&self.workspace_id)),
            SummaryRow::new("POSTMAN_ENVIRONMENT_ID", opt(&self.environment_id)),
            SummaryRow::new("release version", opt(&self.release_version)),
        ]
    }

    fn pretty(&self) -> String {
        let mut out = format!("{}\n\n", "udns-postman Configuration Status".bold());

        match (&self.settings_error, &self.settings_file) {
            (Some(err), _) => {
                let _ = writeln!(out, "{} Settings: {}", "✗".red(), err);
            }
            (None, Some(path)) => {
                let _ = writeln!(out, "{} Settings file: {}", "✓".green(), path.display());
            }
            (None, None) => {
                let _ = writeln!(out, "{} No settings file, using defaults", "○".dimmed());
            }
        }
        let _ = writeln!(out, "  API base: {}", self.api_base_url.cyan());
        let _ = writeln!(out, "  OpenAPI server: {}", self.server_url.cyan());
        let _ = writeln!(out, "  Output: {}\n", self.output_path.display());

        match &self.api_key {
            Some(masked) => {
                let _ = writeln!(out, "{} POSTMAN_API_KEY set ({})", "✓".green(), masked);
            }
            None => {
                let _ = writeln!(out, "{} POSTMAN_API_KEY not set", "✗".red());
            }
        }
        for (name, value) in [
            ("POSTMAN_COLLECTION_ID", &self.collection_id),
            ("POSTMAN_WORKSPACE_ID", &self.workspace_id),
            ("POSTMAN_ENVIRONMENT_ID", &self.environment_id),
        ] {
            match value {
                Some(v) => {
                    let _ = writeln!(out, "{} {}: {}", "✓".green(), name, v);
                }
                None => {
                    let _ = writeln!(out, "{} {} not set", "○".dimmed(), name);
                }
            }
        }

        match (&self.release_version, &self.release_version_error) {
            (Some(v), _) => {
                let _ = write!(out, "{} Release version: v{}", "✓".green(), v);
            }
            (None, Some(err)) => {
                let _ = write!(out, "{} {}", "✗".red(), err);
            }
            (None, None) => {}
        }

        if self.is_ready() {
            let _ = write!(out, "\n\n{} Ready to publish and convert", "✓".green());
        } else {
            let _ = write!(
                out,
                "\n\n{} Not ready: needs an API key, a release version and a collection or workspace ID",
                "○".dimmed()
            );
        }
        out
    }
}
