//! Metadata stripping for checked-in Postman files
//!
//! Postman stamps exports with identifiers, owners and timestamps that change
//! on every export. Removing them (and the transient version suffix on the
//! name) keeps diffs down to functional edits.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use super::document::{self, DocumentKind, PostmanFile};
use super::version::strip_version;
use crate::error::Result;

/// Keys removed at every depth of a document
pub const METADATA_KEYS: [&str; 11] = [
    "_postman_id",
    "_exporter_id",
    "id",
    "uid",
    "owner",
    "createdAt",
    "updatedAt",
    "lastUpdatedBy",
    "lastRevision",
    "_postman_exported_at",
    "_postman_exported_using",
];

/// What sanitizing one document changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Changes {
    /// Number of metadata keys removed
    pub removed_fields: usize,
    /// Name before and after the version suffix was stripped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed: Option<(String, String)>,
}

/// Recursively drop metadata keys, returning how many were removed
pub fn remove_metadata(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| !METADATA_KEYS.contains(&key.as_str()));
            let mut removed = before - map.len();
            for child in map.values_mut() {
                removed += remove_metadata(child);
            }
            removed
        }
        Value::Array(items) => items.iter_mut().map(remove_metadata).sum(),
        _ => 0,
    }
}

/// Sanitize a parsed document in place
pub fn sanitize_document(doc: &mut Value, kind: DocumentKind) -> Changes {
    let removed_fields = remove_metadata(doc);

    let renamed = document::display_name(doc, kind)
        .map(|name| (name.to_string(), strip_version(name)))
        .filter(|(before, after)| before != after);

    if let Some((_, ref stripped)) = renamed {
        document::set_display_name(doc, kind, stripped.clone());
    }

    Changes {
        removed_fields,
        renamed,
    }
}

/// Canonical on-disk form: two-space indentation, source key order, trailing
/// newline
pub fn render(doc: &Value) -> Result<String> {
    let mut out = serde_json::to_string_pretty(doc)?;
    out.push('\n');
    Ok(out)
}

/// Outcome for a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub kind: DocumentKind,
    /// Whether the canonical form differs from what is on disk
    pub changed: bool,
    #[serde(flatten)]
    pub changes: Changes,
}

/// Outcome for a whole directory
#[derive(Debug, Clone, Serialize)]
pub struct SanitizeReport {
    pub files: Vec<FileOutcome>,
    /// False in check mode, where nothing is written
    pub written: bool,
}

impl SanitizeReport {
    pub fn changed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.changed)
    }

    pub fn changed_count(&self) -> usize {
        self.changed().count()
    }
}

/// Compute the sanitized text for one file without writing it
pub fn sanitize_file(file: &PostmanFile) -> Result<(FileOutcome, String)> {
    let original = file.read()?;
    let mut doc = file.parse(&original)?;
    let changes = sanitize_document(&mut doc, file.kind);
    let rendered = render(&doc)?;

    let outcome = FileOutcome {
        path: file.path.clone(),
        kind: file.kind,
        changed: rendered != original,
        changes,
    };
    Ok((outcome, rendered))
}

/// Sanitize every Postman file under `dir`.
///
/// All files are parsed and rendered before anything is written, so a
/// malformed file aborts the run with the store untouched. With `write`
/// false the report is produced without modifying any file.
pub fn sanitize_dir(dir: &Path, write: bool) -> Result<SanitizeReport> {
    let files = document::discover(dir)?;

    let mut pending = Vec::with_capacity(files.len());
    for file in &files {
        pending.push(sanitize_file(file)?);
    }

    if write {
        for (outcome, rendered) in pending.iter().filter(|(o, _)| o.changed) {
            std::fs::write(&outcome.path, rendered)?;
            log::info!("Sanitized {}", outcome.path.display());
        }
    }

    Ok(SanitizeReport {
        files: pending.into_iter().map(|(outcome, _)| outcome).collect(),
        written: write,
    })
}
