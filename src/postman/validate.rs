//! Schema validation for collection and environment files

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use super::document::{self, DocumentKind, PostmanFile};
use crate::error::{Error, Result};

const COLLECTION_SCHEMA: &str = include_str!("../../schemas/collection.v2.1.0.json");
const ENVIRONMENT_SCHEMA: &str = include_str!("../../schemas/environment.json");

/// A single problem found in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// JSON pointer to the offending value (empty for the document root)
    pub pointer: String,
    pub message: String,
}

/// Validation result for one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub issues: Vec<Issue>,
}

impl FileReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validation result for a directory
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    pub fn invalid(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.is_valid())
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid().count()
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_count() == 0
    }
}

/// Compiled schemas for both document kinds
pub struct SchemaSet {
    collection: jsonschema::Validator,
    environment: jsonschema::Validator,
}

impl SchemaSet {
    /// Compile the bundled schemas
    pub fn bundled() -> Result<Self> {
        Ok(Self {
            collection: compile(COLLECTION_SCHEMA)?,
            environment: compile(ENVIRONMENT_SCHEMA)?,
        })
    }

    fn for_kind(&self, kind: DocumentKind) -> &jsonschema::Validator {
        match kind {
            DocumentKind::Collection => &self.collection,
            DocumentKind::Environment => &self.environment,
        }
    }

    /// Validate a parsed document against the schema for its kind
    pub fn check(&self, doc: &Value, kind: DocumentKind) -> Vec<Issue> {
        self.for_kind(kind)
            .iter_errors(doc)
            .map(|err| Issue {
                pointer: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect()
    }

    /// Parse and validate one file. Unparseable JSON becomes an issue rather
    /// than an error so the rest of the directory is still checked.
    pub fn check_file(&self, file: &PostmanFile) -> Result<FileReport> {
        let contents = file.read()?;
        let issues = match serde_json::from_str::<Value>(&contents) {
            Ok(doc) => self.check(&doc, file.kind),
            Err(e) => vec![Issue {
                pointer: String::new(),
                message: format!("invalid JSON: {}", e),
            }],
        };

        Ok(FileReport {
            path: file.path.clone(),
            kind: file.kind,
            issues,
        })
    }
}

fn compile(source: &str) -> Result<jsonschema::Validator> {
    let schema: Value = serde_json::from_str(source)?;
    jsonschema::draft7::new(&schema)
        .map_err(|e| Error::Other(format!("Bundled schema failed to compile: {}", e)))
}

/// Validate every Postman file under `dir`
pub fn validate_dir(dir: &Path) -> Result<ValidationReport> {
    let files = document::discover(dir)?;
    if files.is_empty() {
        log::warn!("No Postman files found under {}", dir.display());
    }

    let schemas = SchemaSet::bundled()?;
    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let report = schemas.check_file(file)?;
        for issue in &report.issues {
            log::debug!("{} {}: {}", file.path.display(), issue.pointer, issue.message);
        }
        reports.push(report);
    }

    Ok(ValidationReport { files: reports })
}
