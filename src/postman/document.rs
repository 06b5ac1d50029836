//! Collection and environment files on disk

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{InputError, Result};

/// The two kinds of Postman document kept in the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Collection,
    Environment,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Collection, DocumentKind::Environment];

    /// File name suffix that identifies this kind
    pub fn suffix(&self) -> &'static str {
        match self {
            DocumentKind::Collection => ".postman_collection.json",
            DocumentKind::Environment => ".postman_environment.json",
        }
    }

    /// Recognise a file by its name
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Self::ALL.into_iter().find(|kind| name.ends_with(kind.suffix()))
    }

    /// JSON pointer to the display name inside a document of this kind
    pub fn name_pointer(&self) -> &'static str {
        match self {
            DocumentKind::Collection => "/info/name",
            DocumentKind::Environment => "/name",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Collection => write!(f, "collection"),
            DocumentKind::Environment => write!(f, "environment"),
        }
    }
}

/// A collection or environment file found in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostmanFile {
    pub path: PathBuf,
    pub kind: DocumentKind,
}

impl PostmanFile {
    /// Read the raw text of the file
    pub fn read(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    /// Parse text read from this file, attributing failures to its path
    pub fn parse(&self, contents: &str) -> Result<Value> {
        serde_json::from_str(contents).map_err(|e| {
            InputError::InvalidJson {
                path: self.path.clone(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Read and parse the document
    pub fn load(&self) -> Result<Value> {
        let contents = self.read()?;
        self.parse(&contents)
    }
}

/// Recursively find every collection and environment file under `dir`,
/// sorted by path.
pub fn discover(dir: &Path) -> Result<Vec<PostmanFile>> {
    if !dir.is_dir() {
        return Err(InputError::DirectoryNotFound(dir.to_path_buf()).into());
    }

    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{}/**/*.postman_*.json", escaped);
    let paths = glob::glob(&pattern)
        .map_err(|e| crate::error::Error::Other(format!("Bad search pattern: {}", e)))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => {
                if let Some(kind) = DocumentKind::from_path(&path) {
                    files.push(PostmanFile { path, kind });
                }
            }
            Ok(_) => {}
            Err(e) => log::warn!("Skipping unreadable path {}: {}", e.path().display(), e),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    log::debug!("Discovered {} Postman file(s) under {}", files.len(), dir.display());
    Ok(files)
}

/// Display name of a document
pub fn display_name(doc: &Value, kind: DocumentKind) -> Option<&str> {
    doc.pointer(kind.name_pointer()).and_then(Value::as_str)
}

/// Overwrite the display name of a document; returns false when the document
/// has no name field to update
pub fn set_display_name(doc: &mut Value, kind: DocumentKind, name: String) -> bool {
    match doc.pointer_mut(kind.name_pointer()) {
        Some(slot) if slot.is_string() => {
            *slot = Value::String(name);
            true
        }
        _ => false,
    }
}

/// Typed view of an environment document
#[derive(Debug, Clone, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnvVariable>,
}

/// A single environment variable. Values are never read.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvVariable {
    pub key: String,
    #[serde(rename = "type", default)]
    pub var_type: Option<String>,
}

impl EnvVariable {
    pub fn is_secret(&self) -> bool {
        self.var_type.as_deref() == Some("secret")
    }
}

impl Environment {
    /// Keys of the variables flagged as secret
    pub fn secret_keys(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|v| v.is_secret())
            .map(|v| v.key.as_str())
    }
}
