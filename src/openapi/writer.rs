//! YAML output of the finished document

use std::path::Path;

use serde_json::{Number, Value};

use super::model::OpenApiDocument;
use crate::error::Result;

/// Render the document as YAML
pub fn to_yaml(document: &OpenApiDocument) -> Result<String> {
    let json = serde_json::to_value(document)?;
    Ok(serde_yaml::to_string(&yaml_value(json))?)
}

/// serde_json keeps numbers as their source text, which only its own
/// serializer understands, so the tree is rebuilt as YAML values first.
fn yaml_value(value: Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(b),
        Value::Number(n) => yaml_number(&n),
        Value::String(s) => serde_yaml::Value::String(s),
        Value::Array(items) => {
            serde_yaml::Value::Sequence(items.into_iter().map(yaml_value).collect())
        }
        Value::Object(map) => serde_yaml::Value::Mapping(
            map.into_iter()
                .map(|(key, value)| (serde_yaml::Value::String(key), yaml_value(value)))
                .collect(),
        ),
    }
}

/// Integers beyond 64 bits fall back to the nearest float
fn yaml_number(n: &Number) -> serde_yaml::Value {
    if let Some(u) = n.as_u64() {
        u.into()
    } else if let Some(i) = n.as_i64() {
        i.into()
    } else {
        n.as_f64()
            .map_or(serde_yaml::Value::Null, serde_yaml::Value::from)
    }
}

/// Write the document to `path`, creating parent directories.
///
/// The YAML is fully rendered before the file is touched and lands through
/// a sibling temp file and a rename.
pub fn write_yaml(document: &OpenApiDocument, path: &Path) -> Result<()> {
    let contents = to_yaml(document)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let staging = path.with_extension("yml.partial");
    std::fs::write(&staging, contents)?;
    if let Err(e) = std::fs::rename(&staging, path) {
        if let Err(cleanup) = std::fs::remove_file(&staging) {
            log::debug!("Could not remove {}: {}", staging.display(), cleanup);
        }
        return Err(e.into());
    }

    log::info!("Wrote OpenAPI document to {}", path.display());
    Ok(())
}
