//! Typed intermediate representation of an OpenAPI 3.0 document
//!
//! Only the nodes the post-processing rules touch are typed. Everything else
//! rides along in order-preserving `extra` maps so a round trip through the IR
//! never loses content. Schemas stay free-form JSON.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::warning::TransformWarning;
use crate::error::{InputError, Result};

/// HTTP methods that may appear as keys of a path item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl Method {
    /// Recognise a path item key (case-insensitive)
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(Method::Get),
            "put" => Some(Method::Put),
            "post" => Some(Method::Post),
            "delete" => Some(Method::Delete),
            "options" => Some(Method::Options),
            "head" => Some(Method::Head),
            "patch" => Some(Method::Patch),
            "trace" => Some(Method::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
            Method::Patch => "patch",
            Method::Trace => "trace",
        }
    }

    /// GET and DELETE never carry a request body in the output document
    pub fn forbids_body(&self) -> bool {
        matches!(self, Method::Get | Method::Delete)
    }

    /// Methods whose request body examples get wrapped into a schema
    pub fn expects_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_ascii_uppercase())
    }
}

/// Whether a media type key carries JSON
pub fn is_json_media(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Root OpenAPI document
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    pub paths: IndexMap<String, PathItem>,
    /// components, tags, security and anything else at the root
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Server entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// One key of a path item
#[derive(Debug, Clone)]
pub enum PathEntry {
    Operation(Method, Box<Operation>),
    /// summary, description, shared parameters and other non-operation keys
    Field(Value),
}

/// Operations and shared fields for one path, in source order
#[derive(Debug, Clone, Default)]
pub struct PathItem {
    pub entries: IndexMap<String, PathEntry>,
}

impl PathItem {
    /// Iterate mutably over the operations of this path
    pub fn operations_mut(&mut self) -> impl Iterator<Item = (Method, &mut Operation)> {
        self.entries.values_mut().filter_map(|entry| match entry {
            PathEntry::Operation(method, op) => Some((*method, &mut **op)),
            PathEntry::Field(_) => None,
        })
    }

    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        self.entries.values().filter_map(|entry| match entry {
            PathEntry::Operation(method, op) => Some((*method, &**op)),
            PathEntry::Field(_) => None,
        })
    }
}

impl Serialize for PathItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            match entry {
                PathEntry::Operation(_, op) => map.serialize_entry(key, op)?,
                PathEntry::Field(value) => map.serialize_entry(key, value)?,
            }
        }
        map.end()
    }
}

/// A single operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// tags, summary, description and the rest, kept ahead of the typed keys
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    #[serde(
        rename = "operationId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(
        rename = "requestBody",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
}

impl Operation {
    /// The operationId, if present and non-blank
    pub fn id(&self) -> Option<&str> {
        self.operation_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Operation parameter (or a `$ref` to one)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// Request body (or a `$ref` to one)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Response (or a `$ref` to one)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Content for one media type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Nodes that may be replaced by a `$ref`
pub trait Referenceable {
    fn extra(&self) -> &IndexMap<String, Value>;

    fn is_reference(&self) -> bool {
        self.extra().contains_key("$ref")
    }
}

impl Referenceable for Parameter {
    fn extra(&self) -> &IndexMap<String, Value> {
        &self.extra
    }
}

impl Referenceable for RequestBody {
    fn extra(&self) -> &IndexMap<String, Value> {
        &self.extra
    }
}

impl Referenceable for Response {
    fn extra(&self) -> &IndexMap<String, Value> {
        &self.extra
    }
}

impl OpenApiDocument {
    /// Build the IR from raw JSON.
    ///
    /// A root that is not an object, or has no `paths` object, is fatal.
    /// An operation that does not fit the IR is kept verbatim as a plain
    /// field, so no rule touches it, and reported as a warning.
    pub fn from_value(raw: Value) -> Result<(Self, Vec<TransformWarning>)> {
        let Value::Object(root) = raw else {
            return Err(InputError::MalformedOpenApi("document root is not an object".into()).into());
        };

        let mut openapi = None;
        let mut info = Value::Object(Map::new());
        let mut servers = Vec::new();
        let mut paths = None;
        let mut extra = IndexMap::new();
        let mut warnings = Vec::new();

        for (key, value) in root {
            match key.as_str() {
                "openapi" => openapi = value.as_str().map(str::to_string),
                "info" => info = value,
                "servers" => match serde_json::from_value::<Vec<Server>>(value) {
                    Ok(parsed) => servers = parsed,
                    Err(e) => log::debug!("Ignoring unreadable servers list: {}", e),
                },
                "paths" => match value {
                    Value::Object(map) => paths = Some(map),
                    _ => {
                        return Err(
                            InputError::MalformedOpenApi("`paths` is not an object".into()).into(),
                        );
                    }
                },
                _ => {
                    extra.insert(key, value);
                }
            }
        }

        let openapi = openapi
            .ok_or_else(|| InputError::MalformedOpenApi("missing `openapi` version".into()))?;
        let raw_paths =
            paths.ok_or_else(|| InputError::MalformedOpenApi("missing `paths`".into()))?;

        let mut typed_paths = IndexMap::with_capacity(raw_paths.len());
        for (path, item) in raw_paths {
            let Value::Object(fields) = item else {
                warnings.push(TransformWarning::new("*", &path, "path item is not an object"));
                continue;
            };
            let parsed = parse_path_item(&path, fields, &mut warnings);
            typed_paths.insert(path, parsed);
        }

        Ok((
            Self {
                openapi,
                info,
                servers,
                paths: typed_paths,
                extra,
            },
            warnings,
        ))
    }

    /// Every operation in document order with its path
    pub fn operations(&self) -> impl Iterator<Item = (&str, Method, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations()
                .map(move |(method, op)| (path.as_str(), method, op))
        })
    }

    /// Number of operations across all paths
    pub fn operation_count(&self) -> usize {
        self.operations().count()
    }
}

fn parse_path_item(
    path: &str,
    fields: Map<String, Value>,
    warnings: &mut Vec<TransformWarning>,
) -> PathItem {
    let mut entries = IndexMap::with_capacity(fields.len());
    for (key, value) in fields {
        let Some(method) = Method::from_key(&key) else {
            entries.insert(key, PathEntry::Field(value));
            continue;
        };

        match Operation::deserialize(&value) {
            Ok(op) => {
                entries.insert(key, PathEntry::Operation(method, Box::new(op)));
            }
            Err(e) => {
                warnings.push(TransformWarning::new(method.as_str(), path, e.to_string()));
                entries.insert(key, PathEntry::Field(value));
            }
        }
    }
    PathItem { entries }
}
