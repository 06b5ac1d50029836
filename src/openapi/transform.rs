//! Post-processing rules applied to Postman's OpenAPI rendering
//!
//! Postman's converter leaves gaps that code generators trip over: bodies on
//! GET/DELETE, `{{baseUrl}}` servers, missing operation IDs, bare examples
//! without schemas and responses with nothing to deserialize into. Each rule
//! below closes one of those gaps. Rules only look at the node they fix, so
//! their order does not matter, with one exception: vendor keys are stripped
//! from the raw JSON before the typed IR is built.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::model::{
    Method, OpenApiDocument, Operation, Parameter, PathEntry, Referenceable, Response, Server,
    is_json_media,
};
use super::warning::TransformWarning;
use crate::error::Result;

/// Keys Postman adds that mean nothing outside Postman
const POSTMAN_KEYS: [&str; 2] = ["_postman_id", "_exporter_id"];

/// Prefix of Postman's vendor extension keys
const POSTMAN_EXTENSION_PREFIX: &str = "x-postman";

/// Settings for the transform
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub server_url: String,
    pub server_description: String,
}

/// Counts of what each rule changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub operations: usize,
    pub request_bodies_removed: usize,
    pub operation_ids_added: usize,
    pub operation_ids_renamed: usize,
    pub parameter_schemas_added: usize,
    pub request_schemas_added: usize,
    pub response_schemas_added: usize,
    pub vendor_keys_removed: usize,
}

/// Result of post-processing a document
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub document: OpenApiDocument,
    pub warnings: Vec<TransformWarning>,
    pub stats: TransformStats,
}

/// Schema attached wherever a response or request body has none
pub fn default_object_schema() -> Value {
    json!({"type": "object", "additionalProperties": true})
}

/// Run every rule over a raw OpenAPI document
pub fn transform(mut raw: Value, options: &TransformOptions) -> Result<TransformOutcome> {
    let mut stats = TransformStats {
        vendor_keys_removed: strip_vendor_keys(&mut raw),
        ..Default::default()
    };

    let (mut document, warnings) = OpenApiDocument::from_value(raw)?;

    replace_servers(&mut document, options);
    assign_operation_ids(&mut document, &mut stats);

    for (path, item) in document.paths.iter_mut() {
        if let Some(PathEntry::Field(shared)) = item.entries.get_mut("parameters") {
            stats.parameter_schemas_added += fill_shared_parameters(shared);
        }
        for (method, op) in item.operations_mut() {
            if method.forbids_body() && op.request_body.take().is_some() {
                stats.request_bodies_removed += 1;
                log::debug!("Removed requestBody from {} {}", method, path);
            }
            stats.parameter_schemas_added += fill_parameter_schemas(op);
            if method.expects_body() {
                stats.request_schemas_added += wrap_request_examples(op);
            }
            stats.response_schemas_added += fill_response_schemas(op);
        }
    }
    stats.response_schemas_added += fill_component_responses(&mut document);

    stats.operations = document.operation_count();
    for warning in &warnings {
        log::warn!("Left unprocessed: {}", warning);
    }

    Ok(TransformOutcome {
        document,
        warnings,
        stats,
    })
}

/// Recursively remove Postman bookkeeping keys and `x-postman*` extensions
pub fn strip_vendor_keys(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| {
                !POSTMAN_KEYS.contains(&key.as_str()) && !key.starts_with(POSTMAN_EXTENSION_PREFIX)
            });
            let mut removed = before - map.len();
            for child in map.values_mut() {
                removed += strip_vendor_keys(child);
            }
            removed
        }
        Value::Array(items) => items.iter_mut().map(strip_vendor_keys).sum(),
        _ => 0,
    }
}

/// Swap whatever servers Postman emitted for the real API host
pub fn replace_servers(document: &mut OpenApiDocument, options: &TransformOptions) {
    document.servers = vec![Server {
        url: options.server_url.clone(),
        description: Some(options.server_description.clone()),
        extra: Default::default(),
    }];
}

/// `<method>_<path>` with separators and braces folded into single underscores
pub fn synthesize_operation_id(method: Method, path: &str) -> String {
    let raw = format!("{}_{}", method.as_str(), path);
    let mut id = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = if matches!(ch, '/' | '{' | '}') { '_' } else { ch };
        if ch == '_' && id.ends_with('_') {
            continue;
        }
        id.push(ch);
    }
    id.trim_matches('_').to_string()
}

/// Append `_2`, `_3`, ... until `base` is not in `taken`
fn claim_unique(base: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Give every operation a unique, non-empty operationId.
///
/// IDs already present are claimed first, in document order, so a generated
/// ID never displaces one that Postman emitted.
pub fn assign_operation_ids(document: &mut OpenApiDocument, stats: &mut TransformStats) {
    let mut taken = HashSet::new();

    for (path, item) in document.paths.iter_mut() {
        for (method, op) in item.operations_mut() {
            let Some(existing) = op.id().map(str::to_string) else {
                continue;
            };
            let unique = claim_unique(&existing, &mut taken);
            if unique != existing {
                log::info!(
                    "Renamed duplicate operationId '{}' to '{}' on {} {}",
                    existing,
                    unique,
                    method,
                    path
                );
                stats.operation_ids_renamed += 1;
                op.operation_id = Some(unique);
            }
        }
    }

    for (path, item) in document.paths.iter_mut() {
        for (method, op) in item.operations_mut() {
            if op.id().is_some() {
                continue;
            }
            let id = claim_unique(&synthesize_operation_id(method, path), &mut taken);
            log::debug!("Added operationId '{}' for {} {}", id, method, path);
            op.operation_id = Some(id);
            stats.operation_ids_added += 1;
        }
    }
}

/// Parameters get `{type: string}` when schemaless; path parameters are
/// always required
fn fill_parameter_schemas(op: &mut Operation) -> usize {
    fill_parameters(&mut op.parameters)
}

/// Same as for operations, for the parameters shared by a whole path. Left
/// as is when the list does not parse.
fn fill_shared_parameters(shared: &mut Value) -> usize {
    let Ok(mut params) = serde_json::from_value::<Vec<Parameter>>(shared.clone()) else {
        return 0;
    };
    let added = fill_parameters(&mut params);
    if let Ok(updated) = serde_json::to_value(&params) {
        *shared = updated;
    }
    added
}

fn fill_parameters(params: &mut [Parameter]) -> usize {
    let mut added = 0;
    for param in params.iter_mut().filter(|p| !p.is_reference()) {
        if param.schema.as_ref().is_none_or(is_empty_schema) {
            param.schema = Some(json!({"type": "string"}));
            added += 1;
        }
        if param.location.as_deref() == Some("path") {
            param.required = Some(true);
        }
    }
    added
}

/// JSON request bodies without a schema get one, absorbing a bare example
fn wrap_request_examples(op: &mut Operation) -> usize {
    let Some(body) = op.request_body.as_mut().filter(|b| !b.is_reference()) else {
        return 0;
    };

    let mut added = 0;
    for (media_type, media) in body.content.iter_mut() {
        if !is_json_media(media_type) || media.schema.as_ref().is_some_and(|s| !is_empty_schema(s))
        {
            continue;
        }
        let mut schema = default_object_schema();
        if let Some(example) = media.example.take() {
            schema["example"] = example;
        }
        media.schema = Some(schema);
        added += 1;
    }
    added
}

/// Every inline response of an operation ends up declaring a schema.
/// `$ref` responses are covered through `components.responses`.
fn fill_response_schemas(op: &mut Operation) -> usize {
    op.responses
        .values_mut()
        .filter(|r| !r.is_reference())
        .map(fill_response)
        .sum()
}

/// Same rule for the reusable responses operations point at. An entry that
/// does not parse as a response is left as is.
fn fill_component_responses(document: &mut OpenApiDocument) -> usize {
    let Some(Value::Object(responses)) = document
        .extra
        .get_mut("components")
        .and_then(|c| c.get_mut("responses"))
    else {
        return 0;
    };

    let mut added = 0;
    for (name, entry) in responses.iter_mut() {
        let Ok(mut response) = Response::deserialize(&*entry) else {
            log::debug!("Leaving unreadable component response '{}' alone", name);
            continue;
        };
        if response.is_reference() {
            continue;
        }
        let filled = fill_response(&mut response);
        if filled == 0 {
            continue;
        }
        if let Ok(updated) = serde_json::to_value(&response) {
            *entry = updated;
            added += filled;
        }
    }
    added
}

/// Content-less responses get an `application/json` entry. JSON media get the
/// generic object schema; any other media type gets `{type: string}`, since
/// an object schema cannot describe a plain-text or binary payload.
fn fill_response(response: &mut Response) -> usize {
    if response.content.is_empty() {
        response
            .content
            .insert("application/json".to_string(), Default::default());
    }
    let mut added = 0;
    for (media_type, media) in response.content.iter_mut() {
        if media.schema.as_ref().is_some_and(|s| !is_empty_schema(s)) {
            continue;
        }
        media.schema = Some(if is_json_media(media_type) {
            default_object_schema()
        } else {
            json!({"type": "string"})
        });
        added += 1;
    }
    added
}

fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> TransformOptions {
        TransformOptions {
            server_url: "https://api.ultradns.com".to_string(),
            server_description: "Primary UltraDNS API".to_string(),
        }
    }

    fn postman_rendering() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "UDNS Collection", "version": "1.0.0", "_postman_id": "abc"},
            "servers": [{"url": "{{baseUrl}}"}],
            "paths": {
                "/v3/zones": {
                    "get": {
                        "summary": "List zones",
                        "requestBody": {"content": {"application/json": {"example": {"q": "name:example"}}}},
                        "responses": {"200": {"description": "OK", "content": {"application/json": {"example": {"zones": []}}}}}
                    },
                    "post": {
                        "summary": "Create zone",
                        "x-postman-request-id": "r-1",
                        "requestBody": {"content": {"application/json": {"example": {"properties": {"name": "example.com."}}}}},
                        "responses": {"201": {"description": "Created"}}
                    }
                },
                "/v3/zones/{zoneName}": {
                    "parameters": [{"name": "zoneName", "in": "path"}],
                    "get": {
                        "parameters": [{"name": "zoneName", "in": "path"}],
                        "requestBody": {"content": {"application/json": {"example": {"ignored": true}}}},
                        "responses": {"200": {"description": "OK"}}
                    },
                    "delete": {
                        "operationId": "deleteZone",
                        "requestBody": {"content": {"application/json": {}}},
                        "responses": {"204": {"description": "Deleted"}}
                    },
                    "patch": {
                        "requestBody": {"content": {"application/json": {}}},
                        "responses": {
                            "200": {"description": "OK", "content": {"text/plain": {}}},
                            "default": {"$ref": "#/components/responses/Error"}
                        }
                    }
                }
            },
            "components": {"responses": {"Error": {"description": "Error"}}}
        })
    }

    fn run() -> TransformOutcome {
        transform(postman_rendering(), &options()).unwrap()
    }

    #[test]
    fn test_get_and_delete_lose_request_bodies() {
        let outcome = run();
        for (path, method, op) in outcome.document.operations() {
            if method.forbids_body() {
                assert!(op.request_body.is_none(), "{method} {path} kept a body");
            }
        }
        assert_eq!(outcome.stats.request_bodies_removed, 3);
    }

    #[test]
    fn test_two_gets_with_example_bodies() {
        let raw = json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/a": {"get": {"requestBody": {"content": {"application/json": {"example": {"x": 1}}}}, "responses": {}}},
                "/b": {"get": {"requestBody": {"content": {"application/json": {"example": {"y": 2}}}}, "responses": {}}}
            }
        });
        let outcome = transform(raw, &options()).unwrap();
        let bodies = outcome
            .document
            .operations()
            .filter(|(_, _, op)| op.request_body.is_some())
            .count();
        assert_eq!(bodies, 0);
        assert_eq!(outcome.stats.request_bodies_removed, 2);
    }

    #[test]
    fn test_servers_replaced() {
        let outcome = run();
        assert_eq!(outcome.document.servers.len(), 1);
        assert_eq!(outcome.document.servers[0].url, "https://api.ultradns.com");
        assert_eq!(
            outcome.document.servers[0].description.as_deref(),
            Some("Primary UltraDNS API")
        );
    }

    #[test]
    fn test_operation_ids_present_and_unique() {
        let outcome = run();
        let ids: Vec<&str> = outcome
            .document
            .operations()
            .map(|(_, _, op)| op.id().unwrap())
            .collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(unique.len(), ids.len());
        assert!(ids.contains(&"get_v3_zones"));
        assert!(ids.contains(&"get_v3_zones_zoneName"));
        assert!(ids.contains(&"deleteZone"));
        assert_eq!(outcome.stats.operation_ids_added, 4);
    }

    #[test]
    fn test_synthesize_operation_id() {
        assert_eq!(synthesize_operation_id(Method::Get, "/v3/zones"), "get_v3_zones");
        assert_eq!(
            synthesize_operation_id(Method::Delete, "/v3/zones/{zoneName}/rrsets/{rrType}"),
            "delete_v3_zones_zoneName_rrsets_rrType"
        );
        assert_eq!(synthesize_operation_id(Method::Get, "/"), "get");
    }

    #[test]
    fn test_colliding_ids_get_suffixes() {
        let raw = json!({
            "openapi": "3.0.0",
            "info": {},
            "paths": {
                "/v3/zones/": {"get": {"responses": {}}},
                "/v3/zones": {"get": {"responses": {}}},
                "/other": {"post": {"operationId": "get_v3_zones", "responses": {}}}
            }
        });
        let outcome = transform(raw, &options()).unwrap();
        let ids: Vec<String> = outcome
            .document
            .operations()
            .map(|(_, _, op)| op.operation_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["get_v3_zones_2", "get_v3_zones_3", "get_v3_zones"]);
    }

    #[test]
    fn test_duplicate_existing_ids_renamed() {
        let raw = json!({
            "openapi": "3.0.0",
            "info": {},
            "paths": {
                "/a": {"get": {"operationId": "fetch", "responses": {}}},
                "/b": {"get": {"operationId": "fetch", "responses": {}}},
                "/c": {"get": {"operationId": "  ", "responses": {}}}
            }
        });
        let outcome = transform(raw, &options()).unwrap();
        let ids: Vec<String> = outcome
            .document
            .operations()
            .map(|(_, _, op)| op.operation_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["fetch", "fetch_2", "get_c"]);
        assert_eq!(outcome.stats.operation_ids_renamed, 1);
    }

    #[test]
    fn test_parameters_get_schema_and_path_required() {
        let outcome = run();
        let value = serde_json::to_value(&outcome.document).unwrap();
        let param = &value["paths"]["/v3/zones/{zoneName}"]["get"]["parameters"][0];
        assert_eq!(param["schema"], json!({"type": "string"}));
        assert_eq!(param["required"], true);

        let shared = &value["paths"]["/v3/zones/{zoneName}"]["parameters"][0];
        assert_eq!(shared["schema"], json!({"type": "string"}));
        assert_eq!(shared["required"], true);
        assert_eq!(outcome.stats.parameter_schemas_added, 2);
    }

    #[test]
    fn test_request_example_wrapped_into_schema() {
        let outcome = run();
        let value = serde_json::to_value(&outcome.document).unwrap();
        let media = &value["paths"]["/v3/zones"]["post"]["requestBody"]["content"]["application/json"];
        assert_eq!(media["schema"]["type"], "object");
        assert_eq!(media["schema"]["additionalProperties"], true);
        assert_eq!(
            media["schema"]["example"],
            json!({"properties": {"name": "example.com."}})
        );
        assert!(media.get("example").is_none());

        let bare = &value["paths"]["/v3/zones/{zoneName}"]["patch"]["requestBody"]["content"]["application/json"];
        assert_eq!(bare["schema"], default_object_schema());
    }

    #[test]
    fn test_every_response_has_schema() {
        let outcome = run();
        let value = serde_json::to_value(&outcome.document).unwrap();

        for (path, method, op) in outcome.document.operations() {
            for (status, response) in &op.responses {
                let resolved = match response.extra.get("$ref").and_then(Value::as_str) {
                    Some(target) => {
                        let pointer = target.trim_start_matches('#');
                        serde_json::from_value::<Response>(value.pointer(pointer).unwrap().clone())
                            .unwrap()
                    }
                    None => response.clone(),
                };
                assert!(!resolved.content.is_empty(), "{method} {path} {status}");
                for media in resolved.content.values() {
                    assert!(media.schema.is_some(), "{method} {path} {status}");
                }
            }
        }

        let patch = &value["paths"]["/v3/zones/{zoneName}"]["patch"]["responses"];
        assert_eq!(patch["200"]["content"]["text/plain"]["schema"]["type"], "string");
        assert_eq!(patch["default"], json!({"$ref": "#/components/responses/Error"}));
    }

    #[test]
    fn test_referenced_component_response_gets_schema() {
        let raw = json!({
            "openapi": "3.0.0",
            "info": {},
            "paths": {
                "/a": {"get": {"responses": {"200": {"$ref": "#/components/responses/Ok"}}}}
            },
            "components": {
                "responses": {
                    "Ok": {"description": "OK"},
                    "Gone": {"$ref": "#/components/responses/Ok"}
                }
            }
        });

        let outcome = transform(raw, &options()).unwrap();
        let value = serde_json::to_value(&outcome.document).unwrap();

        assert_eq!(
            value["paths"]["/a"]["get"]["responses"]["200"],
            json!({"$ref": "#/components/responses/Ok"})
        );
        let ok = &value["components"]["responses"]["Ok"];
        assert_eq!(ok["description"], "OK");
        assert_eq!(ok["content"]["application/json"]["schema"], default_object_schema());
        assert_eq!(
            value["components"]["responses"]["Gone"],
            json!({"$ref": "#/components/responses/Ok"})
        );
        assert_eq!(outcome.stats.response_schemas_added, 1);
    }

    #[test]
    fn test_existing_response_example_kept_beside_schema() {
        let outcome = run();
        let value = serde_json::to_value(&outcome.document).unwrap();
        let media = &value["paths"]["/v3/zones"]["get"]["responses"]["200"]["content"]["application/json"];
        assert_eq!(media["schema"], default_object_schema());
        assert_eq!(media["example"], json!({"zones": []}));
    }

    #[test]
    fn test_vendor_keys_stripped() {
        let outcome = run();
        let text = serde_json::to_string(&outcome.document).unwrap();
        assert!(!text.contains("_postman_id"));
        assert!(!text.contains("x-postman"));
        assert_eq!(outcome.stats.vendor_keys_removed, 2);
    }

    #[test]
    fn test_malformed_operation_does_not_abort() {
        let mut raw = postman_rendering();
        raw["paths"]["/v3/zones"]["put"] = json!({"parameters": "not-a-list", "responses": {}});

        let outcome = transform(raw, &options()).unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].method, "put");
        assert_eq!(outcome.warnings[0].path, "/v3/zones");
        assert_eq!(outcome.document.operation_count(), 5);
        assert!(
            outcome
                .document
                .operations()
                .all(|(_, _, op)| op.id().is_some())
        );

        let value = serde_json::to_value(&outcome.document).unwrap();
        assert_eq!(
            value["paths"]["/v3/zones"]["put"],
            json!({"parameters": "not-a-list", "responses": {}})
        );
    }

    #[test]
    fn test_transform_is_stable() {
        let first = crate::openapi::writer::to_yaml(&run().document).unwrap();
        let second = crate::openapi::writer::to_yaml(&run().document).unwrap();
        assert_eq!(first, second);
    }
}
