//! Passes over the assembled model.
//!
//! - package name fallback
//! - pagination detection
//! - auto-populated request ids
//! - reference consistency check

use apigen_model::{Api, ApiState, Field, Message, Typez};
use std::collections::BTreeSet;

use crate::error::ParseError;
use crate::mixins;
use crate::service_config::ServiceConfig;

/// Package of the first non-mixin API in `config`, or of the first service,
/// message or enum of the model.
pub fn update_package_name(api: &mut Api, config: Option<&ServiceConfig>) {
    if let Some(config) = config {
        for entry in &config.apis {
            let Some((package, _)) = entry.name.rsplit_once('.') else {
                continue;
            };
            api.package_name = package.to_string();
            if mixins::well_known(&entry.name).is_none() {
                break;
            }
        }
    }
    if !api.package_name.is_empty() {
        return;
    }
    let fallback = api
        .services()
        .map(|s| s.package.clone())
        .next()
        .or_else(|| api.messages().map(|m| m.package.clone()).next())
        .or_else(|| api.enums().map(|e| e.package.clone()).next());
    if let Some(package) = fallback {
        api.package_name = package;
    }
}

fn is_string_field(message: &Message, json_name: &str) -> bool {
    message
        .fields
        .iter()
        .any(|f| f.json_name == json_name && f.typez == Typez::String && !f.repeated)
}

fn is_page_size_field(f: &Field) -> bool {
    (f.json_name == "pageSize" || f.json_name == "maxResults") && f.typez == Typez::Int32 && !f.repeated
}

/// The items field of a list response, if `output` pairs with `input` as a
/// paginated call.
pub fn pageable_item(input: &Message, output: &Message) -> Option<String> {
    let pageable_request = is_string_field(input, "pageToken") && input.fields.iter().any(is_page_size_field);
    if !pageable_request || !is_string_field(output, "nextPageToken") {
        return None;
    }
    output
        .fields
        .iter()
        .find(|f| f.repeated || f.map)
        .map(|f| f.id.clone())
}

/// Mark paginated methods and their response messages.
pub fn update_method_pagination(state: &mut ApiState) {
    let pageable: Vec<(String, String, String)> = state
        .method_by_id
        .values()
        .filter_map(|m| {
            let input = state.message(&m.input_type_id)?;
            let output = state.message(&m.output_type_id)?;
            let item = pageable_item(input, output)?;
            Some((m.id.clone(), output.id.clone(), item))
        })
        .collect();

    for (method_id, output_id, item) in pageable {
        if let Some(method) = state.method_mut(&method_id) {
            method.is_pageable = true;
        }
        if let Some(output) = state.message_mut(&output_id) {
            output.is_pageable_response = true;
            output.pageable_item = Some(item);
        }
    }
}

/// Mark request id fields that the client fills in when left empty.
///
/// A field qualifies when `publishing.methodSettings` lists it for the
/// method, it is a string annotated as a UUID4, and it is not required.
pub fn update_auto_populated_fields(state: &mut ApiState, config: Option<&ServiceConfig>, uuid4_fields: &BTreeSet<String>) {
    let Some(config) = config else {
        return;
    };
    for settings in config.method_settings() {
        let method_id = format!(".{}", settings.selector);
        let Some(input_id) = state.method(&method_id).map(|m| m.input_type_id.clone()) else {
            tracing::debug!(selector = %settings.selector, "method settings for unknown method");
            continue;
        };
        let Some(input) = state.message_mut(&input_id) else {
            continue;
        };
        for field in input.fields.iter_mut() {
            let listed = settings.auto_populated_fields.iter().any(|n| *n == field.name);
            if listed && uuid4_fields.contains(&field.id) && field.typez == Typez::String && !field.is_required() {
                field.auto_populated = true;
            }
        }
    }
}

/// Every message, enum or group field reachable from the generated messages
/// must point at a registered type.
pub fn check_references(api: &Api) -> Result<(), ParseError> {
    let mut pending: Vec<&str> = api.messages.iter().map(String::as_str).collect();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Some(message) = api.state.message(id) else {
            continue;
        };
        for field in &message.fields {
            if !field.typez.references_type() {
                continue;
            }
            let type_id = field.type_id.as_deref().unwrap_or_default();
            if !api.state.resolves_type(type_id) {
                return Err(ParseError::UnresolvedType {
                    field: field.id.clone(),
                    type_id: type_id.to_string(),
                });
            }
        }
        pending.extend(message.messages.iter().map(String::as_str));
    }
    Ok(())
}
