//! Option and extension helpers.
//!
//! Extension values show up in descriptor JSON under bracketed keys, so
//! `(google.api.default_host)` is read from `"[google.api.default_host]"`.
//! Malformed values are treated as absent unless the caller needs to drop the
//! annotated node.

use apigen_model::{FieldBehavior, OperationInfo};
use serde::Deserialize;
use serde_json::Value;

use crate::descriptor::OptionsJson;
use crate::error::AnnotationError;

pub const HTTP: &str = "google.api.http";
pub const ROUTING: &str = "google.api.routing";
pub const DEFAULT_HOST: &str = "google.api.default_host";
pub const FIELD_BEHAVIOR: &str = "google.api.field_behavior";
pub const FIELD_INFO: &str = "google.api.field_info";
pub const OPERATION_INFO: &str = "google.longrunning.operation_info";

/// Raw JSON of the extension `name`, if set.
pub fn extension<'a>(options: Option<&'a OptionsJson>, name: &str) -> Option<&'a Value> {
    let key = format!("[{name}]");
    options.and_then(|o| o.get(&key))
}

/// Decode the extension `name` into `T`.
pub fn decode_extension<T>(options: Option<&OptionsJson>, name: &str) -> Option<Result<T, AnnotationError>>
where
    T: for<'de> Deserialize<'de>,
{
    extension(options, name).map(|v| {
        T::deserialize(v).map_err(|e| AnnotationError::Malformed {
            name: name.to_string(),
            reason: e.to_string(),
        })
    })
}

pub fn is_deprecated(options: Option<&OptionsJson>) -> bool {
    options
        .and_then(|o| o.get("deprecated"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub fn default_host(options: Option<&OptionsJson>) -> String {
    extension(options, DEFAULT_HOST)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OperationInfoJson {
    #[serde(default, rename = "responseType", alias = "response_type")]
    response_type: String,
    #[serde(default, rename = "metadataType", alias = "metadata_type")]
    metadata_type: String,
}

/// `(google.longrunning.operation_info)`, with type names qualified relative
/// to `package`.
pub fn operation_info(package: &str, options: Option<&OptionsJson>) -> Option<OperationInfo> {
    let info = match decode_extension::<OperationInfoJson>(options, OPERATION_INFO)? {
        Ok(info) => info,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring operation info");
            return None;
        }
    };
    Some(OperationInfo {
        metadata_type_id: qualify_operation_type(package, &info.metadata_type),
        response_type_id: qualify_operation_type(package, &info.response_type),
    })
}

fn qualify_operation_type(package: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    if let Some(stripped) = name.strip_prefix('.') {
        return format!(".{stripped}");
    }
    if name.contains('.') || package.is_empty() {
        format!(".{name}")
    } else {
        format!(".{package}.{name}")
    }
}

/// `(google.api.field_behavior)`; unknown entries are skipped.
pub fn field_behavior(options: Option<&OptionsJson>) -> Vec<FieldBehavior> {
    let Some(value) = extension(options, FIELD_BEHAVIOR) else {
        return Vec::new();
    };
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => field_behavior_from_name(s),
            Value::Number(n) => n.as_i64().and_then(field_behavior_from_number),
            _ => None,
        })
        .collect()
}

fn field_behavior_from_name(name: &str) -> Option<FieldBehavior> {
    Some(match name {
        "OPTIONAL" => FieldBehavior::Optional,
        "REQUIRED" => FieldBehavior::Required,
        "OUTPUT_ONLY" => FieldBehavior::OutputOnly,
        "INPUT_ONLY" => FieldBehavior::InputOnly,
        "IMMUTABLE" => FieldBehavior::Immutable,
        "UNORDERED_LIST" => FieldBehavior::UnorderedList,
        "NON_EMPTY_DEFAULT" => FieldBehavior::NonEmptyDefault,
        "IDENTIFIER" => FieldBehavior::Identifier,
        _ => return None,
    })
}

fn field_behavior_from_number(n: i64) -> Option<FieldBehavior> {
    Some(match n {
        1 => FieldBehavior::Optional,
        2 => FieldBehavior::Required,
        3 => FieldBehavior::OutputOnly,
        4 => FieldBehavior::InputOnly,
        5 => FieldBehavior::Immutable,
        6 => FieldBehavior::UnorderedList,
        7 => FieldBehavior::NonEmptyDefault,
        8 => FieldBehavior::Identifier,
        _ => return None,
    })
}

/// Whether `(google.api.field_info).format` is `UUID4`.
pub fn is_uuid4_field(options: Option<&OptionsJson>) -> bool {
    match extension(options, FIELD_INFO).and_then(|v| v.get("format")) {
        Some(Value::String(s)) => s == "UUID4",
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}
