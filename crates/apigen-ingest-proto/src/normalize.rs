//! Raw wire type → `Typez` and presence flags.

use apigen_model::{ApiState, Field, Typez};

use crate::descriptor::{FieldDescriptorProtoJson, ProtoEnumJson};
use crate::error::Diagnostic;

/// Map the descriptor `type` of a field to its semantic type.
pub fn typez_of(raw: Option<&ProtoEnumJson>) -> Typez {
    match raw {
        Some(ProtoEnumJson::Name(name)) => typez_from_name(name),
        Some(ProtoEnumJson::Number(n)) => typez_from_number(*n),
        None => Typez::Undefined,
    }
}

fn typez_from_name(name: &str) -> Typez {
    match name {
        "TYPE_DOUBLE" => Typez::Double,
        "TYPE_FLOAT" => Typez::Float,
        "TYPE_INT64" => Typez::Int64,
        "TYPE_UINT64" => Typez::Uint64,
        "TYPE_INT32" => Typez::Int32,
        "TYPE_FIXED64" => Typez::Fixed64,
        "TYPE_FIXED32" => Typez::Fixed32,
        "TYPE_BOOL" => Typez::Bool,
        "TYPE_STRING" => Typez::String,
        "TYPE_GROUP" => Typez::Group,
        "TYPE_MESSAGE" => Typez::Message,
        "TYPE_BYTES" => Typez::Bytes,
        "TYPE_UINT32" => Typez::Uint32,
        "TYPE_ENUM" => Typez::Enum,
        "TYPE_SFIXED32" => Typez::Sfixed32,
        "TYPE_SFIXED64" => Typez::Sfixed64,
        "TYPE_SINT32" => Typez::Sint32,
        "TYPE_SINT64" => Typez::Sint64,
        _ => Typez::Undefined,
    }
}

fn typez_from_number(n: i32) -> Typez {
    match n {
        1 => Typez::Double,
        2 => Typez::Float,
        3 => Typez::Int64,
        4 => Typez::Uint64,
        5 => Typez::Int32,
        6 => Typez::Fixed64,
        7 => Typez::Fixed32,
        8 => Typez::Bool,
        9 => Typez::String,
        10 => Typez::Group,
        11 => Typez::Message,
        12 => Typez::Bytes,
        13 => Typez::Uint32,
        14 => Typez::Enum,
        15 => Typez::Sfixed32,
        16 => Typez::Sfixed64,
        17 => Typez::Sint32,
        18 => Typez::Sint64,
        _ => Typez::Undefined,
    }
}

/// Set `typez`, `type_id` and the map/optional flags of `field`.
///
/// Map entry detection reads the target message from `state`, so every
/// message shell must be registered before fields are normalized. An unknown
/// wire type leaves the field `Undefined` and is returned as a diagnostic.
pub fn normalize_types(state: &ApiState, field: &mut Field, raw: &FieldDescriptorProtoJson) -> Option<Diagnostic> {
    field.typez = typez_of(raw.typ.as_ref());
    match field.typez {
        Typez::Undefined => {
            return Some(Diagnostic::UndefinedFieldType {
                field: field.id.clone(),
                raw_type: raw
                    .typ
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            });
        }
        Typez::Message => {
            field.type_id = raw.type_name.clone();
            field.optional = !field.repeated;
            let is_map_entry = field
                .type_id
                .as_deref()
                .and_then(|id| state.message(id))
                .is_some_and(|m| m.is_map);
            if is_map_entry {
                field.map = true;
                field.repeated = false;
                field.optional = false;
            }
        }
        Typez::Group => {
            field.type_id = raw.type_name.clone();
            field.optional = !field.repeated;
        }
        Typez::Enum => {
            field.type_id = raw.type_name.clone();
        }
        _ => {}
    }
    None
}

/// `lowerCamelCase` JSON name the way protoc derives it.
pub fn default_json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
