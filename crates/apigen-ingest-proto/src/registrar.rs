//! Message and enum registration.
//!
//! Registration runs in two sweeps over the same files:
//! - shells: every message (with its map-entry flag and nested ids) and every
//!   enum (with its values and canonical aliases) is inserted into the
//!   registry;
//! - fields: fields and oneofs are attached to the registered messages.
//!
//! Fields are normalized only once every shell exists, so a map field may
//! point at an entry type declared later in the file or in another file.

use apigen_model::{Enum, EnumValue, Field, Message, OneOf};

use crate::annotations;
use crate::context::BuildContext;
use crate::descriptor::{DescriptorProtoJson, EnumDescriptorProtoJson, FileDescriptorProtoJson};
use crate::enums;
use crate::error::ParseError;
use crate::normalize;

/// Register every message and enum declared in `files`, in order.
pub fn register_types(ctx: &mut BuildContext, files: &[&FileDescriptorProtoJson]) -> Result<(), ParseError> {
    for file in files {
        let package = file.package();
        for message in &file.message_type {
            register_message_shell(ctx, package, None, message);
        }
        for enumeration in &file.enum_type {
            register_enum(ctx, package, None, enumeration);
        }
    }
    for file in files {
        for message in &file.message_type {
            populate_message(ctx, &top_level_id(file.package(), message.name()), message)?;
        }
    }
    tracing::debug!(
        files = files.len(),
        messages = ctx.state.message_by_id.len(),
        enums = ctx.state.enum_by_id.len(),
        "registered types"
    );
    Ok(())
}

/// `.pkg.Name`, or `.Name` for the empty package.
pub fn top_level_id(package: &str, name: &str) -> String {
    if package.is_empty() {
        format!(".{name}")
    } else {
        format!(".{package}.{name}")
    }
}

fn child_id(parent: Option<&str>, package: &str, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{name}"),
        None => top_level_id(package, name),
    }
}

fn register_message_shell(
    ctx: &mut BuildContext,
    package: &str,
    parent: Option<&str>,
    raw: &DescriptorProtoJson,
) -> String {
    let id = child_id(parent, package, raw.name());

    let messages = raw
        .nested_type
        .iter()
        .map(|nested| register_message_shell(ctx, package, Some(&id), nested))
        .collect();
    let enums = raw
        .enum_type
        .iter()
        .map(|nested| register_enum(ctx, package, Some(&id), nested))
        .collect();

    ctx.state.insert_message(Message {
        id: id.clone(),
        name: raw.name().to_string(),
        package: package.to_string(),
        parent: parent.map(str::to_string),
        deprecated: annotations::is_deprecated(raw.options.as_ref()),
        is_map: raw.is_map_entry(),
        messages,
        enums,
        ..Default::default()
    });
    id
}

fn register_enum(
    ctx: &mut BuildContext,
    package: &str,
    parent: Option<&str>,
    raw: &EnumDescriptorProtoJson,
) -> String {
    let id = child_id(parent, package, raw.name());
    let values: Vec<EnumValue> = raw
        .value
        .iter()
        .map(|v| EnumValue {
            name: v.name.clone().unwrap_or_default(),
            number: v.number.unwrap_or_default(),
            parent: id.clone(),
            deprecated: annotations::is_deprecated(v.options.as_ref()),
            ..Default::default()
        })
        .collect();
    let unique_number_values = enums::unique_number_values(&values);

    ctx.state.insert_enum(Enum {
        id: id.clone(),
        name: raw.name().to_string(),
        package: package.to_string(),
        parent: parent.map(str::to_string),
        deprecated: annotations::is_deprecated(raw.options.as_ref()),
        values,
        unique_number_values,
        ..Default::default()
    });
    id
}

fn populate_message(ctx: &mut BuildContext, id: &str, raw: &DescriptorProtoJson) -> Result<(), ParseError> {
    let declared = raw.oneof_decl.len();
    let mut fields = Vec::with_capacity(raw.field.len());
    let mut oneof_members: Vec<Vec<String>> = vec![Vec::new(); declared];

    for raw_field in &raw.field {
        let name = raw_field.name();
        let mut field = Field {
            id: format!("{id}.{name}"),
            name: name.to_string(),
            json_name: raw_field
                .json_name
                .clone()
                .unwrap_or_else(|| normalize::default_json_name(name)),
            repeated: raw_field.is_repeated(),
            optional: raw_field.is_proto3_optional(),
            is_one_of: raw_field.oneof_index.is_some() && !raw_field.is_proto3_optional(),
            behavior: annotations::field_behavior(raw_field.options.as_ref()),
            deprecated: annotations::is_deprecated(raw_field.options.as_ref()),
            ..Default::default()
        };

        if let Some(index) = raw_field.oneof_index {
            let slot = usize::try_from(index)
                .ok()
                .filter(|i| *i < declared)
                .ok_or_else(|| ParseError::InvalidOneofIndex {
                    field: field.id.clone(),
                    index,
                    declared,
                })?;
            if field.is_one_of {
                oneof_members[slot].push(field.id.clone());
            }
        }

        if let Some(diagnostic) = normalize::normalize_types(&ctx.state, &mut field, raw_field) {
            ctx.report(diagnostic);
        }
        if annotations::is_uuid4_field(raw_field.options.as_ref()) {
            ctx.uuid4_fields.insert(field.id.clone());
        }
        fields.push(field);
    }

    let one_ofs = raw
        .oneof_decl
        .iter()
        .zip(oneof_members)
        .filter(|(_, members)| !members.is_empty())
        .map(|(decl, members)| OneOf {
            id: format!("{id}.{}", decl.name()),
            name: decl.name().to_string(),
            fields: members,
            ..Default::default()
        })
        .collect();

    if let Some(message) = ctx.state.message_mut(id) {
        message.fields = fields;
        message.one_ofs = one_ofs;
    }

    for nested in &raw.nested_type {
        populate_message(ctx, &format!("{id}.{}", nested.name()), nested)?;
    }
    Ok(())
}
