//! Reattaches source comments to model nodes.
//!
//! `SourceCodeInfo` locates each comment by a path of alternating field
//! numbers and indexes into the `FileDescriptorProto`. `[4, 0, 2, 1]` is
//! `message_type[0].field[1]`. Paths are resolved against the descriptor
//! first, then the comment is written to the matching registered node.

use crate::context::BuildContext;
use crate::descriptor::field_numbers::*;
use crate::descriptor::{DescriptorProtoJson, EnumDescriptorProtoJson, FileDescriptorProtoJson};
use crate::error::Diagnostic;
use crate::registrar::top_level_id;

/// A model node a comment belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocTarget {
    Message(String),
    Field { message: String, name: String },
    OneOf { message: String, name: String },
    Enum(String),
    EnumValue { enum_id: String, index: usize },
    Service(String),
    Method(String),
}

/// What a location path refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Target(DocTarget),
    /// Known element that carries no documentation in the model.
    Ignored,
    Unknown,
}

/// Attach the leading comments of `file` to the registered model.
pub fn reattach_documentation(ctx: &mut BuildContext, file: &FileDescriptorProtoJson) {
    let Some(info) = &file.source_code_info else {
        return;
    };
    for location in &info.location {
        let Some(comments) = location.leading_comments.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        match resolve_path(file, &location.path) {
            Resolved::Target(target) => attach(ctx, target, trim_leading_spaces(comments)),
            Resolved::Ignored => {}
            Resolved::Unknown => ctx.report(Diagnostic::UnknownDocumentationPath {
                file: file.name().to_string(),
                path: location.path.clone(),
            }),
        }
    }
}

fn index(raw: i32) -> Option<usize> {
    usize::try_from(raw).ok()
}

/// Resolve a location path of `file`.
pub fn resolve_path(file: &FileDescriptorProtoJson, path: &[i32]) -> Resolved {
    let package = file.package();
    match path {
        [FILE_MESSAGE_TYPE, i, rest @ ..] => match index(*i).and_then(|i| file.message_type.get(i)) {
            Some(message) => resolve_message(message, top_level_id(package, message.name()), rest),
            None => Resolved::Unknown,
        },
        [FILE_ENUM_TYPE, i, rest @ ..] => match index(*i).and_then(|i| file.enum_type.get(i)) {
            Some(enumeration) => resolve_enum(enumeration, top_level_id(package, enumeration.name()), rest),
            None => Resolved::Unknown,
        },
        [FILE_SERVICE, i, rest @ ..] => match index(*i).and_then(|i| file.service.get(i)) {
            Some(service) => {
                let service_id = top_level_id(package, service.name());
                match rest {
                    [] => Resolved::Target(DocTarget::Service(service_id)),
                    [SERVICE_METHOD, j] => match index(*j).and_then(|j| service.method.get(j)) {
                        Some(method) => Resolved::Target(DocTarget::Method(format!("{service_id}.{}", method.name()))),
                        None => Resolved::Unknown,
                    },
                    [SERVICE_METHOD, _, _, ..] | [SERVICE_OPTIONS, ..] => Resolved::Ignored,
                    _ => Resolved::Unknown,
                }
            }
            None => Resolved::Unknown,
        },
        [FILE_NAME | FILE_PACKAGE | FILE_DEPENDENCY | FILE_EXTENSION | FILE_OPTIONS | FILE_SOURCE_CODE_INFO
        | FILE_PUBLIC_DEPENDENCY | FILE_WEAK_DEPENDENCY | FILE_SYNTAX | FILE_EDITION, ..] => Resolved::Ignored,
        _ => Resolved::Unknown,
    }
}

fn resolve_message(message: &DescriptorProtoJson, id: String, path: &[i32]) -> Resolved {
    match path {
        [] => Resolved::Target(DocTarget::Message(id)),
        [MESSAGE_FIELD, i] => match index(*i).and_then(|i| message.field.get(i)) {
            Some(field) => Resolved::Target(DocTarget::Field {
                message: id,
                name: field.name().to_string(),
            }),
            None => Resolved::Unknown,
        },
        [MESSAGE_FIELD, _, _, ..] => Resolved::Ignored,
        [MESSAGE_NESTED_TYPE, i, rest @ ..] => match index(*i).and_then(|i| message.nested_type.get(i)) {
            Some(nested) => {
                let nested_id = format!("{id}.{}", nested.name());
                resolve_message(nested, nested_id, rest)
            }
            None => Resolved::Unknown,
        },
        [MESSAGE_ENUM_TYPE, i, rest @ ..] => match index(*i).and_then(|i| message.enum_type.get(i)) {
            Some(enumeration) => {
                let enum_id = format!("{id}.{}", enumeration.name());
                resolve_enum(enumeration, enum_id, rest)
            }
            None => Resolved::Unknown,
        },
        [MESSAGE_ONEOF_DECL, i] => match index(*i).and_then(|i| message.oneof_decl.get(i)) {
            Some(oneof) => Resolved::Target(DocTarget::OneOf {
                message: id,
                name: oneof.name().to_string(),
            }),
            None => Resolved::Unknown,
        },
        [MESSAGE_ONEOF_DECL, _, _, ..] => Resolved::Ignored,
        [MESSAGE_EXTENSION_RANGE | MESSAGE_EXTENSION | MESSAGE_OPTIONS, ..] => Resolved::Ignored,
        _ => Resolved::Unknown,
    }
}

fn resolve_enum(enumeration: &EnumDescriptorProtoJson, id: String, path: &[i32]) -> Resolved {
    match path {
        [] => Resolved::Target(DocTarget::Enum(id)),
        [ENUM_VALUE, i] => match index(*i).filter(|i| *i < enumeration.value.len()) {
            Some(index) => Resolved::Target(DocTarget::EnumValue { enum_id: id, index }),
            None => Resolved::Unknown,
        },
        _ => Resolved::Unknown,
    }
}

/// Write `documentation` to `target`. Nodes missing from the registry, such
/// as dropped methods, are skipped.
fn attach(ctx: &mut BuildContext, target: DocTarget, documentation: String) {
    let state = &mut ctx.state;
    let slot = match &target {
        DocTarget::Message(id) => state.message_mut(id).map(|m| &mut m.documentation),
        DocTarget::Field { message, name } => state
            .message_mut(message)
            .and_then(|m| m.fields.iter_mut().find(|f| f.name == *name))
            .map(|f| &mut f.documentation),
        DocTarget::OneOf { message, name } => state
            .message_mut(message)
            .and_then(|m| m.one_ofs.iter_mut().find(|o| o.name == *name))
            .map(|o| &mut o.documentation),
        DocTarget::Enum(id) => state.enum_type_mut(id).map(|e| &mut e.documentation),
        DocTarget::EnumValue { enum_id, index } => state
            .enum_type_mut(enum_id)
            .and_then(|e| e.values.get_mut(*index))
            .map(|v| &mut v.documentation),
        DocTarget::Service(id) => state.service_mut(id).map(|s| &mut s.documentation),
        DocTarget::Method(id) => state.method_mut(id).map(|m| &mut m.documentation),
    };
    match slot {
        Some(slot) => *slot = documentation,
        None => tracing::debug!(node = ?target, "no model node for documentation"),
    }
}

/// Strip one leading space from every line and a single trailing newline.
pub fn trim_leading_spaces(comment: &str) -> String {
    let joined = comment
        .split('\n')
        .map(|line| line.strip_prefix(' ').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n");
    match joined.strip_suffix('\n') {
        Some(trimmed) => trimmed.to_string(),
        None => joined,
    }
}
