//! Model entities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::state::ApiState;

// ============================================================================
// Root
// ============================================================================

/// The root of one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Api {
    /// Short name, e.g. `secretmanager` for `secretmanager.googleapis.com`.
    pub name: String,
    pub package_name: String,
    pub title: String,
    pub description: String,
    /// Services to generate, by FQN, in descriptor order.
    pub services: Vec<String>,
    /// Top-level messages to generate, by FQN, in descriptor order.
    pub messages: Vec<String>,
    /// Top-level enums to generate, by FQN, in descriptor order.
    pub enums: Vec<String>,
    pub state: ApiState,
}

impl Api {
    pub fn services(&self) -> impl Iterator<Item = &Service> + '_ {
        self.services
            .iter()
            .filter_map(|id| self.state.service(id))
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages
            .iter()
            .filter_map(|id| self.state.message(id))
    }

    pub fn enums(&self) -> impl Iterator<Item = &Enum> + '_ {
        self.enums.iter().filter_map(|id| self.state.enum_type(id))
    }

    /// Methods of `service`, in service order.
    pub fn methods<'a>(&'a self, service: &'a Service) -> impl Iterator<Item = &'a Method> + 'a {
        service
            .methods
            .iter()
            .filter_map(|id| self.state.method(id))
    }
}

// ============================================================================
// Services
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub package: String,
    pub documentation: String,
    /// From `(google.api.default_host)`, empty when absent.
    pub default_host: String,
    pub deprecated: bool,
    /// Method FQNs: natively declared methods first, then mixin methods.
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub id: String,
    pub name: String,
    pub documentation: String,
    pub input_type_id: String,
    pub output_type_id: String,
    pub path_info: PathInfo,
    pub routing: Vec<RoutingInfo>,
    pub client_side_streaming: bool,
    pub server_side_streaming: bool,
    /// Present for methods returning `.google.longrunning.Operation` with an
    /// `operation_info` annotation.
    pub operation_info: Option<OperationInfo>,
    pub returns_empty: bool,
    pub is_pageable: bool,
    /// Backend address from the service configuration, if any.
    pub host_override: Option<String>,
    pub deprecated: bool,
}

/// The HTTP binding of a method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathInfo {
    /// `GET`, `POST`, `PUT`, `DELETE` or `PATCH`.
    pub verb: String,
    pub path_template: Vec<PathSegment>,
    /// Request fields sent as query parameters.
    pub query_parameters: BTreeSet<String>,
    /// `None` when there is no body, `Some("*")` for the whole request.
    pub body_field_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "snake_case")]
pub enum PathSegment {
    Literal(String),
    /// A (possibly dotted) request field path bound by `{field}` or
    /// `{field=pattern}`.
    FieldPath(String),
    /// The custom verb suffix, as in `:cancel`.
    Verb(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    pub metadata_type_id: String,
    pub response_type_id: String,
}

/// One `(google.api.routing)` parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingInfo {
    /// Request field the value is extracted from.
    pub field_path: String,
    /// Header key the value is sent under.
    pub name: String,
    pub prefix: String,
    pub matcher: String,
    pub suffix: String,
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub name: String,
    pub package: String,
    /// FQN of the enclosing message for nested types.
    pub parent: Option<String>,
    pub documentation: String,
    pub deprecated: bool,
    /// Synthetic `map<K, V>` entry type.
    pub is_map: bool,
    pub is_pageable_response: bool,
    /// FQN of the field holding the page items.
    pub pageable_item: Option<String>,
    pub fields: Vec<Field>,
    /// Explicit oneofs only; synthetic proto3 `optional` oneofs are pruned.
    pub one_ofs: Vec<OneOf>,
    pub messages: Vec<String>,
    pub enums: Vec<String>,
}

impl Message {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_id(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn one_of_fields<'a>(&'a self, one_of: &'a OneOf) -> impl Iterator<Item = &'a Field> + 'a {
        one_of
            .fields
            .iter()
            .filter_map(move |id| self.field_by_id(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    pub json_name: String,
    pub documentation: String,
    pub typez: Typez,
    /// Target type FQN for message, enum and group fields.
    pub type_id: Option<String>,
    pub repeated: bool,
    pub optional: bool,
    pub map: bool,
    pub is_one_of: bool,
    pub auto_populated: bool,
    pub behavior: Vec<FieldBehavior>,
    pub deprecated: bool,
}

impl Field {
    pub fn is_required(&self) -> bool {
        self.behavior.contains(&FieldBehavior::Required)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneOf {
    pub id: String,
    pub name: String,
    pub documentation: String,
    /// FQNs of the member fields, in field order.
    pub fields: Vec<String>,
}

/// Semantic field type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Typez {
    #[default]
    Undefined,
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl Typez {
    /// Whether fields of this type carry a target-type FQN.
    pub fn references_type(self) -> bool {
        matches!(self, Typez::Message | Typez::Enum | Typez::Group)
    }
}

/// `google.api.FieldBehavior`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldBehavior {
    Optional,
    Required,
    OutputOnly,
    InputOnly,
    Immutable,
    UnorderedList,
    NonEmptyDefault,
    Identifier,
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub id: String,
    pub name: String,
    pub package: String,
    pub parent: Option<String>,
    pub documentation: String,
    pub deprecated: bool,
    pub values: Vec<EnumValue>,
    /// Indexes into `values`: one canonical value per distinct number,
    /// ascending by number.
    pub unique_number_values: Vec<usize>,
}

impl Enum {
    pub fn unique_values(&self) -> impl Iterator<Item = &EnumValue> + '_ {
        self.unique_number_values
            .iter()
            .filter_map(|idx| self.values.get(*idx))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
    /// FQN of the owning enum.
    pub parent: String,
    pub documentation: String,
    pub deprecated: bool,
}
