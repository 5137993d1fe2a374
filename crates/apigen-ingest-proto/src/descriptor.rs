//! Descriptor set JSON (subset of `google/protobuf/descriptor.proto`).
//!
//! Keys follow the protobuf JSON mapping (`messageType`, `oneofDecl`, ...) as
//! emitted by `buf build --as-file-descriptor-set`. The original proto field
//! names are accepted as aliases. Extension options are kept as raw JSON under
//! their bracketed keys, e.g. `"[google.api.http]"`.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub type OptionsJson = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDescriptorSetJson {
    #[serde(default)]
    pub file: Vec<FileDescriptorProtoJson>,
}

impl FileDescriptorSetJson {
    pub fn find_file(&self, name: &str) -> Option<&FileDescriptorProtoJson> {
        self.file.iter().find(|f| f.name() == name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDescriptorProtoJson {
    pub name: Option<String>,
    pub package: Option<String>,
    #[serde(default, rename = "messageType", alias = "message_type")]
    pub message_type: Vec<DescriptorProtoJson>,
    #[serde(default, rename = "enumType", alias = "enum_type")]
    pub enum_type: Vec<EnumDescriptorProtoJson>,
    #[serde(default)]
    pub service: Vec<ServiceDescriptorProtoJson>,
    #[serde(default)]
    pub options: Option<OptionsJson>,
    #[serde(default, rename = "sourceCodeInfo", alias = "source_code_info")]
    pub source_code_info: Option<SourceCodeInfoJson>,
}

impl FileDescriptorProtoJson {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn package(&self) -> &str {
        self.package.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptorProtoJson {
    pub name: Option<String>,
    #[serde(default)]
    pub field: Vec<FieldDescriptorProtoJson>,
    #[serde(default, rename = "nestedType", alias = "nested_type")]
    pub nested_type: Vec<DescriptorProtoJson>,
    #[serde(default, rename = "enumType", alias = "enum_type")]
    pub enum_type: Vec<EnumDescriptorProtoJson>,
    #[serde(default, rename = "oneofDecl", alias = "oneof_decl")]
    pub oneof_decl: Vec<OneofDescriptorProtoJson>,
    #[serde(default)]
    pub options: Option<OptionsJson>,
}

impl DescriptorProtoJson {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn is_map_entry(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.get("mapEntry").or_else(|| o.get("map_entry")))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OneofDescriptorProtoJson {
    pub name: Option<String>,
}

impl OneofDescriptorProtoJson {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// A protobuf enum rendered either by name (`"TYPE_STRING"`) or by number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProtoEnumJson {
    Name(String),
    Number(i32),
}

impl std::fmt::Display for ProtoEnumJson {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtoEnumJson::Name(n) => write!(f, "{n}"),
            ProtoEnumJson::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldDescriptorProtoJson {
    pub name: Option<String>,
    pub number: Option<i32>,
    pub label: Option<ProtoEnumJson>,
    #[serde(rename = "type")]
    pub typ: Option<ProtoEnumJson>,
    #[serde(rename = "typeName", alias = "type_name")]
    pub type_name: Option<String>,
    #[serde(rename = "jsonName", alias = "json_name")]
    pub json_name: Option<String>,
    #[serde(default)]
    pub options: Option<OptionsJson>,
    #[serde(rename = "oneofIndex", alias = "oneof_index")]
    pub oneof_index: Option<i32>,
    #[serde(rename = "proto3Optional", alias = "proto3_optional")]
    pub proto3_optional: Option<bool>,
}

impl FieldDescriptorProtoJson {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn is_repeated(&self) -> bool {
        matches!(
            &self.label,
            Some(ProtoEnumJson::Name(n)) if n == "LABEL_REPEATED"
        ) || matches!(self.label, Some(ProtoEnumJson::Number(3)))
    }

    pub fn is_proto3_optional(&self) -> bool {
        self.proto3_optional.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnumDescriptorProtoJson {
    pub name: Option<String>,
    #[serde(default)]
    pub value: Vec<EnumValueDescriptorProtoJson>,
    #[serde(default)]
    pub options: Option<OptionsJson>,
}

impl EnumDescriptorProtoJson {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnumValueDescriptorProtoJson {
    pub name: Option<String>,
    pub number: Option<i32>,
    #[serde(default)]
    pub options: Option<OptionsJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceDescriptorProtoJson {
    pub name: Option<String>,
    #[serde(default)]
    pub method: Vec<MethodDescriptorProtoJson>,
    #[serde(default)]
    pub options: Option<OptionsJson>,
}

impl ServiceDescriptorProtoJson {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MethodDescriptorProtoJson {
    pub name: Option<String>,
    #[serde(rename = "inputType", alias = "input_type")]
    pub input_type: Option<String>,
    #[serde(rename = "outputType", alias = "output_type")]
    pub output_type: Option<String>,
    #[serde(rename = "clientStreaming", alias = "client_streaming")]
    pub client_streaming: Option<bool>,
    #[serde(rename = "serverStreaming", alias = "server_streaming")]
    pub server_streaming: Option<bool>,
    #[serde(default)]
    pub options: Option<OptionsJson>,
}

impl MethodDescriptorProtoJson {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn input_type(&self) -> &str {
        self.input_type.as_deref().unwrap_or_default()
    }

    pub fn output_type(&self) -> &str {
        self.output_type.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceCodeInfoJson {
    #[serde(default)]
    pub location: Vec<LocationJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationJson {
    #[serde(default)]
    pub path: Vec<i32>,
    #[serde(rename = "leadingComments", alias = "leading_comments")]
    pub leading_comments: Option<String>,
}

/// Field numbers from `google/protobuf/descriptor.proto`, used by
/// `SourceCodeInfo` location paths.
pub mod field_numbers {
    // FileDescriptorProto
    pub const FILE_NAME: i32 = 1;
    pub const FILE_PACKAGE: i32 = 2;
    pub const FILE_DEPENDENCY: i32 = 3;
    pub const FILE_MESSAGE_TYPE: i32 = 4;
    pub const FILE_ENUM_TYPE: i32 = 5;
    pub const FILE_SERVICE: i32 = 6;
    pub const FILE_EXTENSION: i32 = 7;
    pub const FILE_OPTIONS: i32 = 8;
    pub const FILE_SOURCE_CODE_INFO: i32 = 9;
    pub const FILE_PUBLIC_DEPENDENCY: i32 = 10;
    pub const FILE_WEAK_DEPENDENCY: i32 = 11;
    pub const FILE_SYNTAX: i32 = 12;
    pub const FILE_EDITION: i32 = 14;

    // DescriptorProto
    pub const MESSAGE_FIELD: i32 = 2;
    pub const MESSAGE_NESTED_TYPE: i32 = 3;
    pub const MESSAGE_ENUM_TYPE: i32 = 4;
    pub const MESSAGE_EXTENSION_RANGE: i32 = 5;
    pub const MESSAGE_EXTENSION: i32 = 6;
    pub const MESSAGE_OPTIONS: i32 = 7;
    pub const MESSAGE_ONEOF_DECL: i32 = 8;

    // EnumDescriptorProto
    pub const ENUM_VALUE: i32 = 2;

    // ServiceDescriptorProto
    pub const SERVICE_METHOD: i32 = 2;
    pub const SERVICE_OPTIONS: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_and_proto_names() {
        let text = r#"{
            "file": [{
                "name": "test/v1/test.proto",
                "package": "test.v1",
                "messageType": [{
                    "name": "Request",
                    "field": [
                        {"name": "labels", "number": 1, "label": "LABEL_REPEATED",
                         "type": "TYPE_MESSAGE", "typeName": ".test.v1.Request.LabelsEntry",
                         "jsonName": "labels"},
                        {"name": "count", "number": 2, "label": 1, "type": 5,
                         "json_name": "count", "proto3_optional": true}
                    ],
                    "nested_type": [{"name": "LabelsEntry", "options": {"mapEntry": true}}]
                }]
            }]
        }"#;
        let set: FileDescriptorSetJson = serde_json::from_str(text).unwrap();
        let file = set.find_file("test/v1/test.proto").unwrap();
        assert_eq!(file.package(), "test.v1");

        let m = &file.message_type[0];
        assert!(m.field[0].is_repeated());
        assert_eq!(m.field[1].typ, Some(ProtoEnumJson::Number(5)));
        assert!(m.field[1].is_proto3_optional());
        assert!(!m.field[1].is_repeated());
        assert!(m.nested_type[0].is_map_entry());
        assert!(!m.is_map_entry());
    }
}
