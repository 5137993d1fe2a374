//! Protobuf descriptor sets → API model.
//!
//! The input is the JSON rendering of a `google.protobuf.FileDescriptorSet`,
//! as produced by:
//!
//! ```text
//! buf build --as-file-descriptor-set -o descriptor.json
//! ```
//!
//! Custom options are rendered explicitly in that JSON, under keys like
//! `"[google.api.http]"`, so annotations can be read without an
//! extension-aware protobuf runtime.
//!
//! Building a model runs these phases over one `BuildContext`:
//!
//! - registration of every message and enum, mixin support files included
//! - services and methods of the files to generate
//! - mixin composition (`Locations`, `IAMPolicy`, `Operations`)
//! - documentation from `SourceCodeInfo`
//! - post-processing: package name, pagination, auto-populated fields
//!
//! Malformed annotations drop the annotated method and are reported as
//! `Diagnostic`s. Structural problems abort the build with a `ParseError`.

pub mod annotations;
pub mod builder;
pub mod context;
pub mod descriptor;
pub mod docs;
pub mod enums;
pub mod error;
pub mod http;
pub mod mixins;
pub mod normalize;
pub mod postprocess;
pub mod registrar;
pub mod routing;
pub mod service_config;
pub mod services;

pub use builder::{build_api, ApiBuild, BuildOptions};
pub use descriptor::FileDescriptorSetJson;
pub use error::{AnnotationError, Diagnostic, Outcome, ParseError};
pub use service_config::ServiceConfig;

// =============================================================================
// Entry points
// =============================================================================

pub fn parse_descriptor_set_json(text: &str) -> Result<FileDescriptorSetJson, ParseError> {
    serde_json::from_str(text).map_err(ParseError::DescriptorJson)
}

pub fn parse_service_config_json(text: &str) -> Result<ServiceConfig, ParseError> {
    serde_json::from_str(text).map_err(ParseError::ServiceConfigJson)
}
