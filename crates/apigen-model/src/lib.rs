//! apigen API model
//!
//! The language-agnostic intermediate representation consumed by the
//! per-language renderers:
//! - `Api`: the root of one build (services, messages, enums to generate)
//! - `ApiState`: the symbol registry, keyed by fully-qualified name (FQN)
//! - `model_digest`: a stable digest of a built model
//!
//! FQNs always carry a leading dot (`.google.longrunning.Operation`), matching
//! the type references found in protobuf descriptors.
//!
//! The registry is the single owner of services, methods, messages and enums.
//! Tree edges (API → services, service → methods, message → nested types) are
//! ordered lists of FQNs resolved through the registry.

pub mod api;
pub mod digest;
pub mod state;

pub use api::*;
pub use digest::{model_digest, MODEL_DIGEST_PREFIX};
pub use state::{ApiState, Symbol};
