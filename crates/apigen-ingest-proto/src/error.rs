//! Fatal errors, per-node diagnostics and the explicit build outcome.

use serde::Serialize;
use std::fmt;

/// A failure that makes the model incoherent. No partial model is returned.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to parse descriptor set JSON: {0}")]
    DescriptorJson(#[source] serde_json::Error),

    #[error("failed to parse service config JSON: {0}")]
    ServiceConfigJson(#[source] serde_json::Error),

    #[error("built-in mixin descriptor `{file}` is invalid: {source}")]
    MixinDescriptor {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("file to generate `{0}` is not in the descriptor set")]
    MissingFile(String),

    #[error("field `{field}` references oneof #{index} but its message declares {declared}")]
    InvalidOneofIndex {
        field: String,
        index: i32,
        declared: usize,
    },

    #[error("field `{field}` references unregistered type `{type_id}`")]
    UnresolvedType { field: String, type_id: String },
}

/// Why a method annotation could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationError {
    #[error("missing google.api.http annotation")]
    MissingHttpRule,

    #[error("unsupported http method: {0}")]
    UnsupportedVerb(String),

    #[error("malformed path template `{template}`: {reason}")]
    PathTemplate { template: String, reason: String },

    #[error("malformed routing path template `{template}`: {reason}")]
    RoutingTemplate { template: String, reason: String },

    #[error("malformed `{name}` annotation: {reason}")]
    Malformed { name: String, reason: String },

    #[error("unable to lookup type `{0}`")]
    UnresolvedType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Message,
    Enum,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Message => f.write_str("message"),
            SymbolKind::Enum => f.write_str("enum"),
        }
    }
}

/// A non-fatal problem. The offending node is skipped and the build goes on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    MethodDropped { method: String, reason: String },
    UnknownDocumentationPath { file: String, path: Vec<i32> },
    MissingSymbol { kind: SymbolKind, id: String },
    UndefinedFieldType { field: String, raw_type: String },
    InvalidOverride { selector: String, reason: String },
    MixinUnavailable { api: String },
}

impl Diagnostic {
    pub fn method_dropped(method: &str, reason: &AnnotationError) -> Self {
        Diagnostic::MethodDropped {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Emit the diagnostic through `tracing`.
    pub fn log(&self) {
        match self {
            Diagnostic::MethodDropped { method, reason } => {
                tracing::error!(method = %method, reason = %reason, "dropping method");
            }
            Diagnostic::UnknownDocumentationPath { file, path } => {
                tracing::warn!(file = %file, path = ?path, "dropped unknown documentation");
            }
            Diagnostic::MissingSymbol { kind, id } => {
                tracing::warn!(kind = %kind, id = %id, "missing symbol in symbol table");
            }
            Diagnostic::UndefinedFieldType { field, raw_type } => {
                tracing::warn!(field = %field, raw_type = %raw_type, "found undefined field type");
            }
            Diagnostic::InvalidOverride { selector, reason } => {
                tracing::warn!(selector = %selector, reason = %reason, "ignoring service config override");
            }
            Diagnostic::MixinUnavailable { api } => {
                tracing::warn!(api = %api, "mixin descriptor not available");
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MethodDropped { method, reason } => {
                write!(f, "method `{method}` dropped: {reason}")
            }
            Diagnostic::UnknownDocumentationPath { file, path } => {
                write!(f, "{file}: unknown documentation path {path:?}")
            }
            Diagnostic::MissingSymbol { kind, id } => {
                write!(f, "missing {kind} `{id}` in symbol table")
            }
            Diagnostic::UndefinedFieldType { field, raw_type } => {
                write!(f, "field `{field}` has undefined type `{raw_type}`")
            }
            Diagnostic::InvalidOverride { selector, reason } => {
                write!(f, "service config override for `{selector}` ignored: {reason}")
            }
            Diagnostic::MixinUnavailable { api } => {
                write!(f, "no descriptor available for mixin `{api}`")
            }
        }
    }
}

/// Result of building one model node.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Built(T),
    Skipped(Diagnostic),
}

impl<T> Outcome<T> {
    pub fn built(self) -> Option<T> {
        match self {
            Outcome::Built(v) => Some(v),
            Outcome::Skipped(_) => None,
        }
    }
}
