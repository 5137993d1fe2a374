//! Per-build state threaded through every phase.

use apigen_model::ApiState;
use std::collections::BTreeSet;

use crate::error::Diagnostic;

/// Owns the symbol registry and the diagnostics of one build.
#[derive(Debug, Default)]
pub struct BuildContext {
    pub state: ApiState,
    diagnostics: Vec<Diagnostic>,
    /// Field FQNs annotated with `(google.api.field_info).format = UUID4`.
    pub(crate) uuid4_fields: BTreeSet<String>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `diagnostic` and keep it for the caller.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (ApiState, Vec<Diagnostic>) {
        (self.state, self.diagnostics)
    }
}
