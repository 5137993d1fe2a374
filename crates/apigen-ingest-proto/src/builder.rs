//! The build pipeline: descriptor set → `Api`.

use apigen_model::Api;
use serde::Serialize;

use crate::context::BuildContext;
use crate::descriptor::{FileDescriptorProtoJson, FileDescriptorSetJson};
use crate::docs;
use crate::error::{Diagnostic, ParseError, SymbolKind};
use crate::mixins;
use crate::postprocess;
use crate::registrar::{self, top_level_id};
use crate::service_config::ServiceConfig;
use crate::services;

/// Inputs of one build besides the descriptor set.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Files to generate, matched against descriptor file names by suffix.
    /// Empty means every file in the set.
    pub files_to_generate: Vec<String>,
    pub service_config: Option<ServiceConfig>,
    /// Use the bundled mixin descriptors for files the set does not carry.
    pub builtin_mixins: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            files_to_generate: Vec::new(),
            service_config: None,
            builtin_mixins: true,
        }
    }
}

impl BuildOptions {
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files_to_generate = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_service_config(mut self, config: ServiceConfig) -> Self {
        self.service_config = Some(config);
        self
    }
}

/// The model plus everything that was skipped while building it.
#[derive(Debug, Clone, Serialize)]
pub struct ApiBuild {
    pub api: Api,
    pub diagnostics: Vec<Diagnostic>,
}

/// The descriptor files to generate, in request order.
pub fn select_targets<'a>(
    set: &'a FileDescriptorSetJson,
    requested: &[String],
) -> Result<Vec<&'a FileDescriptorProtoJson>, ParseError> {
    if requested.is_empty() {
        return Ok(set.file.iter().collect());
    }
    let mut targets: Vec<&FileDescriptorProtoJson> = Vec::with_capacity(requested.len());
    for path in requested {
        let file = set
            .file
            .iter()
            .find(|f| !f.name().is_empty() && path.ends_with(f.name()))
            .ok_or_else(|| ParseError::MissingFile(path.clone()))?;
        if !targets.iter().any(|t| t.name() == file.name()) {
            targets.push(file);
        }
    }
    Ok(targets)
}

/// Build the API model of `set`.
///
/// Phases, in order: type registration over every file (mixin support files
/// included), services of the target files, mixin composition,
/// documentation, then post-processing and the reference check.
pub fn build_api(set: &FileDescriptorSetJson, options: &BuildOptions) -> Result<ApiBuild, ParseError> {
    let config = options.service_config.as_ref();
    let targets = select_targets(set, &options.files_to_generate)?;
    let mut ctx = BuildContext::new();

    let force_long_running = services::requires_long_running_mixin(&targets);
    let mut plan = mixins::plan_mixins(config, force_long_running);
    let mixin_files = mixins::load_mixin_files(&mut ctx, set, &mut plan, options.builtin_mixins)?;

    let sources: Vec<&FileDescriptorProtoJson> = set.file.iter().chain(mixin_files.iter()).collect();
    registrar::register_types(&mut ctx, &sources)?;

    let mut api = Api {
        name: config.map(|c| c.api_name().to_string()).unwrap_or_default(),
        title: config.map(|c| c.title.clone()).unwrap_or_default(),
        description: config.map(|c| c.summary().to_string()).unwrap_or_default(),
        ..Default::default()
    };

    for file in &targets {
        include_types(&mut ctx, &mut api, file);
        for service in &file.service {
            let id = services::process_service(&mut ctx, file, service, config);
            api.services.push(id);
        }
    }
    tracing::debug!(
        targets = targets.len(),
        services = api.services.len(),
        mixins = plan.mixins.len(),
        "built services"
    );

    if !plan.is_empty() {
        mixins::compose_mixins(&mut ctx, &api.services, &plan, &sources, config);
    }

    for file in &targets {
        docs::reattach_documentation(&mut ctx, file);
    }

    let uuid4_fields = std::mem::take(&mut ctx.uuid4_fields);
    let (state, diagnostics) = ctx.into_parts();
    api.state = state;

    postprocess::update_package_name(&mut api, config);
    postprocess::update_method_pagination(&mut api.state);
    postprocess::update_auto_populated_fields(&mut api.state, config, &uuid4_fields);
    postprocess::check_references(&api)?;

    tracing::debug!(
        api = %api.name,
        package = %api.package_name,
        diagnostics = diagnostics.len(),
        "built api model"
    );
    Ok(ApiBuild { api, diagnostics })
}

/// Append the top-level messages and enums of `file` to the generated set.
fn include_types(ctx: &mut BuildContext, api: &mut Api, file: &FileDescriptorProtoJson) {
    let package = file.package();
    for message in &file.message_type {
        let id = top_level_id(package, message.name());
        if ctx.state.message(&id).is_some() {
            api.messages.push(id);
        } else {
            ctx.report(Diagnostic::MissingSymbol {
                kind: SymbolKind::Message,
                id,
            });
        }
    }
    for enumeration in &file.enum_type {
        let id = top_level_id(package, enumeration.name());
        if ctx.state.enum_type(&id).is_some() {
            api.enums.push(id);
        } else {
            ctx.report(Diagnostic::MissingSymbol {
                kind: SymbolKind::Enum,
                id,
            });
        }
    }
}
