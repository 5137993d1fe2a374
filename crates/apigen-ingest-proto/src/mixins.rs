//! Well-known mixin services.
//!
//! A mixin is a service implemented by many APIs (`Locations`, `IAMPolicy`,
//! `Operations`). Its methods are copied into every service of the API that
//! enables it, renamed to `<service>.<method>` and optionally re-bound by the
//! service configuration.
//!
//! Mixin descriptors are taken from the input descriptor set when present,
//! otherwise from the JSON descriptors bundled under `src/mixins/`.

use std::collections::BTreeSet;

use crate::context::BuildContext;
use crate::descriptor::{FileDescriptorProtoJson, FileDescriptorSetJson, ServiceDescriptorProtoJson};
use crate::error::{Diagnostic, Outcome, ParseError};
use crate::services::{process_method, selector};
use crate::service_config::ServiceConfig;

// ============================================================================
// Catalog
// ============================================================================

/// One well-known mixin.
#[derive(Debug, PartialEq, Eq)]
pub struct Mixin {
    /// Service name as listed in `apis`, e.g. `google.longrunning.Operations`.
    pub api: &'static str,
    /// File declaring the service.
    pub file: &'static str,
    /// Files declaring the request/response types of the service.
    pub support: &'static [&'static str],
}

impl Mixin {
    fn service_name(&self) -> &'static str {
        self.api.rsplit('.').next().unwrap_or(self.api)
    }

    fn owns_selector(&self, selector: &str) -> bool {
        selector
            .strip_prefix(self.api)
            .is_some_and(|rest| rest.starts_with('.') && !rest[1..].contains('.'))
    }
}

pub const LOCATIONS: Mixin = Mixin {
    api: "google.cloud.location.Locations",
    file: "google/cloud/location/locations.proto",
    support: &["google/protobuf/any.proto"],
};

pub const IAM_POLICY: Mixin = Mixin {
    api: "google.iam.v1.IAMPolicy",
    file: "google/iam/v1/iam_policy.proto",
    support: &[
        "google/protobuf/field_mask.proto",
        "google/type/expr.proto",
        "google/iam/v1/policy.proto",
        "google/iam/v1/options.proto",
    ],
};

pub const OPERATIONS: Mixin = Mixin {
    api: "google.longrunning.Operations",
    file: "google/longrunning/operations.proto",
    support: &[
        "google/protobuf/any.proto",
        "google/protobuf/duration.proto",
        "google/protobuf/empty.proto",
        "google/rpc/status.proto",
    ],
};

pub const CATALOG: [&Mixin; 3] = [&LOCATIONS, &IAM_POLICY, &OPERATIONS];

const GET_OPERATION: &str = "google.longrunning.Operations.GetOperation";

const BUILTIN_DESCRIPTORS: &[(&str, &str)] = &[
    ("google/protobuf/any.proto", include_str!("mixins/any.json")),
    ("google/protobuf/duration.proto", include_str!("mixins/duration.json")),
    ("google/protobuf/empty.proto", include_str!("mixins/empty.json")),
    ("google/protobuf/field_mask.proto", include_str!("mixins/field_mask.json")),
    ("google/rpc/status.proto", include_str!("mixins/status.json")),
    ("google/type/expr.proto", include_str!("mixins/expr.json")),
    ("google/iam/v1/options.proto", include_str!("mixins/options.json")),
    ("google/iam/v1/policy.proto", include_str!("mixins/policy.json")),
    ("google/iam/v1/iam_policy.proto", include_str!("mixins/iam_policy.json")),
    ("google/cloud/location/locations.proto", include_str!("mixins/locations.json")),
    ("google/longrunning/operations.proto", include_str!("mixins/operations.json")),
];

pub fn well_known(api: &str) -> Option<&'static Mixin> {
    CATALOG.into_iter().find(|m| m.api == api)
}

/// Decode the bundled descriptor of `file`, if one ships with the crate.
pub fn builtin_descriptor(file: &str) -> Option<Result<FileDescriptorProtoJson, ParseError>> {
    let (_, text) = BUILTIN_DESCRIPTORS.iter().find(|(name, _)| *name == file)?;
    Some(
        serde_json::from_str(text).map_err(|source| ParseError::MixinDescriptor {
            file: file.to_string(),
            source,
        }),
    )
}

// ============================================================================
// Planning
// ============================================================================

/// Which mixins apply to this build, and which of their methods.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MixinPlan {
    /// In `apis` order, then `Operations` when forced and not listed.
    pub mixins: Vec<&'static Mixin>,
    /// Enabled mixin method selectors, e.g.
    /// `google.cloud.location.Locations.ListLocations`.
    pub enabled: BTreeSet<String>,
}

impl MixinPlan {
    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }
}

/// Decide which mixins and methods to compose.
///
/// `force_long_running` is set when a generated method returns an operation;
/// `GetOperation` is then enabled unless some `Operations` method already is.
pub fn plan_mixins(config: Option<&ServiceConfig>, force_long_running: bool) -> MixinPlan {
    let mut mixins: Vec<&'static Mixin> = Vec::new();
    for api in config.map(|c| c.apis.as_slice()).unwrap_or_default() {
        if let Some(mixin) = well_known(&api.name) {
            if !mixins.contains(&mixin) {
                mixins.push(mixin);
            }
        }
    }
    if force_long_running && !mixins.contains(&&OPERATIONS) {
        mixins.push(&OPERATIONS);
    }

    let mut enabled: BTreeSet<String> = config
        .map(|c| c.http_rules())
        .unwrap_or_default()
        .iter()
        .filter(|rule| mixins.iter().any(|m| m.owns_selector(&rule.selector)))
        .map(|rule| rule.selector.clone())
        .collect();
    if force_long_running && !enabled.iter().any(|s| OPERATIONS.owns_selector(s)) {
        enabled.insert(GET_OPERATION.to_string());
    }

    MixinPlan { mixins, enabled }
}

/// Bundled descriptors for every file the planned mixins need that `set`
/// does not carry.
///
/// A mixin whose service file is neither in `set` nor available as a bundled
/// descriptor is reported and removed from `plan`.
pub fn load_mixin_files(
    ctx: &mut BuildContext,
    set: &FileDescriptorSetJson,
    plan: &mut MixinPlan,
    allow_builtin: bool,
) -> Result<Vec<FileDescriptorProtoJson>, ParseError> {
    let mut loaded: Vec<FileDescriptorProtoJson> = Vec::new();
    let mut available = Vec::with_capacity(plan.mixins.len());

    for mixin in &plan.mixins {
        for file in mixin.support.iter().chain(std::iter::once(&mixin.file)) {
            if set.find_file(file).is_some() || loaded.iter().any(|f| f.name() == *file) {
                continue;
            }
            if !allow_builtin {
                continue;
            }
            if let Some(descriptor) = builtin_descriptor(file) {
                tracing::debug!(file = %file, mixin = %mixin.api, "using bundled mixin descriptor");
                loaded.push(descriptor?);
            }
        }

        let has_service_file =
            set.find_file(mixin.file).is_some() || loaded.iter().any(|f| f.name() == mixin.file);
        if has_service_file {
            available.push(*mixin);
        } else {
            ctx.report(Diagnostic::MixinUnavailable {
                api: mixin.api.to_string(),
            });
        }
    }

    plan.mixins = available;
    Ok(loaded)
}

// ============================================================================
// Composition
// ============================================================================

fn find_mixin_service<'a>(
    sources: &[&'a FileDescriptorProtoJson],
    mixin: &Mixin,
) -> Option<&'a ServiceDescriptorProtoJson> {
    let file = sources.iter().copied().find(|f| f.name() == mixin.file)?;
    file.service.iter().find(|s| s.name() == mixin.service_name())
}

/// Append the enabled mixin methods to every service in `service_ids`.
///
/// Runs after all concrete services are built. Mixin methods are built in the
/// host service's package. A method already registered under the composed
/// name is left alone.
pub fn compose_mixins(
    ctx: &mut BuildContext,
    service_ids: &[String],
    plan: &MixinPlan,
    sources: &[&FileDescriptorProtoJson],
    config: Option<&ServiceConfig>,
) {
    for service_id in service_ids {
        let Some(package) = ctx.state.service(service_id).map(|s| s.package.clone()) else {
            continue;
        };
        for mixin in &plan.mixins {
            let Some(mixin_service) = find_mixin_service(sources, mixin) else {
                continue;
            };
            for raw in &mixin_service.method {
                let mixin_selector = format!("{}.{}", mixin.api, raw.name());
                if !plan.enabled.contains(&mixin_selector) {
                    continue;
                }
                let id = format!("{service_id}.{}", raw.name());
                if ctx.state.contains_method(&id) {
                    continue;
                }

                let override_rule = config.and_then(|c| c.http_rule(&mixin_selector));
                let outcome = match process_method(&ctx.state, raw, &id, &package, override_rule) {
                    Outcome::Skipped(Diagnostic::MethodDropped { reason, .. }) if override_rule.is_some() => {
                        ctx.report(Diagnostic::InvalidOverride {
                            selector: mixin_selector.clone(),
                            reason,
                        });
                        process_method(&ctx.state, raw, &id, &package, None)
                    }
                    other => other,
                };

                match outcome {
                    Outcome::Built(mut method) => {
                        method.host_override = config
                            .and_then(|c| c.backend_address(&mixin_selector))
                            .map(str::to_string);
                        if let Some(service) = ctx.state.service_mut(service_id) {
                            service.methods.push(id);
                        }
                        ctx.state.insert_method(method);
                    }
                    Outcome::Skipped(diagnostic) => ctx.report(diagnostic),
                }
            }
        }
        tracing::debug!(service = %selector(service_id), "composed mixins");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(v: serde_json::Value) -> ServiceConfig {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn bundled_descriptors_decode_under_their_own_names() {
        for (name, _) in BUILTIN_DESCRIPTORS {
            let file = builtin_descriptor(name).unwrap().unwrap();
            assert_eq!(file.name(), *name);
        }
        for mixin in CATALOG {
            assert!(builtin_descriptor(mixin.file).is_some(), "{}", mixin.api);
            for support in mixin.support {
                assert!(builtin_descriptor(support).is_some(), "{support}");
            }
        }
        assert!(builtin_descriptor("google/api/annotations.proto").is_none());
    }

    #[test]
    fn forced_operations_enables_get_operation() {
        let plan = plan_mixins(None, true);
        assert_eq!(plan.mixins, vec![&OPERATIONS]);
        assert_eq!(plan.enabled.iter().collect::<Vec<_>>(), vec![GET_OPERATION]);

        assert!(plan_mixins(None, false).is_empty());
    }

    #[test]
    fn enabled_methods_come_from_listed_mixins_only() {
        let cfg = config(json!({
            "apis": [
                {"name": "google.cloud.secretmanager.v1.SecretManagerService"},
                {"name": "google.cloud.location.Locations"}
            ],
            "http": {"rules": [
                {"selector": "google.cloud.location.Locations.ListLocations", "get": "/v1/{name=projects/*}/locations"},
                {"selector": "google.iam.v1.IAMPolicy.GetIamPolicy", "post": "/v1/{resource=**}:getIamPolicy"},
                {"selector": "google.longrunning.Operations.ListOperations", "get": "/v1/{name=projects/*}/operations"}
            ]}
        }));

        let plan = plan_mixins(Some(&cfg), false);
        assert_eq!(plan.mixins, vec![&LOCATIONS]);
        assert_eq!(
            plan.enabled.iter().collect::<Vec<_>>(),
            vec!["google.cloud.location.Locations.ListLocations"]
        );

        let forced = plan_mixins(Some(&cfg), true);
        assert_eq!(forced.mixins, vec![&LOCATIONS, &OPERATIONS]);
        assert!(forced.enabled.contains("google.longrunning.Operations.ListOperations"));
        assert!(!forced.enabled.contains(GET_OPERATION));
    }

    #[test]
    fn missing_mixin_without_fallback_is_reported() {
        let mut ctx = BuildContext::new();
        let mut plan = plan_mixins(None, true);
        let loaded = load_mixin_files(&mut ctx, &FileDescriptorSetJson::default(), &mut plan, false).unwrap();
        assert!(loaded.is_empty());
        assert!(plan.is_empty());
        assert_eq!(
            ctx.diagnostics(),
            &[Diagnostic::MixinUnavailable {
                api: OPERATIONS.api.to_string()
            }]
        );

        let mut plan = plan_mixins(None, true);
        let loaded = load_mixin_files(&mut ctx, &FileDescriptorSetJson::default(), &mut plan, true).unwrap();
        let names: Vec<&str> = loaded.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "google/protobuf/any.proto",
                "google/protobuf/duration.proto",
                "google/protobuf/empty.proto",
                "google/rpc/status.proto",
                "google/longrunning/operations.proto",
            ]
        );
        assert_eq!(plan.mixins, vec![&OPERATIONS]);
    }

    #[test]
    fn mixin_methods_are_built_in_the_host_package() {
        let host: FileDescriptorProtoJson = serde_json::from_value(json!({
            "name": "acme/v1/widgets.proto",
            "package": "acme.v1",
            "messageType": [{"name": "Widget"}, {"name": "WidgetMetadata"}]
        }))
        .unwrap();
        let operations: FileDescriptorProtoJson = serde_json::from_value(json!({
            "name": "google/longrunning/operations.proto",
            "package": "google.longrunning",
            "messageType": [
                {"name": "Operation"},
                {"name": "GetOperationRequest", "field": [
                    {"name": "name", "number": 1, "label": "LABEL_OPTIONAL", "type": "TYPE_STRING", "jsonName": "name"}
                ]}
            ],
            "service": [{"name": "Operations", "method": [{
                "name": "GetOperation",
                "inputType": ".google.longrunning.GetOperationRequest",
                "outputType": ".google.longrunning.Operation",
                "options": {
                    "[google.api.http]": {"get": "/v1/{name=operations/**}"},
                    "[google.longrunning.operation_info]": {"responseType": "Widget", "metadataType": "WidgetMetadata"}
                }
            }]}]
        }))
        .unwrap();

        let mut ctx = BuildContext::new();
        crate::registrar::register_types(&mut ctx, &[&host, &operations]).unwrap();
        ctx.state.insert_service(apigen_model::Service {
            id: ".acme.v1.Widgets".to_string(),
            name: "Widgets".to_string(),
            package: "acme.v1".to_string(),
            ..Default::default()
        });

        let plan = plan_mixins(None, true);
        compose_mixins(&mut ctx, &[".acme.v1.Widgets".to_string()], &plan, &[&host, &operations], None);

        let method = ctx.state.method(".acme.v1.Widgets.GetOperation").unwrap();
        let info = method.operation_info.as_ref().unwrap();
        assert_eq!(info.response_type_id, ".acme.v1.Widget");
        assert_eq!(info.metadata_type_id, ".acme.v1.WidgetMetadata");
        assert_eq!(
            ctx.state.service(".acme.v1.Widgets").unwrap().methods,
            vec![".acme.v1.Widgets.GetOperation"]
        );
    }
}
