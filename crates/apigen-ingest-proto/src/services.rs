//! Service and method construction for the files being generated.

use apigen_model::{ApiState, Method, Service};

use crate::annotations::{self, HTTP};
use crate::context::BuildContext;
use crate::descriptor::{FileDescriptorProtoJson, MethodDescriptorProtoJson, ServiceDescriptorProtoJson};
use crate::error::{AnnotationError, Diagnostic, Outcome};
use crate::http::{self, HttpRule};
use crate::registrar::top_level_id;
use crate::routing;
use crate::service_config::ServiceConfig;

pub const OPERATION_TYPE: &str = ".google.longrunning.Operation";
pub const EMPTY_TYPE: &str = ".google.protobuf.Empty";

/// Build one method.
///
/// `override_rule` replaces the `(google.api.http)` annotation; it is set for
/// mixin methods re-bound by the service configuration.
pub fn process_method(
    state: &ApiState,
    raw: &MethodDescriptorProtoJson,
    id: &str,
    package: &str,
    override_rule: Option<&HttpRule>,
) -> Outcome<Method> {
    match try_process_method(state, raw, id, package, override_rule) {
        Ok(method) => Outcome::Built(method),
        Err(err) => Outcome::Skipped(Diagnostic::method_dropped(id, &err)),
    }
}

fn try_process_method(
    state: &ApiState,
    raw: &MethodDescriptorProtoJson,
    id: &str,
    package: &str,
    override_rule: Option<&HttpRule>,
) -> Result<Method, AnnotationError> {
    let options = raw.options.as_ref();
    let annotated;
    let rule = match override_rule {
        Some(rule) => rule,
        None => {
            annotated = annotations::decode_extension::<HttpRule>(options, HTTP)
                .ok_or(AnnotationError::MissingHttpRule)??;
            &annotated
        }
    };

    let input = state
        .message(raw.input_type())
        .ok_or_else(|| AnnotationError::UnresolvedType(raw.input_type().to_string()))?;
    if !state.resolves_type(raw.output_type()) {
        return Err(AnnotationError::UnresolvedType(raw.output_type().to_string()));
    }

    let path_info = http::parse_path_info(rule, input)?;
    let routing = routing::parse_routing(options)?;
    let operation_info = if raw.output_type() == OPERATION_TYPE {
        annotations::operation_info(package, options)
    } else {
        None
    };

    Ok(Method {
        id: id.to_string(),
        name: raw.name().to_string(),
        input_type_id: raw.input_type().to_string(),
        output_type_id: raw.output_type().to_string(),
        path_info,
        routing,
        client_side_streaming: raw.client_streaming.unwrap_or(false),
        server_side_streaming: raw.server_streaming.unwrap_or(false),
        operation_info,
        returns_empty: raw.output_type() == EMPTY_TYPE,
        deprecated: annotations::is_deprecated(options),
        ..Default::default()
    })
}

/// Build `raw` and its methods, register them, and return the service id.
///
/// Dropped methods are reported and left out of the service.
pub fn process_service(
    ctx: &mut BuildContext,
    file: &FileDescriptorProtoJson,
    raw: &ServiceDescriptorProtoJson,
    config: Option<&ServiceConfig>,
) -> String {
    let package = file.package();
    let id = top_level_id(package, raw.name());
    let mut service = Service {
        id: id.clone(),
        name: raw.name().to_string(),
        package: package.to_string(),
        default_host: annotations::default_host(raw.options.as_ref()),
        deprecated: annotations::is_deprecated(raw.options.as_ref()),
        ..Default::default()
    };

    for raw_method in &raw.method {
        let method_id = format!("{id}.{}", raw_method.name());
        match process_method(&ctx.state, raw_method, &method_id, package, None) {
            Outcome::Built(mut method) => {
                method.host_override = config
                    .and_then(|c| c.backend_address(selector(&method_id)))
                    .map(str::to_string);
                service.methods.push(method_id);
                ctx.state.insert_method(method);
            }
            Outcome::Skipped(diagnostic) => ctx.report(diagnostic),
        }
    }

    tracing::debug!(service = %id, methods = service.methods.len(), "built service");
    ctx.state.insert_service(service);
    id
}

/// The service configuration selector of an FQN: no leading dot.
pub fn selector(id: &str) -> &str {
    id.strip_prefix('.').unwrap_or(id)
}

/// Whether any method of `files` returns a long-running operation.
pub fn requires_long_running_mixin(files: &[&FileDescriptorProtoJson]) -> bool {
    files
        .iter()
        .copied()
        .flat_map(|f| &f.service)
        .flat_map(|s| &s.method)
        .any(|m| m.output_type() == OPERATION_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::register_types;
    use serde_json::json;

    fn file(v: serde_json::Value) -> FileDescriptorProtoJson {
        serde_json::from_value(v).unwrap()
    }

    fn fixture() -> FileDescriptorProtoJson {
        file(json!({
            "name": "test/v1/svc.proto",
            "package": "test.v1",
            "messageType": [
                {"name": "GetThingRequest", "field": [
                    {"name": "name", "number": 1, "type": "TYPE_STRING"},
                    {"name": "view", "number": 2, "type": "TYPE_STRING"}
                ]},
                {"name": "Thing", "field": [{"name": "name", "number": 1, "type": "TYPE_STRING"}]}
            ],
            "service": [{
                "name": "Things",
                "options": {"[google.api.default_host]": "things.example.com"},
                "method": [
                    {
                        "name": "GetThing",
                        "inputType": ".test.v1.GetThingRequest",
                        "outputType": ".test.v1.Thing",
                        "options": {
                            "[google.api.http]": {"get": "/v1/{name=things/*}"},
                            "[google.api.routing]": {"routingParameters": [{"field": "name"}]}
                        }
                    },
                    {
                        "name": "Unannotated",
                        "inputType": ".test.v1.GetThingRequest",
                        "outputType": ".test.v1.Thing"
                    },
                    {
                        "name": "Custom",
                        "inputType": ".test.v1.GetThingRequest",
                        "outputType": ".test.v1.Thing",
                        "options": {"[google.api.http]": {"custom": {"kind": "HEAD", "path": "/v1/x"}}}
                    },
                    {
                        "name": "Unresolved",
                        "inputType": ".test.v1.Missing",
                        "outputType": ".test.v1.Thing",
                        "options": {"[google.api.http]": {"get": "/v1/x"}}
                    },
                    {
                        "name": "BadRouting",
                        "inputType": ".test.v1.GetThingRequest",
                        "outputType": ".test.v1.Thing",
                        "options": {
                            "[google.api.http]": {"get": "/v1/{name=things/*}"},
                            "[google.api.routing]": {"routingParameters": [{"field": "name", "pathTemplate": "{a}/{b}"}]}
                        }
                    }
                ]
            }]
        }))
    }

    #[test]
    fn builds_annotated_methods_and_drops_the_rest() {
        let f = fixture();
        let mut ctx = BuildContext::new();
        register_types(&mut ctx, &[&f]).unwrap();
        let id = process_service(&mut ctx, &f, &f.service[0], None);

        let service = ctx.state.service(&id).unwrap();
        assert_eq!(service.default_host, "things.example.com");
        assert_eq!(service.methods, vec![".test.v1.Things.GetThing"]);

        let method = ctx.state.method(".test.v1.Things.GetThing").unwrap();
        assert_eq!(method.path_info.verb, "GET");
        assert_eq!(method.path_info.query_parameters.iter().collect::<Vec<_>>(), vec!["view"]);
        assert_eq!(method.routing.len(), 1);
        assert!(!method.returns_empty);

        let dropped: Vec<&str> = ctx
            .diagnostics()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::MethodDropped { method, .. } => Some(method.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            dropped,
            vec![
                ".test.v1.Things.Unannotated",
                ".test.v1.Things.Custom",
                ".test.v1.Things.Unresolved",
                ".test.v1.Things.BadRouting",
            ]
        );
        assert!(!ctx.state.contains_method(".test.v1.Things.Custom"));
    }

    #[test]
    fn override_rule_replaces_annotation() {
        let f = fixture();
        let mut ctx = BuildContext::new();
        register_types(&mut ctx, &[&f]).unwrap();
        let rule: HttpRule = serde_json::from_value(json!({"post": "/v2/{name=things/*}:get", "body": "*"})).unwrap();
        let raw = &f.service[0].method[1];

        let outcome = process_method(&ctx.state, raw, ".test.v1.Things.Unannotated", "test.v1", Some(&rule));
        let method = outcome.built().unwrap();
        assert_eq!(method.path_info.verb, "POST");
        assert!(method.path_info.query_parameters.is_empty());
    }

    #[test]
    fn detects_long_running_methods() {
        let f = file(json!({
            "name": "lro.proto",
            "service": [{"name": "S", "method": [
                {"name": "M", "inputType": ".Req", "outputType": ".google.longrunning.Operation"}
            ]}]
        }));
        assert!(requires_long_running_mixin(&[&f]));
        assert!(!requires_long_running_mixin(&[&fixture()]));
    }
}
