//! `(google.api.routing)` → `RoutingInfo`.
//!
//! Each routing parameter extracts one header value from a request field. A
//! parameter without a path template sends the whole field under its own
//! name; otherwise the template holds exactly one `{name=matcher}` variable,
//! optionally surrounded by a literal prefix and suffix.

use apigen_model::RoutingInfo;
use serde::Deserialize;

use crate::annotations::{self, ROUTING};
use crate::descriptor::OptionsJson;
use crate::error::AnnotationError;

#[derive(Debug, Clone, Default, Deserialize)]
struct RoutingRuleJson {
    #[serde(default, rename = "routingParameters", alias = "routing_parameters")]
    routing_parameters: Vec<RoutingParameterJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RoutingParameterJson {
    #[serde(default)]
    field: String,
    #[serde(default, rename = "pathTemplate", alias = "path_template")]
    path_template: String,
}

/// Routing parameters of a method, empty when the annotation is absent.
pub fn parse_routing(options: Option<&OptionsJson>) -> Result<Vec<RoutingInfo>, AnnotationError> {
    let rule = match annotations::decode_extension::<RoutingRuleJson>(options, ROUTING) {
        None => return Ok(Vec::new()),
        Some(rule) => rule?,
    };
    rule.routing_parameters
        .iter()
        .map(|p| routing_parameter(&p.field, &p.path_template))
        .collect()
}

fn routing_parameter(field: &str, template: &str) -> Result<RoutingInfo, AnnotationError> {
    if template.is_empty() {
        return Ok(RoutingInfo {
            field_path: field.to_string(),
            name: field.to_string(),
            prefix: String::new(),
            matcher: "**".to_string(),
            suffix: String::new(),
        });
    }

    let malformed = |reason: &str| AnnotationError::RoutingTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let open = template.find('{').ok_or_else(|| malformed("no variable"))?;
    let close = template[open..]
        .find('}')
        .map(|i| open + i)
        .ok_or_else(|| malformed("unbalanced `{`"))?;
    let (prefix, rest) = template.split_at(open);
    let inner = &rest[1..close - open];
    let suffix = &template[close + 1..];
    if prefix.contains('}') || inner.contains('{') {
        return Err(malformed("unbalanced braces"));
    }
    if suffix.contains(['{', '}']) {
        return Err(malformed("more than one variable"));
    }

    let (name, matcher) = inner.split_once('=').unwrap_or((inner, "*"));
    if name.is_empty() || matcher.is_empty() {
        return Err(malformed("empty variable"));
    }
    Ok(RoutingInfo {
        field_path: field.to_string(),
        name: name.to_string(),
        prefix: prefix.to_string(),
        matcher: matcher.to_string(),
        suffix: suffix.to_string(),
    })
}
