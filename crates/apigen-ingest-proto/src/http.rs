//! `google.api.HttpRule` bindings → `PathInfo`.

use apigen_model::{Message, PathInfo, PathSegment};
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::error::AnnotationError;

/// `google.api.HttpRule`, as found both in the `(google.api.http)` method
/// option and in the service configuration `http.rules`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HttpRule {
    #[serde(default)]
    pub selector: String,
    pub get: Option<String>,
    pub put: Option<String>,
    pub post: Option<String>,
    pub delete: Option<String>,
    pub patch: Option<String>,
    pub custom: Option<CustomHttpPattern>,
    pub body: Option<String>,
    #[serde(default, rename = "additionalBindings", alias = "additional_bindings")]
    pub additional_bindings: Vec<HttpRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomHttpPattern {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub path: String,
}

impl HttpRule {
    /// The verb and raw path template of the rule.
    pub fn pattern(&self) -> Result<(&'static str, &str), AnnotationError> {
        let candidates = [
            ("GET", &self.get),
            ("PUT", &self.put),
            ("POST", &self.post),
            ("DELETE", &self.delete),
            ("PATCH", &self.patch),
        ];
        for (verb, path) in candidates {
            if let Some(path) = path {
                return Ok((verb, path));
            }
        }
        match &self.custom {
            Some(custom) => Err(AnnotationError::UnsupportedVerb(format!(
                "custom({})",
                custom.kind
            ))),
            None => Err(AnnotationError::UnsupportedVerb("<none>".to_string())),
        }
    }

    /// The body field path, `None` for an empty or absent body.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.is_empty())
    }
}

/// Build the `PathInfo` of a method whose request message is `input`.
pub fn parse_path_info(rule: &HttpRule, input: &Message) -> Result<PathInfo, AnnotationError> {
    let (verb, raw_path) = rule.pattern()?;
    let path_template = parse_path_template(raw_path)?;
    let body = rule.body();
    let query_parameters = query_parameters(input, &path_template, body);
    Ok(PathInfo {
        verb: verb.to_string(),
        path_template,
        query_parameters,
        body_field_path: body.map(str::to_string),
    })
}

/// Parse a path template such as `/v1/{name=projects/*/secrets/*}:addVersion`.
///
/// Slashes and colons inside `{...}` belong to the variable pattern. A colon
/// outside braces starts the custom verb, which must be the last segment.
pub fn parse_path_template(raw: &str) -> Result<Vec<PathSegment>, AnnotationError> {
    let malformed = |reason: &str| AnnotationError::PathTemplate {
        template: raw.to_string(),
        reason: reason.to_string(),
    };

    let template = raw.strip_prefix('/').unwrap_or(raw);
    if template.is_empty() {
        return Err(malformed("empty template"));
    }

    let mut pieces: Vec<&str> = Vec::new();
    let mut verb: Option<&str> = None;
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, c) in template.char_indices() {
        match c {
            '{' => {
                if depth > 0 {
                    return Err(malformed("nested variable"));
                }
                depth = 1;
            }
            '}' => {
                if depth == 0 {
                    return Err(malformed("unbalanced `}`"));
                }
                depth = 0;
            }
            '/' if depth == 0 => {
                pieces.push(&template[start..idx]);
                start = idx + 1;
            }
            ':' if depth == 0 => {
                pieces.push(&template[start..idx]);
                verb = Some(&template[idx + 1..]);
                start = template.len();
                break;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(malformed("unbalanced `{`"));
    }
    if verb.is_none() {
        pieces.push(&template[start..]);
    }

    let mut segments = Vec::with_capacity(pieces.len() + 1);
    for piece in pieces {
        if piece.is_empty() {
            return Err(malformed("empty segment"));
        }
        if let Some(inner) = piece.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            let field_path = inner.split_once('=').map_or(inner, |(name, _)| name);
            if field_path.is_empty() {
                return Err(malformed("variable without a field path"));
            }
            segments.push(PathSegment::FieldPath(field_path.to_string()));
        } else if piece.contains(['{', '}']) {
            return Err(malformed("variable must span a whole segment"));
        } else {
            segments.push(PathSegment::Literal(piece.to_string()));
        }
    }
    if let Some(verb) = verb {
        if verb.is_empty() || verb.contains(['/', '{', '}', ':']) {
            return Err(malformed("invalid custom verb"));
        }
        segments.push(PathSegment::Verb(verb.to_string()));
    }
    Ok(segments)
}

/// Request fields that are neither bound in the path nor sent in the body.
fn query_parameters(input: &Message, template: &[PathSegment], body: Option<&str>) -> BTreeSet<String> {
    if body == Some("*") {
        return BTreeSet::new();
    }
    let path_fields: BTreeSet<&str> = template
        .iter()
        .filter_map(|s| match s {
            PathSegment::FieldPath(p) => Some(p.split('.').next().unwrap_or(p.as_str())),
            _ => None,
        })
        .collect();
    input
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .filter(|name| Some(*name) != body && !path_fields.contains(name))
        .map(str::to_string)
        .collect()
}
