//! Service configuration (`google.api.Service`, JSON form).
//!
//! Only the parts the model builder reads are kept; everything else in the
//! document is ignored.

use serde::Deserialize;

use crate::http::HttpRule;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub documentation: Option<DocumentationConfig>,
    #[serde(default)]
    pub apis: Vec<ApiConfig>,
    #[serde(default)]
    pub http: Option<HttpConfig>,
    #[serde(default)]
    pub backend: Option<BackendConfig>,
    #[serde(default)]
    pub publishing: Option<PublishingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentationConfig {
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub rules: Vec<HttpRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub rules: Vec<BackendRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendRule {
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishingConfig {
    #[serde(default, rename = "methodSettings", alias = "method_settings")]
    pub method_settings: Vec<MethodSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MethodSettings {
    #[serde(default)]
    pub selector: String,
    #[serde(default, rename = "autoPopulatedFields", alias = "auto_populated_fields")]
    pub auto_populated_fields: Vec<String>,
}

impl ServiceConfig {
    /// The short API name, `secretmanager` for `secretmanager.googleapis.com`.
    pub fn api_name(&self) -> &str {
        self.name
            .strip_suffix(".googleapis.com")
            .unwrap_or(&self.name)
    }

    pub fn summary(&self) -> &str {
        self.documentation
            .as_ref()
            .map(|d| d.summary.as_str())
            .unwrap_or_default()
    }

    pub fn http_rules(&self) -> &[HttpRule] {
        self.http.as_ref().map(|h| h.rules.as_slice()).unwrap_or_default()
    }

    pub fn backend_rules(&self) -> &[BackendRule] {
        self.backend
            .as_ref()
            .map(|b| b.rules.as_slice())
            .unwrap_or_default()
    }

    pub fn method_settings(&self) -> &[MethodSettings] {
        self.publishing
            .as_ref()
            .map(|p| p.method_settings.as_slice())
            .unwrap_or_default()
    }

    /// The HTTP rule overriding `selector`, if any.
    pub fn http_rule(&self, selector: &str) -> Option<&HttpRule> {
        self.http_rules().iter().find(|r| r.selector == selector)
    }

    /// The backend address for `selector`, if any.
    pub fn backend_address(&self, selector: &str) -> Option<&str> {
        self.backend_rules()
            .iter()
            .find(|r| r.selector == selector && !r.address.is_empty())
            .map(|r| r.address.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_rules_and_settings() {
        let config: ServiceConfig = serde_json::from_value(json!({
            "type": "google.api.Service",
            "name": "secretmanager.googleapis.com",
            "title": "Secret Manager API",
            "documentation": {"summary": "Stores sensitive data."},
            "apis": [
                {"name": "google.cloud.secretmanager.v1.SecretManagerService"},
                {"name": "google.cloud.location.Locations"}
            ],
            "http": {"rules": [{
                "selector": "google.cloud.location.Locations.GetLocation",
                "get": "/v1/{name=projects/*/locations/*}"
            }]},
            "backend": {"rules": [{
                "selector": "google.cloud.location.Locations.GetLocation",
                "address": "https://locations.example.com"
            }]},
            "publishing": {"methodSettings": [{
                "selector": "google.cloud.secretmanager.v1.SecretManagerService.CreateSecret",
                "autoPopulatedFields": ["request_id"]
            }]}
        }))
        .unwrap();

        assert_eq!(config.api_name(), "secretmanager");
        assert_eq!(config.summary(), "Stores sensitive data.");
        assert_eq!(config.apis.len(), 2);
        assert!(config.http_rule("google.cloud.location.Locations.GetLocation").is_some());
        assert!(config.http_rule("google.cloud.location.Locations.ListLocations").is_none());
        assert_eq!(
            config.backend_address("google.cloud.location.Locations.GetLocation"),
            Some("https://locations.example.com")
        );
        assert_eq!(config.method_settings()[0].auto_populated_fields, vec!["request_id"]);
    }

    #[test]
    fn empty_config_has_no_rules() {
        let config = ServiceConfig::default();
        assert!(config.http_rules().is_empty());
        assert!(config.backend_rules().is_empty());
        assert!(config.method_settings().is_empty());
        assert_eq!(config.summary(), "");
        assert_eq!(config.api_name(), "");
    }
}
