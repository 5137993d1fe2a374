//! Integration tests for the complete apigen pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - descriptor set JSON → `build_api` → `Api`
//! - `Api` → JSON file → `Api` (renderers read the model back)
//! - model digests survive the round trip
//!
//! Run with: cargo test --test integration_tests

use anyhow::Result;
use apigen_ingest_proto::{build_api, parse_descriptor_set_json, parse_service_config_json, ApiBuild, BuildOptions};
use apigen_model::{model_digest, Api, Symbol};
use std::fs;
use tempfile::tempdir;

const DESCRIPTOR: &str = include_str!("../crates/apigen-ingest-proto/tests/fixtures/secretmanager_descriptor.json");
const SERVICE_CONFIG: &str =
    include_str!("../crates/apigen-ingest-proto/tests/fixtures/secretmanager_service_config.json");

fn build_secretmanager() -> Result<ApiBuild> {
    let set = parse_descriptor_set_json(DESCRIPTOR)?;
    let config = parse_service_config_json(SERVICE_CONFIG)?;
    let options = BuildOptions::default()
        .with_files(["google/cloud/secretmanager/v1/service.proto"])
        .with_service_config(config);
    Ok(build_api(&set, &options)?)
}

// ============================================================================
// Model persistence
// ============================================================================

#[test]
fn test_model_json_round_trip_preserves_digest() -> Result<()> {
    let build = build_secretmanager()?;
    let dir = tempdir()?;
    let path = dir.path().join("model.json");
    fs::write(&path, serde_json::to_string_pretty(&build.api)?)?;

    let restored: Api = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(restored, build.api);
    assert_eq!(model_digest(&restored)?, model_digest(&build.api)?);
    Ok(())
}

#[test]
fn test_build_is_deterministic_across_runs() -> Result<()> {
    let a = build_secretmanager()?;
    let b = build_secretmanager()?;
    assert_eq!(serde_json::to_string(&a)?, serde_json::to_string(&b)?);
    Ok(())
}

// ============================================================================
// Renderer-facing invariants
// ============================================================================

#[test]
fn test_every_type_reference_resolves() -> Result<()> {
    let api = build_secretmanager()?.api;
    let state = &api.state;

    for (id, symbol) in state.symbols() {
        match symbol {
            Symbol::Service(service) => {
                for method in &service.methods {
                    assert!(state.method(method).is_some(), "{id}: dangling method {method}");
                }
            }
            Symbol::Method(method) => {
                assert!(state.message(&method.input_type_id).is_some(), "{id}: input");
                assert!(state.message(&method.output_type_id).is_some(), "{id}: output");
                if let Some(info) = &method.operation_info {
                    assert!(state.message(&info.metadata_type_id).is_some(), "{id}: metadata");
                    assert!(state.message(&info.response_type_id).is_some(), "{id}: response");
                }
            }
            Symbol::Message(message) => {
                for field in message.fields.iter().filter(|f| f.typez.references_type()) {
                    let resolved = field.type_id.as_deref().is_some_and(|t| state.resolves_type(t));
                    assert!(resolved, "{id}.{}: {:?}", field.name, field.type_id);
                }
                for nested in &message.messages {
                    assert!(state.message(nested).is_some(), "{id}: nested {nested}");
                }
            }
            Symbol::Enum(enumeration) => {
                assert!(enumeration.unique_values().count() <= enumeration.values.len());
            }
        }
    }
    Ok(())
}

#[test]
fn test_api_tree_lists_only_generated_files() -> Result<()> {
    let api = build_secretmanager()?.api;
    assert!(api.messages.iter().all(|id| id.starts_with(".google.cloud.secretmanager.v1.")));
    assert!(!api.messages.iter().any(|id| id == ".google.protobuf.Empty"));
    // Empty is still resolvable for DeleteSecret.
    assert!(api.state.message(".google.protobuf.Empty").is_some());

    let service = api.services().next().map(|s| s.name.clone());
    assert_eq!(service.as_deref(), Some("SecretManagerService"));
    Ok(())
}
