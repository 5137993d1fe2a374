//! `apigen model`: build the API model of a descriptor set.

use anyhow::{Context, Result};
use apigen_ingest_proto::{build_api, parse_descriptor_set_json, parse_service_config_json, BuildOptions};
use apigen_model::model_digest;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Descriptor set JSON (`buf build --as-file-descriptor-set`).
    #[arg(long)]
    pub descriptor: PathBuf,

    /// Service config JSON (`google.api.Service`).
    #[arg(long)]
    pub service_config: Option<PathBuf>,

    /// File to generate, matched by suffix against descriptor file names
    /// (repeatable). Without any `--file` or `--source-dir`, every file in
    /// the set is generated.
    #[arg(long = "file")]
    pub files: Vec<String>,

    /// Generate every `.proto` file found under this directory.
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Output JSON file (default: stdout).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit `{ "api": ..., "diagnostics": [...] }` instead of the bare model.
    #[arg(long)]
    pub with_diagnostics: bool,

    /// Print the model digest (`sha256:<hex>`).
    #[arg(long)]
    pub digest: bool,

    /// Do not fall back to the bundled mixin descriptors.
    #[arg(long)]
    pub no_builtin_mixins: bool,
}

pub fn cmd_model(args: &ModelArgs) -> Result<()> {
    let descriptor_text = fs::read_to_string(&args.descriptor)
        .with_context(|| format!("failed to read descriptor json: {}", args.descriptor.display()))?;
    let set = parse_descriptor_set_json(&descriptor_text)
        .with_context(|| format!("invalid descriptor set: {}", args.descriptor.display()))?;

    let mut options = BuildOptions {
        builtin_mixins: !args.no_builtin_mixins,
        ..BuildOptions::default()
    };
    if let Some(path) = &args.service_config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read service config: {}", path.display()))?;
        let config =
            parse_service_config_json(&text).with_context(|| format!("invalid service config: {}", path.display()))?;
        options = options.with_service_config(config);
    }

    let mut files = args.files.clone();
    if let Some(dir) = &args.source_dir {
        files.extend(discover_proto_files(dir)?);
    }
    options = options.with_files(files);

    let build = build_api(&set, &options)?;
    tracing::info!(
        api = %build.api.name,
        services = build.api.services.len(),
        messages = build.api.state.message_by_id.len(),
        diagnostics = build.diagnostics.len(),
        "built API model"
    );

    let json = if args.with_diagnostics {
        serde_json::to_string_pretty(&build)?
    } else {
        serde_json::to_string_pretty(&build.api)?
    };
    let digest = if args.digest {
        Some(model_digest(&build.api)?)
    } else {
        None
    };

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(out, &json).with_context(|| format!("failed to write {}", out.display()))?;
            println!("  {} {}", "→".cyan(), out.display());
            let methods: usize = build.api.services().map(|s| build.api.methods(s).count()).sum();
            println!(
                "  stats: services={} methods={} messages={} enums={} diagnostics={}",
                build.api.services.len(),
                methods,
                build.api.state.message_by_id.len(),
                build.api.state.enum_by_id.len(),
                build.diagnostics.len()
            );
            if let Some(digest) = &digest {
                println!("{digest}");
            }
        }
        None => {
            println!("{json}");
            if let Some(digest) = &digest {
                eprintln!("{digest}");
            }
        }
    }

    for diagnostic in &build.diagnostics {
        eprintln!("{} {}", "skipped:".yellow().bold(), diagnostic);
    }
    Ok(())
}

/// `.proto` files under `dir`, as `/`-separated paths relative to `dir`, sorted.
fn discover_proto_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() || entry.path().extension().and_then(|e| e.to_str()) != Some("proto") {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(name);
    }
    files.sort();
    tracing::debug!(dir = %dir.display(), count = files.len(), "discovered proto files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_nested_proto_files_relative_to_root() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("google/cloud/secretmanager/v1");
        fs::create_dir_all(&nested)?;
        fs::write(nested.join("service.proto"), "syntax = \"proto3\";")?;
        fs::write(nested.join("README.md"), "not a proto")?;
        fs::write(dir.path().join("a.proto"), "syntax = \"proto3\";")?;

        let files = discover_proto_files(dir.path())?;
        assert_eq!(
            files,
            vec!["a.proto".to_string(), "google/cloud/secretmanager/v1/service.proto".to_string()]
        );
        Ok(())
    }
}
