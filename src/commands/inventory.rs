use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::InventoryArgs;
use crate::model::{InputEntry, InputInventoryManifest, InputKind};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub const INVENTORY_MANIFEST_NAME: &str = "input_inventory.json";
pub const EXTRACT_MANIFEST_PREFIX: &str = "extract_run_";
pub const CONVERTED_OUTPUT_PREFIX: &str = "converted_";

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.input_dir)?;

    if args.dry_run {
        for entry in &manifest.inputs {
            info!(
                filename = %entry.filename,
                kind = entry.kind.as_str(),
                sha256 = %entry.sha256,
                "input discovered"
            );
        }
        info!(
            input_count = manifest.input_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.input_dir.join(INVENTORY_MANIFEST_NAME));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(input_count = manifest.input_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(input_dir: &Path) -> Result<InputInventoryManifest> {
    let input_paths = discover_inputs(input_dir)?;
    if input_paths.is_empty() {
        bail!("no supported inputs found in {}", input_dir.display());
    }

    let mut inputs = Vec::with_capacity(input_paths.len());
    for path in input_paths {
        let filename = file_name_of(&path)?;
        let kind = input_kind_of(&path)?;
        let sha256 = sha256_file(&path)?;

        inputs.push(InputEntry {
            filename,
            kind,
            sha256,
        });
    }

    Ok(InputInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: input_dir.display().to_string(),
        input_count: inputs.len(),
        inputs,
    })
}

/// Supported input files directly under `input_dir`, sorted by file name so
/// directory runs have a stable document order. Manifests and exports this
/// tool writes into the directory by default are not inputs.
pub fn discover_inputs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        if path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_generated_output)
        {
            debug!(path = %path.display(), "skipping generated output");
            continue;
        }

        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(InputKind::from_extension)
            .is_some();

        if supported {
            inputs.push(path);
        }
    }

    inputs.sort();
    Ok(inputs)
}

fn is_generated_output(file_name: &str) -> bool {
    file_name == INVENTORY_MANIFEST_NAME
        || file_name.starts_with(CONVERTED_OUTPUT_PREFIX)
        || (file_name.starts_with(EXTRACT_MANIFEST_PREFIX) && file_name.ends_with(".json"))
}

pub fn input_kind_of(path: &Path) -> Result<InputKind> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    match InputKind::from_extension(extension) {
        Some(kind) => Ok(kind),
        None => bail!(
            "unsupported input type '{}' for {}",
            extension,
            path.display()
        ),
    }
}

pub fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))
}
