use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cli::{ExportFormat, ExtractArgs, OcrMode};
use crate::clause::{ClauseExtractor, ClauseRecord, Document, build_rows};
use crate::commands::inventory::{
    CONVERTED_OUTPUT_PREFIX, EXTRACT_MANIFEST_PREFIX, discover_inputs, file_name_of, input_kind_of,
};
use crate::model::{DocumentSummary, ExtractConfigSnapshot, ExtractPaths, ExtractRunManifest};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

use super::export::write_rows;
use super::page_cleanup::strip_page_furniture;
use super::sources::{SourceOptions, collect_tool_versions, load_pages};

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let inputs = resolve_inputs(&args)?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&inputs, args.format));
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        output_path.with_file_name(format!(
            "{}{}.json",
            EXTRACT_MANIFEST_PREFIX,
            utc_compact_string(started_ts)
        ))
    });

    info!(
        run_id = %run_id,
        inputs = inputs.len(),
        format = args.format.as_str(),
        "starting extraction"
    );

    let config = config_snapshot(&args);
    let extractor = ClauseExtractor::new(config.clause_config())?;
    let source_options = SourceOptions {
        ocr_mode: args.ocr_mode,
        ocr_lang: args.ocr_lang.clone(),
        ocr_min_text_chars: args.ocr_min_text_chars,
        max_pages_per_doc: args.max_pages_per_doc,
    };

    let mut extracted = Vec::<(String, Vec<ClauseRecord>)>::with_capacity(inputs.len());
    let mut summaries = Vec::<DocumentSummary>::with_capacity(inputs.len());
    let mut warnings = Vec::<String>::new();

    for path in &inputs {
        let processed = process_input(
            path,
            &extractor,
            &source_options,
            args.strip_page_furniture,
        )?;
        warnings.extend(processed.warnings);
        summaries.push(processed.summary);
        extracted.push((processed.document, processed.records));
    }

    let rows = build_rows(
        extracted
            .iter()
            .map(|(document, records)| (document.as_str(), records.as_slice())),
    );
    if rows.is_empty() {
        warn!("no numbered clauses detected");
        warnings.push("no numbered clauses detected".to_string());
    }

    let written = write_rows(args.format, &rows, &output_path, &args.table)?;
    info!(
        path = %output_path.display(),
        rows = written,
        format = args.format.as_str(),
        "wrote clause table"
    );

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_extract_command(&args),
        format: args.format.as_str().to_string(),
        config,
        tool_versions: collect_tool_versions(),
        paths: ExtractPaths {
            inputs: inputs
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
            output_path: output_path.display().to_string(),
            manifest_path: manifest_path.display().to_string(),
            sqlite_table: matches!(args.format, ExportFormat::Sqlite).then(|| args.table.clone()),
        },
        row_count: rows.len(),
        documents: summaries,
        warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote extract run manifest");
    info!(rows = manifest.row_count, documents = manifest.documents.len(), "extraction completed");

    Ok(())
}

#[derive(Debug)]
struct ProcessedInput {
    document: String,
    records: Vec<ClauseRecord>,
    summary: DocumentSummary,
    warnings: Vec<String>,
}

fn process_input(
    path: &Path,
    extractor: &ClauseExtractor,
    source_options: &SourceOptions,
    strip_furniture: bool,
) -> Result<ProcessedInput> {
    let name = file_name_of(path)?;
    let kind = input_kind_of(path)?;
    let sha256 = sha256_file(path)?;

    let mut extraction = load_pages(path, kind, source_options)
        .with_context(|| format!("failed to load pages from {}", path.display()))?;

    let mut summary = DocumentSummary {
        document: name.clone(),
        kind,
        sha256,
        page_count: extraction.pages.len(),
        ocr_page_count: extraction.ocr_page_count,
        empty_page_count: extraction.empty_page_count,
        header_lines_removed: 0,
        footer_lines_removed: 0,
        dehyphenation_merges: 0,
        clause_count: 0,
        lines_seen: 0,
        continuation_fragments: 0,
        preamble_lines_dropped: 0,
        rejected_candidates: 0,
    };

    if strip_furniture {
        let counts = strip_page_furniture(&mut extraction.pages);
        summary.header_lines_removed = counts.header_lines_removed;
        summary.footer_lines_removed = counts.footer_lines_removed;
        summary.dehyphenation_merges = counts.dehyphenation_merges;
        debug!(
            document = %name,
            headers = counts.header_lines_removed,
            footers = counts.footer_lines_removed,
            merges = counts.dehyphenation_merges,
            "stripped page furniture"
        );
    }

    let document = Document::new(name.clone(), extraction.pages);
    let assembly = extractor.extract(&document);
    summary.apply_stats(&assembly.stats);

    let mut warnings = extraction.warnings;
    for warning in &warnings {
        warn!(document = %name, "{warning}");
    }
    for rejected in &assembly.rejected {
        warn!(
            document = %name,
            page = rejected.page,
            clause = %rejected.number,
            line = %rejected.line,
            reason = %rejected.reason,
            "clause candidate merged as body text"
        );
        warnings.push(format!(
            "{} page {}: rejected clause {} ({})",
            name, rejected.page, rejected.number, rejected.reason
        ));
    }

    if assembly.records.is_empty() {
        warn!(document = %name, pages = summary.page_count, "no numbered clauses detected in document");
    }
    info!(
        document = %name,
        kind = kind.as_str(),
        pages = summary.page_count,
        clauses = assembly.records.len(),
        rejected = summary.rejected_candidates,
        "processed document"
    );

    Ok(ProcessedInput {
        document: document.name,
        records: assembly.records,
        summary,
        warnings,
    })
}

fn resolve_inputs(args: &ExtractArgs) -> Result<Vec<PathBuf>> {
    let mut inputs = args.inputs.clone();
    if let Some(input_dir) = &args.input_dir {
        inputs.extend(discover_inputs(input_dir)?);
    }

    if inputs.is_empty() {
        bail!("no inputs given: pass --input FILE or --input-dir DIR");
    }

    for path in &inputs {
        if !path.is_file() {
            bail!("input not found: {}", path.display());
        }
        input_kind_of(path)?;
    }

    Ok(inputs)
}

/// `converted_<stem>.<ext>` next to a single input, `converted_clauses.<ext>`
/// next to the first of several.
fn default_output_path(inputs: &[PathBuf], format: ExportFormat) -> PathBuf {
    let first = inputs.first().map(PathBuf::as_path).unwrap_or(Path::new("."));
    let stem = if inputs.len() == 1 {
        first
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("clauses")
    } else {
        "clauses"
    };

    first.with_file_name(format!(
        "{}{}.{}",
        CONVERTED_OUTPUT_PREFIX,
        stem,
        format.extension()
    ))
}

fn config_snapshot(args: &ExtractArgs) -> ExtractConfigSnapshot {
    ExtractConfigSnapshot {
        strict_hierarchy: args.strict_hierarchy,
        allow_zero_root: args.allow_zero_root,
        skip_toc_entries: args.skip_toc_entries,
        strip_page_furniture: args.strip_page_furniture,
        ocr_mode: args.ocr_mode.as_str().to_string(),
        ocr_lang: args.ocr_lang.clone(),
        ocr_min_text_chars: args.ocr_min_text_chars,
        max_pages_per_doc: args.max_pages_per_doc,
    }
}

fn render_extract_command(args: &ExtractArgs) -> String {
    let mut command = vec!["clausex".to_string(), "extract".to_string()];

    for path in &args.inputs {
        command.push("--input".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.input_dir {
        command.push("--input-dir".to_string());
        command.push(path.display().to_string());
    }
    command.push("--format".to_string());
    command.push(args.format.as_str().to_string());
    if let Some(path) = &args.output {
        command.push("--output".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if matches!(args.format, ExportFormat::Sqlite) {
        command.push("--table".to_string());
        command.push(args.table.clone());
    }
    if args.strict_hierarchy {
        command.push("--strict-hierarchy".to_string());
    }
    if args.allow_zero_root {
        command.push("--allow-zero-root".to_string());
    }
    if args.skip_toc_entries {
        command.push("--skip-toc-entries".to_string());
    }
    if args.strip_page_furniture {
        command.push("--strip-page-furniture".to_string());
    }
    if let Some(max_pages) = args.max_pages_per_doc {
        command.push("--max-pages-per-doc".to_string());
        command.push(max_pages.to_string());
    }
    if args.ocr_mode != OcrMode::Auto {
        command.push("--ocr-mode".to_string());
        command.push(args.ocr_mode.as_str().to_string());
    }
    if args.ocr_mode != OcrMode::Off {
        command.push("--ocr-lang".to_string());
        command.push(args.ocr_lang.clone());
        command.push("--ocr-min-text-chars".to_string());
        command.push(args.ocr_min_text_chars.to_string());
    }

    command.join(" ")
}

