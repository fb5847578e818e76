use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::extract::validate_table_name;
use crate::model::ExtractRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest = load_manifest(&args.manifest_path)?;

    info!(
        run_id = %manifest.run_id,
        status = %manifest.status,
        started_at = %manifest.started_at,
        updated_at = %manifest.updated_at,
        format = %manifest.format,
        strict_hierarchy = manifest.config.strict_hierarchy,
        allow_zero_root = manifest.config.allow_zero_root,
        skip_toc_entries = manifest.config.skip_toc_entries,
        strip_page_furniture = manifest.config.strip_page_furniture,
        ocr_mode = %manifest.config.ocr_mode,
        rows = manifest.row_count,
        warnings = manifest.warnings.len(),
        "loaded extract run manifest"
    );

    for document in &manifest.documents {
        info!(
            document = %document.document,
            kind = document.kind.as_str(),
            pages = document.page_count,
            ocr_pages = document.ocr_page_count,
            clauses = document.clause_count,
            rejected = document.rejected_candidates,
            "document summary"
        );
    }

    let output_path = Path::new(&manifest.paths.output_path);
    if !output_path.exists() {
        warn!(path = %output_path.display(), "output file missing");
        return Ok(());
    }

    match manifest.paths.sqlite_table.as_deref() {
        Some(table) => {
            let conn = Connection::open(output_path)
                .with_context(|| format!("failed to open {}", output_path.display()))?;
            match count_rows(&conn, table) {
                Ok(stored) => info!(
                    path = %output_path.display(),
                    table = %table,
                    stored_rows = stored,
                    "database status"
                ),
                Err(error) => warn!(
                    path = %output_path.display(),
                    table = %table,
                    error = %error,
                    "failed to count stored rows"
                ),
            }
        }
        None => info!(path = %output_path.display(), "output file present"),
    }

    Ok(())
}

pub fn load_manifest(path: &Path) -> Result<ExtractRunManifest> {
    if !path.exists() {
        bail!("run manifest missing: {}", path.display());
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    validate_table_name(table)?;

    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_manifest_reports_missing_and_malformed_files() {
        let dir = std::env::temp_dir().join(format!("clausex_status_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");

        assert!(load_manifest(&dir.join("absent.json")).is_err());

        let malformed = dir.join("malformed.json");
        fs::write(&malformed, b"{\"run_id\": 1}").expect("write manifest");
        assert!(load_manifest(&malformed).is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn count_rows_rejects_unsafe_table_names() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch("CREATE TABLE clauses (id INTEGER);")
            .expect("create table");

        assert_eq!(count_rows(&conn, "clauses").expect("count"), 0);
        assert!(count_rows(&conn, "clauses; DROP TABLE clauses").is_err());
        assert!(count_rows(&conn, "1clauses").is_err());
    }
}
