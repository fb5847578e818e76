use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};

use crate::cli::ExportFormat;
use crate::clause::{ClauseRow, rows_to_csv, rows_to_markdown};
use crate::util::{ensure_directory, write_json_pretty, write_text_file};

pub(super) fn write_rows(
    format: ExportFormat,
    rows: &[ClauseRow],
    output_path: &Path,
    table: &str,
) -> Result<usize> {
    if let Some(parent) = output_path.parent() {
        ensure_directory(parent)?;
    }

    match format {
        ExportFormat::Csv => write_text_file(output_path, &rows_to_csv(rows))?,
        ExportFormat::Json => write_json_pretty(output_path, &rows)?,
        ExportFormat::Markdown => write_text_file(output_path, &rows_to_markdown(rows))?,
        ExportFormat::Sqlite => {
            let mut connection = Connection::open(output_path)
                .with_context(|| format!("failed to open {}", output_path.display()))?;
            return insert_rows(&mut connection, table, rows);
        }
    }

    Ok(rows.len())
}

/// Appends rows to `table`, creating it when missing. Ids keep counting
/// across runs so repeated exports concatenate.
pub(super) fn insert_rows(
    connection: &mut Connection,
    table: &str,
    rows: &[ClauseRow],
) -> Result<usize> {
    validate_table_name(table)?;

    connection
        .execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS {table} (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              document TEXT NOT NULL,
              clause_number TEXT NOT NULL,
              content TEXT NOT NULL,
              description TEXT NOT NULL DEFAULT ''
            );
            "
        ))
        .with_context(|| format!("failed to create table {table}"))?;

    let tx = connection.transaction()?;
    {
        let mut statement = tx.prepare(&format!(
            "
            INSERT INTO {table}(document, clause_number, content, description)
            VALUES(?1, ?2, ?3, ?4)
            "
        ))?;

        for row in rows {
            statement.execute(params![
                &row.document,
                &row.clause_number,
                &row.clause_text,
                &row.description
            ])?;
        }
    }
    tx.commit()?;

    Ok(rows.len())
}

pub(crate) fn validate_table_name(table: &str) -> Result<()> {
    let mut characters = table.chars();
    let valid_start = characters
        .next()
        .map(|character| character.is_ascii_alphabetic() || character == '_')
        .unwrap_or(false);
    let valid_rest = characters.all(|character| character.is_ascii_alphanumeric() || character == '_');
    if !valid_start || !valid_rest {
        bail!("invalid table name '{table}': use letters, digits and underscores");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(document: &str, number: &str, text: &str) -> ClauseRow {
        ClauseRow {
            document: document.to_string(),
            clause_number: number.to_string(),
            clause_text: text.to_string(),
            description: String::new(),
            outline_level: 1,
        }
    }

    #[test]
    fn insert_rows_appends_in_order() {
        let mut connection = Connection::open_in_memory().expect("in-memory db");
        let rows = vec![row("a.pdf", "6.2", "Second"), row("a.pdf", "6.1", "First")];

        assert_eq!(insert_rows(&mut connection, "document_content", &rows).expect("insert"), 2);
        insert_rows(&mut connection, "document_content", &rows[..1]).expect("insert again");

        let mut statement = connection
            .prepare("SELECT clause_number, content FROM document_content ORDER BY id")
            .expect("prepare");
        let stored = statement
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .expect("query")
            .collect::<rusqlite::Result<Vec<(String, String)>>>()
            .expect("rows");

        assert_eq!(
            stored,
            vec![
                ("6.2".to_string(), "Second".to_string()),
                ("6.1".to_string(), "First".to_string()),
                ("6.2".to_string(), "Second".to_string()),
            ]
        );
    }

    #[test]
    fn insert_rows_rejects_unsafe_table_names() {
        let mut connection = Connection::open_in_memory().expect("in-memory db");
        for table in ["", "1clauses", "clauses; DROP TABLE x", "my-table"] {
            assert!(insert_rows(&mut connection, table, &[]).is_err(), "{table}");
        }
        assert!(insert_rows(&mut connection, "_clauses2", &[]).is_ok());
    }
}
