use serde::Serialize;

use super::assembler::ClauseRecord;

pub const CSV_HEADER: [&str; 4] = ["document", "clause_number", "content", "description"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseRow {
    pub document: String,
    pub clause_number: String,
    #[serde(rename = "content")]
    pub clause_text: String,
    /// Left empty for manual annotation after export.
    pub description: String,
    #[serde(skip)]
    pub outline_level: usize,
}

/// Flattens per-document records into one table, documents in the given
/// order and clauses in arrival order. Nothing is sorted or deduplicated.
pub fn build_rows<'a, I>(documents: I) -> Vec<ClauseRow>
where
    I: IntoIterator<Item = (&'a str, &'a [ClauseRecord])>,
{
    documents
        .into_iter()
        .flat_map(|(document, records)| {
            records.iter().map(move |record| ClauseRow {
                document: document.to_string(),
                clause_number: record.number.to_string(),
                clause_text: record.text.clone(),
                description: String::new(),
                outline_level: record.number.outline_level(),
            })
        })
        .collect()
}

pub fn rows_to_csv(rows: &[ClauseRow]) -> String {
    let mut lines = vec![CSV_HEADER.join(",")];
    for row in rows {
        lines.push(
            [
                row.document.as_str(),
                row.clause_number.as_str(),
                row.clause_text.as_str(),
                row.description.as_str(),
            ]
            .iter()
            .map(|cell| escape_csv_cell(cell))
            .collect::<Vec<String>>()
            .join(","),
        );
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

/// Structured outline: one heading per clause at its outline level, body
/// text as the following paragraph.
pub fn rows_to_markdown(rows: &[ClauseRow]) -> String {
    let mut blocks = Vec::<String>::new();
    let mut current_document: Option<&str> = None;

    for row in rows {
        if current_document != Some(row.document.as_str()) {
            blocks.push(format!("<!-- {} -->", row.document));
            current_document = Some(row.document.as_str());
        }

        let level = row.outline_level.clamp(1, 4);
        blocks.push(format!("{} {}", "#".repeat(level), row.clause_number));
        if !row.clause_text.is_empty() {
            blocks.push(row.clause_text.clone());
        }
    }

    let mut markdown = blocks.join("\n\n");
    if !markdown.is_empty() {
        markdown.push('\n');
    }
    markdown
}

fn escape_csv_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(token: &str, text: &str, source_order: usize) -> ClauseRecord {
        ClauseRecord {
            number: token.parse().expect("valid clause number"),
            fragments: vec![text.to_string()],
            text: text.to_string(),
            source_order,
            page_start: 1,
            page_end: 1,
        }
    }

    #[test]
    fn build_rows_concatenates_documents_in_order() {
        let first = vec![record("6.2", "Second", 0), record("6.1", "First", 1)];
        let second = vec![record("6.2", "Second", 0)];

        let rows = build_rows([("a.pdf", first.as_slice()), ("b.pdf", second.as_slice())]);

        let summary = rows
            .iter()
            .map(|row| format!("{}:{}", row.document, row.clause_number))
            .collect::<Vec<String>>();
        assert_eq!(summary, vec!["a.pdf:6.2", "a.pdf:6.1", "b.pdf:6.2"]);
        assert!(rows.iter().all(|row| row.description.is_empty()));
    }

    #[test]
    fn csv_quotes_cells_with_separators() {
        let records = vec![record("1", "Price, \"net\" of tax", 0)];
        let rows = build_rows([("doc", records.as_slice())]);

        assert_eq!(
            rows_to_csv(&rows),
            "document,clause_number,content,description\ndoc,1,\"Price, \"\"net\"\" of tax\",\n"
        );
    }

    #[test]
    fn csv_for_empty_table_is_header_only() {
        assert_eq!(rows_to_csv(&[]), "document,clause_number,content,description\n");
    }

    #[test]
    fn markdown_uses_capped_outline_levels() {
        let records = vec![
            record("6", "Payment", 0),
            record("6.1", "Due dates", 1),
            record("6.1.2.3.4", "Deep", 2),
        ];
        let rows = build_rows([("doc", records.as_slice())]);

        assert_eq!(
            rows_to_markdown(&rows),
            "<!-- doc -->\n\n# 6\n\nPayment\n\n## 6.1\n\nDue dates\n\n#### 6.1.2.3.4\n\nDeep\n"
        );
    }

    #[test]
    fn json_uses_content_column_name() {
        let records = vec![record("2", "Body", 0)];
        let rows = build_rows([("doc", records.as_slice())]);
        let json = serde_json::to_value(&rows).expect("serialize");

        assert_eq!(json[0]["content"], "Body");
        assert_eq!(json[0]["clause_number"], "2");
        assert!(json[0].get("outline_level").is_none());
    }
}
