use serde::{Deserialize, Serialize};

use crate::clause::{AssemblyStats, ClauseConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Pdf,
    Image,
    Text,
    PagesJson,
}

impl InputKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" => Some(Self::Image),
            "txt" => Some(Self::Text),
            "json" => Some(Self::PagesJson),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Text => "text",
            Self::PagesJson => "pages_json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEntry {
    pub filename: String,
    pub kind: InputKind,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub input_count: usize,
    pub inputs: Vec<InputEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub pdftotext: Option<String>,
    pub pdftoppm: Option<String>,
    pub tesseract: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractPaths {
    pub inputs: Vec<String>,
    pub output_path: String,
    pub manifest_path: String,
    pub sqlite_table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document: String,
    pub kind: InputKind,
    pub sha256: String,
    pub page_count: usize,
    pub ocr_page_count: usize,
    pub empty_page_count: usize,
    pub header_lines_removed: usize,
    pub footer_lines_removed: usize,
    pub dehyphenation_merges: usize,
    pub clause_count: usize,
    pub lines_seen: usize,
    pub continuation_fragments: usize,
    pub preamble_lines_dropped: usize,
    pub rejected_candidates: usize,
}

impl DocumentSummary {
    pub fn apply_stats(&mut self, stats: &AssemblyStats) {
        self.clause_count = stats.clauses_opened;
        self.lines_seen = stats.lines_seen;
        self.continuation_fragments = stats.continuation_fragments;
        self.preamble_lines_dropped = stats.preamble_lines_dropped;
        self.rejected_candidates = stats.rejected_candidates;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfigSnapshot {
    pub strict_hierarchy: bool,
    pub allow_zero_root: bool,
    pub skip_toc_entries: bool,
    pub strip_page_furniture: bool,
    pub ocr_mode: String,
    pub ocr_lang: String,
    pub ocr_min_text_chars: usize,
    pub max_pages_per_doc: Option<usize>,
}

impl ExtractConfigSnapshot {
    pub fn clause_config(&self) -> ClauseConfig {
        ClauseConfig {
            strict_hierarchy: self.strict_hierarchy,
            allow_zero_root: self.allow_zero_root,
            skip_toc_entries: self.skip_toc_entries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub format: String,
    pub config: ExtractConfigSnapshot,
    pub tool_versions: ToolVersions,
    pub paths: ExtractPaths,
    pub row_count: usize,
    pub documents: Vec<DocumentSummary>,
    pub warnings: Vec<String>,
}
