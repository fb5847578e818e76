//! Clause recognition engine.
//!
//! Pages flow through [`tokenizer`] → [`matcher`] → [`validator`] →
//! [`assembler`] one line at a time; [`output`] flattens the finished
//! records into export rows. Every input line is classified and consumed,
//! so extraction itself never fails.

mod assembler;
mod matcher;
mod number;
mod output;
mod tokenizer;
mod validator;


use anyhow::Result;
use serde::Serialize;

use assembler::ClauseAssembler;
use matcher::ClauseMatcher;
use tokenizer::page_lines;

pub use assembler::{Assembly, AssemblyStats, ClauseRecord};
pub use output::{ClauseRow, build_rows, rows_to_csv, rows_to_markdown};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClauseConfig {
    /// Reject deep clause numbers whose parent was never seen.
    pub strict_hierarchy: bool,
    /// Accept `0` as a root segment (`0 Introduction`, `0.1 General`).
    pub allow_zero_root: bool,
    /// Treat dot-leader lines ending in a page number as body text.
    pub skip_toc_entries: bool,
}

/// One input document: a display name and its page texts in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub pages: Vec<String>,
}

impl Document {
    pub fn new(name: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }
}

#[derive(Debug)]
pub struct ClauseExtractor {
    matcher: ClauseMatcher,
    config: ClauseConfig,
}

impl ClauseExtractor {
    pub fn new(config: ClauseConfig) -> Result<Self> {
        Ok(Self {
            matcher: ClauseMatcher::new(config.allow_zero_root, config.skip_toc_entries)?,
            config,
        })
    }

    /// Runs a fresh assembler over the document. Pure in the document:
    /// repeated calls return identical assemblies.
    pub fn extract(&self, document: &Document) -> Assembly {
        let mut assembler = ClauseAssembler::new(self.config.strict_hierarchy);

        for (page_index, page_text) in document.pages.iter().enumerate() {
            for line in page_lines(page_text) {
                assembler.push(page_index + 1, self.matcher.classify(&line));
            }
        }

        assembler.finish()
    }
}
