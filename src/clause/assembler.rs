use serde::Serialize;

use super::matcher::LineMatch;
use super::number::ClauseNumber;
use super::validator::{HierarchyValidator, RejectReason, Verdict};

/// Finalized clause: number, body fragments in arrival order and their
/// single-space join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseRecord {
    pub number: ClauseNumber,
    pub fragments: Vec<String>,
    pub text: String,
    pub source_order: usize,
    pub page_start: usize,
    pub page_end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub lines_seen: usize,
    pub clauses_opened: usize,
    pub continuation_fragments: usize,
    pub preamble_lines_dropped: usize,
    pub rejected_candidates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedCandidate {
    pub number: ClauseNumber,
    pub line: String,
    pub page: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub records: Vec<ClauseRecord>,
    pub stats: AssemblyStats,
    pub rejected: Vec<RejectedCandidate>,
}

#[derive(Debug)]
struct OpenClause {
    number: ClauseNumber,
    fragments: Vec<String>,
    source_order: usize,
    page_start: usize,
    page_end: usize,
}

impl OpenClause {
    fn finalize(self) -> ClauseRecord {
        let text = self.fragments.join(" ").trim().to_string();
        ClauseRecord {
            number: self.number,
            fragments: self.fragments,
            text,
            source_order: self.source_order,
            page_start: self.page_start,
            page_end: self.page_end,
        }
    }
}

/// Per-document fold from classified lines to clause records.
///
/// Create one per document, feed every line with [`push`](Self::push) in
/// page order, then call [`finish`](Self::finish) to close the last clause.
#[derive(Debug)]
pub struct ClauseAssembler {
    validator: HierarchyValidator,
    current: Option<OpenClause>,
    output: Vec<ClauseRecord>,
    next_source_order: usize,
    stats: AssemblyStats,
    rejected: Vec<RejectedCandidate>,
}

impl ClauseAssembler {
    pub fn new(strict_hierarchy: bool) -> Self {
        Self {
            validator: HierarchyValidator::new(strict_hierarchy),
            current: None,
            output: Vec::new(),
            next_source_order: 0,
            stats: AssemblyStats::default(),
            rejected: Vec::new(),
        }
    }

    /// Feeds one classified line from the given 1-based page.
    pub fn push(&mut self, page: usize, line: LineMatch) {
        self.stats.lines_seen += 1;

        match line {
            LineMatch::Matched {
                number,
                remainder,
                line,
            } => match self.validator.check(&number) {
                Verdict::Accept => self.open(page, number, remainder),
                Verdict::Reject(reason) => {
                    self.note_rejection(page, &number, &line, &reason);
                    self.continue_with(page, line);
                }
            },
            LineMatch::Unmatched(text) => self.continue_with(page, text),
        }
    }

    pub fn finish(mut self) -> Assembly {
        if let Some(open) = self.current.take() {
            self.output.push(open.finalize());
        }

        Assembly {
            records: self.output,
            stats: self.stats,
            rejected: self.rejected,
        }
    }

    fn open(&mut self, page: usize, number: ClauseNumber, remainder: String) {
        if let Some(previous) = self.current.take() {
            self.output.push(previous.finalize());
        }

        self.validator.record(&number);
        self.stats.clauses_opened += 1;

        let mut fragments = Vec::new();
        if !remainder.is_empty() {
            fragments.push(remainder);
        }

        self.current = Some(OpenClause {
            number,
            fragments,
            source_order: self.next_source_order,
            page_start: page,
            page_end: page,
        });
        self.next_source_order += 1;
    }

    fn continue_with(&mut self, page: usize, text: String) {
        match self.current.as_mut() {
            Some(open) => {
                open.fragments.push(text);
                open.page_end = page;
                self.stats.continuation_fragments += 1;
            }
            None => self.stats.preamble_lines_dropped += 1,
        }
    }

    fn note_rejection(
        &mut self,
        page: usize,
        number: &ClauseNumber,
        line: &str,
        reason: &RejectReason,
    ) {
        self.stats.rejected_candidates += 1;
        self.rejected.push(RejectedCandidate {
            number: number.clone(),
            line: line.to_string(),
            page,
            reason: reason.to_string(),
        });
    }
}
