use anyhow::{Context, Result};
use regex::Regex;

use super::number::ClauseNumber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    Matched {
        number: ClauseNumber,
        remainder: String,
        line: String,
    },
    Unmatched(String),
}

#[derive(Debug)]
pub struct ClauseMatcher {
    clause_token: Regex,
    toc_line: Regex,
    allow_zero_root: bool,
    skip_toc_entries: bool,
}

impl ClauseMatcher {
    pub fn new(allow_zero_root: bool, skip_toc_entries: bool) -> Result<Self> {
        Ok(Self {
            // Greedy over segments; the token must end at whitespace, at a
            // period followed by whitespace, or at end of line.
            clause_token: Regex::new(r"^(\d+(?:\.\d+)*)\.?(?:\s+|$)")
                .context("failed to compile clause token regex")?,
            toc_line: Regex::new(r"(?:\.{3,}|(?:\. ){3,}|…+)\s*\d+$")
                .context("failed to compile table-of-contents line regex")?,
            allow_zero_root,
            skip_toc_entries,
        })
    }

    /// Classifies one normalized line. Never fails: anything that is not a
    /// well-formed clause token comes back as `Unmatched`.
    pub fn classify(&self, line: &str) -> LineMatch {
        let Some(captures) = self.clause_token.captures(line) else {
            return LineMatch::Unmatched(line.to_string());
        };

        if self.skip_toc_entries && self.toc_line.is_match(line) {
            return LineMatch::Unmatched(line.to_string());
        }

        let (Some(whole), Some(token)) = (captures.get(0), captures.get(1)) else {
            return LineMatch::Unmatched(line.to_string());
        };

        match ClauseNumber::parse_with(token.as_str(), self.allow_zero_root) {
            Ok(number) => LineMatch::Matched {
                number,
                remainder: line[whole.end()..].trim().to_string(),
                line: line.to_string(),
            },
            Err(_) => LineMatch::Unmatched(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> ClauseMatcher {
        ClauseMatcher::new(false, false).expect("matcher")
    }

    fn matched(line: &str) -> (String, String) {
        match matcher().classify(line) {
            LineMatch::Matched {
                number, remainder, ..
            } => (number.to_string(), remainder),
            LineMatch::Unmatched(text) => panic!("expected match for {text:?}"),
        }
    }

    fn is_unmatched(matcher: &ClauseMatcher, line: &str) -> bool {
        matches!(matcher.classify(line), LineMatch::Unmatched(text) if text == line)
    }

    #[test]
    fn splits_number_from_body() {
        assert_eq!(matched("6 Payment"), ("6".into(), "Payment".into()));
        assert_eq!(matched("6. Payment terms"), ("6".into(), "Payment terms".into()));
        assert_eq!(matched("6.1 Due dates"), ("6.1".into(), "Due dates".into()));
        assert_eq!(matched("6.1. Due dates"), ("6.1".into(), "Due dates".into()));
    }

    #[test]
    fn matching_is_greedy_on_segments() {
        assert_eq!(matched("6.1.2.3 Deep clause"), ("6.1.2.3".into(), "Deep clause".into()));
    }

    #[test]
    fn bare_number_matches_with_empty_remainder() {
        assert_eq!(matched("7"), ("7".into(), String::new()));
        assert_eq!(matched("7.2."), ("7.2".into(), String::new()));
    }

    #[test]
    fn rejects_malformed_and_embedded_numbers() {
        let matcher = matcher();
        for line in [
            "6..1 broken",
            "3.14abc is not a clause",
            "01.2 leading zero",
            "6.0 zero segment",
            "0 Introduction",
            "Clause 6.1 applies",
            "6.1a Sub item",
            "6,1 comma",
            "99999999999 Overflow",
        ] {
            assert!(is_unmatched(&matcher, line), "{line} should not match");
        }
    }

    #[test]
    fn zero_root_policy_accepts_introduction_clauses() {
        let matcher = ClauseMatcher::new(true, false).expect("matcher");
        match matcher.classify("0.1 General") {
            LineMatch::Matched { number, .. } => assert_eq!(number.to_string(), "0.1"),
            LineMatch::Unmatched(_) => panic!("zero root should match"),
        }
        assert!(is_unmatched(&matcher, "1.0 still invalid"));
    }

    #[test]
    fn toc_entries_are_skipped_only_when_enabled() {
        let line = "6.1 Due dates ........ 12";
        assert!(matches!(matcher().classify(line), LineMatch::Matched { .. }));

        let toc_aware = ClauseMatcher::new(false, true).expect("matcher");
        assert!(is_unmatched(&toc_aware, line));
        assert!(is_unmatched(&toc_aware, "7 Scope . . . . 3"));
        assert!(matches!(
            toc_aware.classify("6.1 Due dates apply to 12"),
            LineMatch::Matched { .. }
        ));
    }

    #[test]
    fn matched_line_keeps_full_text() {
        match matcher().classify("6.1 Due dates") {
            LineMatch::Matched { line, .. } => assert_eq!(line, "6.1 Due dates"),
            LineMatch::Unmatched(_) => panic!("expected match"),
        }
    }
}
