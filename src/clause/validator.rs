use std::collections::HashSet;

use super::number::ClauseNumber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Candidate nests more than one level below the last accepted clause
    /// and its parent has never been seen.
    DepthJump {
        last_accepted: ClauseNumber,
        unseen_parent: ClauseNumber,
    },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DepthJump {
                last_accepted,
                unseen_parent,
            } => write!(
                f,
                "depth jump from {last_accepted} with unseen parent {unseen_parent}"
            ),
        }
    }
}

/// Decides whether a syntactically valid clause number is a real clause
/// marker. Holds the per-document numbering history it needs for that.
#[derive(Debug, Default)]
pub struct HierarchyValidator {
    strict: bool,
    last_accepted: Option<ClauseNumber>,
    seen_prefixes: HashSet<ClauseNumber>,
}

impl HierarchyValidator {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            ..Self::default()
        }
    }

    pub fn check(&self, candidate: &ClauseNumber) -> Verdict {
        if !self.strict {
            return Verdict::Accept;
        }

        let Some(last) = self.last_accepted.as_ref() else {
            return Verdict::Accept;
        };

        if candidate.depth() <= last.depth() + 1 {
            return Verdict::Accept;
        }

        match candidate.parent() {
            Some(parent) if !self.seen_prefixes.contains(&parent) => {
                Verdict::Reject(RejectReason::DepthJump {
                    last_accepted: last.clone(),
                    unseen_parent: parent,
                })
            }
            _ => Verdict::Accept,
        }
    }

    pub fn record(&mut self, accepted: &ClauseNumber) {
        self.seen_prefixes.extend(accepted.prefixes());
        self.last_accepted = Some(accepted.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(token: &str) -> ClauseNumber {
        token.parse().expect("valid clause number")
    }

    #[test]
    fn format_only_policy_accepts_everything() {
        let mut validator = HierarchyValidator::new(false);
        validator.record(&number("3"));
        assert_eq!(validator.check(&number("3.2.4")), Verdict::Accept);
        assert_eq!(validator.check(&number("9.9.9.9")), Verdict::Accept);
    }

    #[test]
    fn strict_policy_rejects_unanchored_depth_jump() {
        let mut validator = HierarchyValidator::new(true);
        validator.record(&number("3"));

        assert_eq!(
            validator.check(&number("3.2.4")),
            Verdict::Reject(RejectReason::DepthJump {
                last_accepted: number("3"),
                unseen_parent: number("3.2"),
            })
        );
        assert_eq!(validator.check(&number("3.2")), Verdict::Accept);
        assert_eq!(validator.check(&number("4")), Verdict::Accept);
    }

    #[test]
    fn strict_policy_accepts_jump_when_parent_was_seen() {
        let mut validator = HierarchyValidator::new(true);
        validator.record(&number("3.2.1"));
        validator.record(&number("4"));

        assert_eq!(validator.check(&number("3.2.4")), Verdict::Accept);
        assert_eq!(validator.check(&number("4.1.1")), Verdict::Reject(RejectReason::DepthJump {
            last_accepted: number("4"),
            unseen_parent: number("4.1"),
        }));
    }

    #[test]
    fn strict_policy_has_no_baseline_before_first_clause() {
        let validator = HierarchyValidator::new(true);
        assert_eq!(validator.check(&number("1.1.1")), Verdict::Accept);
    }

    #[test]
    fn record_moves_depth_baseline_to_latest_clause() {
        let mut validator = HierarchyValidator::new(true);
        validator.record(&number("2.1.1"));
        assert_eq!(validator.check(&number("5.1.1")), Verdict::Accept);

        validator.record(&number("5"));
        assert!(matches!(
            validator.check(&number("5.1.1")),
            Verdict::Reject(_)
        ));
    }
}
