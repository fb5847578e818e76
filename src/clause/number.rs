use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Hierarchical clause number such as `6.1.2`.
///
/// Ordering is lexicographic over the segments, so a clause sorts before its
/// own sub-clauses: `6 < 6.1 < 6.1.1 < 6.2 < 7`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseNumber {
    segments: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberSyntaxError {
    Empty,
    EmptySegment,
    NonDigit,
    LeadingZero,
    ZeroSegment,
    Overflow,
}

impl fmt::Display for NumberSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Empty => "clause number is empty",
            Self::EmptySegment => "clause number has an empty segment",
            Self::NonDigit => "clause number segment is not numeric",
            Self::LeadingZero => "clause number segment has a leading zero",
            Self::ZeroSegment => "clause number segment is zero",
            Self::Overflow => "clause number segment is too large",
        };
        f.write_str(message)
    }
}

impl std::error::Error for NumberSyntaxError {}

impl ClauseNumber {
    /// Parses a dot-separated token. Root segment `0` is only accepted when
    /// `allow_zero_root` is set; zero is never valid below the root.
    pub fn parse_with(token: &str, allow_zero_root: bool) -> Result<Self, NumberSyntaxError> {
        if token.is_empty() {
            return Err(NumberSyntaxError::Empty);
        }

        let mut segments = Vec::new();
        for (index, raw) in token.split('.').enumerate() {
            if raw.is_empty() {
                return Err(NumberSyntaxError::EmptySegment);
            }
            if !raw.chars().all(|character| character.is_ascii_digit()) {
                return Err(NumberSyntaxError::NonDigit);
            }
            if raw.len() > 1 && raw.starts_with('0') {
                return Err(NumberSyntaxError::LeadingZero);
            }

            let value = raw
                .parse::<u32>()
                .map_err(|_| NumberSyntaxError::Overflow)?;
            if value == 0 && !(index == 0 && allow_zero_root) {
                return Err(NumberSyntaxError::ZeroSegment);
            }
            segments.push(value);
        }

        Ok(Self { segments })
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Number with the last segment removed, `None` for a root clause.
    pub fn parent(&self) -> Option<ClauseNumber> {
        if self.segments.len() < 2 {
            return None;
        }

        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Every proper and improper prefix, shortest first: `6`, `6.1`, `6.1.2`.
    pub fn prefixes(&self) -> impl Iterator<Item = ClauseNumber> + '_ {
        (1..=self.segments.len()).map(|len| Self {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// Heading level used by the outline renderer, capped at 4.
    pub fn outline_level(&self) -> usize {
        self.depth().min(4)
    }
}

impl FromStr for ClauseNumber {
    type Err = NumberSyntaxError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::parse_with(token, false)
    }
}

impl fmt::Display for ClauseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .segments
            .iter()
            .map(u32::to_string)
            .collect::<Vec<String>>()
            .join(".");
        f.write_str(&joined)
    }
}

impl Serialize for ClauseNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(token: &str) -> ClauseNumber {
        token.parse().expect("valid clause number")
    }

    #[test]
    fn parse_then_display_round_trips() {
        for token in ["1", "6", "6.1", "6.1.2", "3.2.4", "10.20.30", "4294967295.1"] {
            assert_eq!(number(token).to_string(), token);
        }
    }

    #[test]
    fn parse_rejects_malformed_tokens() {
        assert_eq!("".parse::<ClauseNumber>(), Err(NumberSyntaxError::Empty));
        assert_eq!(
            "6..1".parse::<ClauseNumber>(),
            Err(NumberSyntaxError::EmptySegment)
        );
        assert_eq!(
            "6.".parse::<ClauseNumber>(),
            Err(NumberSyntaxError::EmptySegment)
        );
        assert_eq!(
            "6.a".parse::<ClauseNumber>(),
            Err(NumberSyntaxError::NonDigit)
        );
        assert_eq!(
            "01.2".parse::<ClauseNumber>(),
            Err(NumberSyntaxError::LeadingZero)
        );
        assert_eq!(
            "6.0".parse::<ClauseNumber>(),
            Err(NumberSyntaxError::ZeroSegment)
        );
        assert_eq!(
            "4294967296".parse::<ClauseNumber>(),
            Err(NumberSyntaxError::Overflow)
        );
    }

    #[test]
    fn zero_root_requires_policy() {
        assert_eq!(
            "0.1".parse::<ClauseNumber>(),
            Err(NumberSyntaxError::ZeroSegment)
        );
        let zero = ClauseNumber::parse_with("0.1", true).expect("zero root allowed");
        assert_eq!(zero.to_string(), "0.1");
        assert!(zero < number("1"));
        assert_eq!(
            ClauseNumber::parse_with("1.0", true),
            Err(NumberSyntaxError::ZeroSegment)
        );
    }

    #[test]
    fn ordering_places_prefixes_before_extensions() {
        let ordered = ["6", "6.1", "6.1.1", "6.2", "7", "7.10", "10"];
        for pair in ordered.windows(2) {
            assert!(number(pair[0]) < number(pair[1]), "{} < {}", pair[0], pair[1]);
        }

        let mut shuffled = vec![number("7"), number("6.2"), number("6"), number("6.1.1"), number("6.1")];
        shuffled.sort();
        let rendered = shuffled
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<String>>();
        assert_eq!(rendered, vec!["6", "6.1", "6.1.1", "6.2", "7"]);
    }

    #[test]
    fn hierarchy_helpers() {
        let clause = number("6.1.2");
        assert_eq!(clause.depth(), 3);
        assert_eq!(clause.parent(), Some(number("6.1")));
        assert_eq!(number("6").parent(), None);
        assert_eq!(
            clause.prefixes().map(|p| p.to_string()).collect::<Vec<String>>(),
            vec!["6", "6.1", "6.1.2"]
        );
        assert_eq!(number("1.2.3.4.5").outline_level(), 4);
    }

    #[test]
    fn serializes_as_dotted_string() {
        let json = serde_json::to_string(&number("3.2.4")).expect("serialize");
        assert_eq!(json, "\"3.2.4\"");
    }
}
