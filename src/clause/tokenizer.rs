use std::str::Lines;

/// Lazy iterator over the normalized, non-empty lines of one page.
///
/// Cloning forks the iterator at its current position. Call [`page_lines`]
/// again to start over from the top of the page.
#[derive(Debug, Clone)]
pub struct PageLines<'a> {
    lines: Lines<'a>,
}

pub fn page_lines(page_text: &str) -> PageLines<'_> {
    PageLines {
        lines: page_text.lines(),
    }
}

impl Iterator for PageLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        for raw_line in self.lines.by_ref() {
            let line = normalize_line(raw_line);
            if !line.is_empty() {
                return Some(line);
            }
        }

        None
    }
}

/// Collapses whitespace runs (including NBSP and stray carriage returns) to
/// single spaces and trims both ends.
pub fn normalize_line(raw_line: &str) -> String {
    raw_line
        .split(|character: char| character.is_whitespace() || character == '\u{0000}')
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_line_collapses_whitespace() {
        assert_eq!(normalize_line("  6.1 \t Due\u{00a0}\u{00a0}dates  "), "6.1 Due dates");
        assert_eq!(normalize_line("   "), "");
        assert_eq!(normalize_line("text\r"), "text");
    }

    #[test]
    fn page_lines_drops_blank_lines() {
        let page = "6. Payment terms\n\n   \nThis clause\r\n  governs   payment.\n";
        let lines = page_lines(page).collect::<Vec<String>>();
        assert_eq!(
            lines,
            vec!["6. Payment terms", "This clause", "governs payment."]
        );
    }

    #[test]
    fn page_lines_is_restartable() {
        let page = "a\nb\n\nc";
        let first = page_lines(page).collect::<Vec<String>>();
        let second = page_lines(page).collect::<Vec<String>>();
        assert_eq!(first, second);

        let mut iter = page_lines(page);
        iter.next();
        let fork = iter.clone();
        assert_eq!(iter.collect::<Vec<String>>(), fork.collect::<Vec<String>>());
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert_eq!(page_lines("").count(), 0);
        assert_eq!(page_lines("\n \n\t\n").count(), 0);
    }
}
