use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct CleanupCounts {
    pub header_lines_removed: usize,
    pub footer_lines_removed: usize,
    pub dehyphenation_merges: usize,
}

/// Removes running headers and footers and rejoins words hyphenated across
/// line breaks. A first or last line counts as page furniture when it recurs
/// on at least three pages, digits ignored. A line holding only a number is
/// a page number only when it equals the page's position; otherwise it may
/// be a clause marker and is kept.
pub(super) fn strip_page_furniture(pages: &mut [String]) -> CleanupCounts {
    let header_candidates = detect_repeated_edge_lines(pages, true);
    let footer_candidates = detect_repeated_edge_lines(pages, false);
    let mut counts = CleanupCounts::default();

    for (index, page) in pages.iter_mut().enumerate() {
        let page_number = index + 1;
        let mut lines = page
            .lines()
            .map(|line| line.to_string())
            .collect::<Vec<String>>();

        if let Some(line_index) = first_nonempty_line_index(&lines) {
            if edge_line_key(&lines[line_index], page_number)
                .is_some_and(|key| header_candidates.contains(&key))
            {
                lines.remove(line_index);
                counts.header_lines_removed += 1;
            }
        }

        if let Some(line_index) = last_nonempty_line_index(&lines) {
            if edge_line_key(&lines[line_index], page_number)
                .is_some_and(|key| footer_candidates.contains(&key))
            {
                lines.remove(line_index);
                counts.footer_lines_removed += 1;
            }
        }

        let (merged_lines, merges) = merge_hyphenated_lines(lines);
        counts.dehyphenation_merges += merges;
        *page = merged_lines.join("\n");
    }

    counts
}

fn detect_repeated_edge_lines(pages: &[String], header: bool) -> HashSet<String> {
    let mut counts = HashMap::<String, usize>::new();
    for (index, page) in pages.iter().enumerate() {
        let mut lines = page.lines().map(str::trim).filter(|line| !line.is_empty());
        let candidate = if header { lines.next() } else { lines.next_back() };

        let Some(key) = candidate.and_then(|line| edge_line_key(line, index + 1)) else {
            continue;
        };
        if key.len() > 120 {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter_map(|(candidate, count)| if count >= 3 { Some(candidate) } else { None })
        .collect()
}

/// Lowercased, whitespace-collapsed line with digit runs replaced by `#`, so
/// `Page 3 of 10` and `Page 4 of 10` share a key. `None` for blank lines and
/// for bare numbers that differ from `page_number`.
fn edge_line_key(input: &str, page_number: usize) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().all(|character| character.is_ascii_digit()) {
        return (trimmed.parse::<usize>().ok() == Some(page_number)).then(|| "#".to_string());
    }

    let mut key = String::with_capacity(trimmed.len());
    let mut previous_digit = false;
    for word in trimmed.split_whitespace() {
        if !key.is_empty() {
            key.push(' ');
            previous_digit = false;
        }
        for character in word.chars() {
            if character.is_ascii_digit() {
                if !previous_digit {
                    key.push('#');
                }
                previous_digit = true;
            } else {
                key.push(character.to_ascii_lowercase());
                previous_digit = false;
            }
        }
    }
    Some(key)
}

fn first_nonempty_line_index(lines: &[String]) -> Option<usize> {
    lines.iter().position(|line| !line.trim().is_empty())
}

fn last_nonempty_line_index(lines: &[String]) -> Option<usize> {
    lines.iter().rposition(|line| !line.trim().is_empty())
}

fn merge_hyphenated_lines(lines: Vec<String>) -> (Vec<String>, usize) {
    let mut merged = Vec::<String>::new();
    let mut merges = 0usize;
    let mut iter = lines.into_iter().peekable();

    while let Some(current) = iter.next() {
        let mut current = current;
        while let Some(next) = iter.peek() {
            if !should_merge_hyphenated_pair(&current, next) {
                break;
            }
            let joined = format!(
                "{}{}",
                current.trim_end().trim_end_matches('-'),
                next.trim_start()
            );
            current = joined;
            merges += 1;
            iter.next();
        }
        merged.push(current);
    }

    (merged, merges)
}

fn should_merge_hyphenated_pair(current: &str, next: &str) -> bool {
    let left = current.trim_end();
    if !left.ends_with('-') {
        return false;
    }

    let right = next.trim_start();
    let starts_with_lowercase = right
        .chars()
        .next()
        .map(|character| character.is_lowercase())
        .unwrap_or(false);
    if !starts_with_lowercase {
        return false;
    }

    left.trim_end_matches('-')
        .chars()
        .last()
        .map(|character| character.is_alphabetic())
        .unwrap_or(false)
}
