//! Marker suggestions from buffer content.

use crate::{Result, SplitpasteError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static NON_WORD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\W+").expect("Invalid non-word regex"));

/// Distinct runs of non-word characters in `text`, trimmed, most frequent first.
///
/// Ties keep the order of first appearance.
pub fn detect_markers(text: &str) -> Result<Vec<String>> {
    if text.is_empty() {
        return Err(SplitpasteError::EmptyBuffer);
    }

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, run) in NON_WORD_RUN
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|run| !run.is_empty())
        .enumerate()
    {
        counts.entry(run).or_insert((0, position)).0 += 1;
    }

    let mut candidates: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(run, (count, first))| (run, count, first))
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    Ok(candidates.into_iter().map(|(run, _, _)| run.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_frequent_first() {
        let text = "// a.txt\nhello\n// b.txt\nworld\n// c.txt\n!\n";
        let markers = detect_markers(text).unwrap();
        assert_eq!(markers[0], "//");
        assert!(markers.contains(&".".to_string()));
        assert!(markers.contains(&"!".to_string()));
    }

    #[test]
    fn test_whitespace_only_runs_ignored() {
        let markers = detect_markers("one two\nthree").unwrap();
        assert!(markers.is_empty());
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let markers = detect_markers("a ## b -- c").unwrap();
        assert_eq!(markers, vec!["##", "--"]);
    }

    #[test]
    fn test_empty_text_is_an_error() {
        assert!(matches!(detect_markers(""), Err(SplitpasteError::EmptyBuffer)));
    }
}
