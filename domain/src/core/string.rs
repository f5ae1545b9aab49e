//! String utilities for the domain layer.

use std::collections::BTreeSet;

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Keep the first `max_chars` characters and append `...` if anything was cut.
pub fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// `add_transition_tool` → `Add Transition`
pub fn friendly_tool_label(tool_name: &str) -> String {
    let base = tool_name.strip_suffix("_tool").unwrap_or(tool_name);
    base.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased alphanumeric tokens
pub fn tokens(s: &str) -> BTreeSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Jaccard similarity of the token sets of two strings, in [0, 1].
///
/// Two strings with no tokens at all are considered identical.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let left = tokens(a);
    let right = tokens(b);
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let shared = left.intersection(&right).count();
    let total = left.union(&right).count();
    shared as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // é occupies bytes 1..3
        assert_eq!(truncate("héllo wörld", 7), "hél...");
        // target 2 lands inside é and backs off to 1
        assert_eq!(truncate("héllo wörld", 5), "h...");
    }

    #[test]
    fn test_preview_counts_chars() {
        assert_eq!(preview("abc", 5), "abc");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééé", 2), "éé...");
        let long = "x".repeat(600);
        assert_eq!(preview(&long, 500).len(), 503);
    }

    #[test]
    fn test_friendly_tool_label() {
        assert_eq!(friendly_tool_label("add_transition_tool"), "Add Transition");
        assert_eq!(friendly_tool_label("list_clips"), "List Clips");
        assert_eq!(friendly_tool_label("analyze"), "Analyze");
    }

    #[test]
    fn test_token_similarity() {
        assert_eq!(
            token_similarity("Add fade between clip1/clip2", "add fade between clip1 clip2"),
            1.0
        );
        assert_eq!(token_similarity("add title card", "lower music volume"), 0.0);
        let partial = token_similarity("add fade", "add dissolve");
        assert!(partial > 0.0 && partial < 1.0);
        assert_eq!(token_similarity("", "..."), 1.0);
    }
}
