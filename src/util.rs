//! Shared utility functions

/// Truncate a string to a maximum length, appending "..." if truncated.
/// Handles multi-byte characters by finding a valid char boundary.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let suffix = "...";
    let target = max_len.saturating_sub(suffix.len());
    // Find a valid char boundary at or before target
    let mut end = target;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &s[..end], suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_are_untouched() {
        assert_eq!(truncate_str("VaR", 10), "VaR");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_str("Interest Rate", 8), "Inter...");
        // "→" is three bytes; the cut must not land inside it
        assert_eq!(truncate_str("a→b→c", 5), "a...");
    }
}
