// Output formatting — terminal rendering of run reports.

pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Char-based rather than byte-based so multi-byte content (emoji, accented
/// letters) can never split a codepoint and panic.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_unchanged() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn long_text_gets_ellipsis() {
        assert_eq!(truncate_chars("hello world", 5), "hello...");
    }

    #[test]
    fn multibyte_safe() {
        // 4 emoji, each multi-byte — byte slicing here would panic.
        assert_eq!(truncate_chars("🦀🦀🦀🦀", 2), "🦀🦀...");
    }
}
