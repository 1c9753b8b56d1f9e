//! Utility functions for text processing

use regex::Regex;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthStr;

/// ANSI escape sequence regex pattern
/// Matches CSI sequences (ESC[...m), OSC sequences (ESC]...BEL), and other control codes
static ANSI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\x1b\[[0-9;?]*[A-Za-z]",     // CSI sequences (colors, cursor movement, etc.)
        r"|\x1b\][^\x07]*\x07",         // OSC sequences (title, etc.)
        r"|\x1b\][^\x1b]*\x1b\\",       // OSC with ST terminator
        r"|\x1b.",                       // Other two-byte escape sequences
    ))
    .expect("ANSI pattern is valid")
});

/// Strip ANSI escape sequences from text.
pub fn strip_ansi(text: &str) -> String {
    ANSI_REGEX.replace_all(text, "").into_owned()
}

/// Columns a string occupies on screen, ignoring color codes.
pub fn display_width(text: &str) -> usize {
    strip_ansi(text).width()
}

/// Replaces tabs and line breaks with spaces so `text` occupies exactly one
/// row and one column cell.
pub fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Splits `text` into chunks of at most `width` characters.
///
/// Tabs and newlines become spaces so a chunk can never break column
/// alignment or the caller's line count. Empty input yields no chunks.
pub fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let flat: Vec<char> = single_line(text).chars().collect();
    flat.chunks(width).map(|chunk| chunk.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_basic_colors() {
        let input = "\x1b[31mRed Text\x1b[0m";
        assert_eq!(strip_ansi(input), "Red Text");
    }

    #[test]
    fn test_strip_cursor_movement() {
        let input = "\x1b[1A\x1b[2KErased";
        assert_eq!(strip_ansi(input), "Erased");
    }

    #[test]
    fn test_preserves_newlines_and_tabs() {
        let input = "Line1\nLine2\tTabbed";
        assert_eq!(strip_ansi(input), "Line1\nLine2\tTabbed");
    }

    #[test]
    fn test_display_width_ignores_color() {
        assert_eq!(display_width("\x1b[32m✔ done\x1b[0m"), 6);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("Deploy\nthe\tservice\r"), "Deploy the service ");
        assert_eq!(single_line("plain"), "plain");
    }

    #[test]
    fn test_wrap_exact_chunks() {
        let chunks = wrap_chars("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_flattens_tabs_and_newlines() {
        let chunks = wrap_chars("a\tb\nc", 10);
        assert_eq!(chunks, vec!["a b c"]);
    }

    #[test]
    fn test_wrap_empty_and_zero_width() {
        assert!(wrap_chars("", 10).is_empty());
        assert_eq!(wrap_chars("ab", 0), vec!["a", "b"]);
    }
}
