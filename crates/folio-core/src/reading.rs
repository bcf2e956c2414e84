//! Reading time estimation.

use serde::{Deserialize, Serialize};

/// Assumed reading speed when none is configured.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Estimated time to read a body of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingTime {
    /// Number of words counted.
    pub words: u32,

    /// Minutes, rounded up. Zero only for text without words.
    pub minutes: u32,
}

impl ReadingTime {
    /// Estimate at [`DEFAULT_WORDS_PER_MINUTE`].
    pub fn estimate(body: &str) -> Self {
        Self::with_rate(body, DEFAULT_WORDS_PER_MINUTE)
    }

    /// Estimate at `words_per_minute` (clamped to at least 1).
    pub fn with_rate(body: &str, words_per_minute: u32) -> Self {
        let words = count_words(body);
        Self {
            words,
            minutes: words.div_ceil(words_per_minute.max(1)),
        }
    }

    /// Human label, e.g. "3 min read".
    pub fn label(&self) -> String {
        format!("{} min read", self.minutes)
    }
}

/// Whitespace-separated tokens carrying at least one alphanumeric character.
///
/// Markup-only tokens such as `#`, `-` or `---` are not words.
fn count_words(text: &str) -> u32 {
    let count = text
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_zero() {
        assert_eq!(ReadingTime::estimate(""), ReadingTime::default());
        assert_eq!(ReadingTime::estimate("  \n\t ").minutes, 0);
        assert_eq!(ReadingTime::estimate("# --- *").minutes, 0);
    }

    #[test]
    fn test_short_body_rounds_up() {
        let rt = ReadingTime::estimate("# Hi there");
        assert_eq!(rt.words, 2);
        assert_eq!(rt.minutes, 1);
        assert_eq!(rt.label(), "1 min read");
    }

    #[test]
    fn test_exact_and_partial_minutes() {
        let body = "word ".repeat(400);
        assert_eq!(ReadingTime::estimate(&body).minutes, 2);

        let body = "word ".repeat(401);
        assert_eq!(ReadingTime::estimate(&body).minutes, 3);
    }

    #[test]
    fn test_custom_rate() {
        let body = "word ".repeat(100);
        assert_eq!(ReadingTime::with_rate(&body, 50).minutes, 2);
        assert_eq!(ReadingTime::with_rate(&body, 0).minutes, 100);
    }

    #[test]
    fn test_monotonic_in_word_count() {
        let mut previous = 0;
        for n in 0..1_000 {
            let minutes = ReadingTime::estimate(&"w ".repeat(n)).minutes;
            assert!(minutes >= previous);
            previous = minutes;
        }
    }
}
