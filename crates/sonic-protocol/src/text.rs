//! Helpers for embedding free text in commands.
//!
//! Text arguments are quoted on the wire, so backslashes, newlines and double
//! quotes must be escaped, and long text must be cut into several commands
//! that each fit the negotiated buffer.

use std::borrow::Cow;
use std::iter::FusedIterator;

/// Escape text for use inside a quoted command argument.
///
/// Backslashes are doubled first, then newlines become `\n` and double
/// quotes become `\"`. Borrows the input when nothing needs escaping.
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['\\', '\n', '"']) {
        return Cow::Borrowed(text);
    }

    let escaped = text
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"");
    Cow::Owned(escaped)
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Chunks are cut on `char` boundaries, so multi-byte characters are never
/// torn apart. Empty text or a zero budget yields no chunks.
#[must_use]
pub fn split(text: &str, max_chars: usize) -> TextChunks<'_> {
    TextChunks {
        rest: text,
        max_chars,
    }
}

/// Iterator over the chunks produced by [`split`].
///
/// Cloning the iterator restarts from the same position.
#[derive(Debug, Clone)]
pub struct TextChunks<'a> {
    rest: &'a str,
    max_chars: usize,
}

impl<'a> TextChunks<'a> {
    /// The text not yet yielded.
    #[must_use]
    pub fn remainder(&self) -> &'a str {
        self.rest
    }

    /// The per-chunk character budget.
    #[must_use]
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

impl<'a> Iterator for TextChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() || self.max_chars == 0 {
            return None;
        }

        let end = self
            .rest
            .char_indices()
            .nth(self.max_chars)
            .map_or(self.rest.len(), |(idx, _)| idx);
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.rest.is_empty() || self.max_chars == 0 {
            return (0, Some(0));
        }
        // At least one char per byte group of four, at most one per byte.
        let min_chars = self.rest.len().div_ceil(4);
        (
            min_chars.div_ceil(self.max_chars),
            Some(self.rest.len().div_ceil(self.max_chars)),
        )
    }
}

impl FusedIterator for TextChunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_targets() {
        assert_eq!(escape("a\\b\nc\"d"), "a\\\\b\\nc\\\"d");
    }

    #[test]
    fn test_escape_literal_backslash_n() {
        // A literal backslash followed by `n` must stay distinguishable from
        // an escaped newline.
        assert_eq!(escape("x\\ny"), "x\\\\ny");
        assert_eq!(escape("x\ny"), "x\\ny");
    }

    #[test]
    fn test_escape_borrows_clean_text() {
        assert!(matches!(escape("plain text"), Cow::Borrowed("plain text")));
        assert!(matches!(escape(""), Cow::Borrowed("")));
    }

    #[test]
    fn test_split_ascii() {
        let chunks: Vec<_> = split("abcdefg", 3).collect();
        assert_eq!(chunks, ["abc", "def", "g"]);
    }

    #[test]
    fn test_split_multibyte() {
        let chunks: Vec<_> = split("héllo wörld", 4).collect();
        assert_eq!(chunks, ["héll", "o wö", "rld"]);

        let chunks: Vec<_> = split("日本語テキスト", 2).collect();
        assert_eq!(chunks, ["日本", "語テ", "キス", "ト"]);
    }

    #[test]
    fn test_split_empty_and_zero_budget() {
        assert_eq!(split("", 10).count(), 0);
        assert_eq!(split("abc", 0).count(), 0);
    }

    #[test]
    fn test_split_is_restartable() {
        let chunks = split("the quick brown fox", 5);
        let first: Vec<_> = chunks.clone().collect();
        let second: Vec<_> = chunks.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_remainder() {
        let mut chunks = split("abcdef", 4);
        assert_eq!(chunks.next(), Some("abcd"));
        assert_eq!(chunks.remainder(), "ef");
        assert_eq!(chunks.max_chars(), 4);
    }

    fn unescape(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }

    proptest! {
        #[test]
        fn prop_split_reassembles(text in "\\PC{0,200}", max in 1usize..50) {
            let chunks: Vec<_> = split(&text, max).collect();
            prop_assert_eq!(chunks.concat(), text.clone());
            for chunk in &chunks {
                let count = chunk.chars().count();
                prop_assert!(count >= 1 && count <= max);
            }
            let (lower, upper) = split(&text, max).size_hint();
            prop_assert!(lower <= chunks.len());
            prop_assert!(upper.is_some_and(|upper| chunks.len() <= upper));
        }

        #[test]
        fn prop_escape_is_reversible(text in "[a-z\\\\\n\" ]{0,64}") {
            let escaped = escape(&text);
            prop_assert!(!escaped.contains('\n'));
            prop_assert_eq!(unescape(&escaped), text);
        }
    }
}
