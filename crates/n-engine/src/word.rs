//! The word under the cursor, for `*`, `#`, `g*` and `g#`.
//!
//! Like Vim, the search uses the first keyword at or after the cursor on the
//! current line. Without a keyword there, the first run of non-blank
//! punctuation is used instead, and only keywords get `\<` `\>` around them.

use crate::buffer::BufferView;

/// Character class for word boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    /// Letters, digits, underscore.
    Word,
    /// Non-blank, non-word characters.
    Punctuation,
    /// Whitespace.
    Blank,
}

pub(crate) fn classify(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Blank
    } else if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

/// A word found near the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAt {
    pub text: String,
    /// Offset of the word's first char.
    pub start: usize,
    /// Made of keyword chars (as opposed to punctuation).
    pub keyword: bool,
}

/// The word `*` would search for with the caret at `caret`.
#[must_use]
pub fn word_at(buf: &dyn BufferView, caret: usize) -> Option<WordAt> {
    let pos = buf.position_of(caret);
    let chars: Vec<char> = buf.line_text(pos.line)?.chars().collect();
    let line_start = buf.line_start(pos.line)?;
    let col = pos.col.min(chars.len());

    let run = |class: CharClass| -> Option<WordAt> {
        // Back up to the start of a run the caret sits inside, else take the
        // first run starting after the caret.
        let mut start = (col..chars.len()).find(|&i| classify(chars[i]) == class)?;
        if start == col {
            while start > 0 && classify(chars[start - 1]) == class {
                start -= 1;
            }
        }
        let end = (start..chars.len())
            .find(|&i| classify(chars[i]) != class)
            .unwrap_or(chars.len());
        Some(WordAt {
            text: chars[start..end].iter().collect(),
            start: line_start + start,
            keyword: class == CharClass::Word,
        })
    };

    run(CharClass::Word).or_else(|| run(CharClass::Punctuation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;

    fn at(text: &str, caret: usize) -> Option<(String, usize, bool)> {
        let buf = TextBuffer::from_text(text);
        word_at(&buf, caret).map(|w| (w.text, w.start, w.keyword))
    }

    #[test]
    fn classify_chars() {
        assert_eq!(classify('a'), CharClass::Word);
        assert_eq!(classify('_'), CharClass::Word);
        assert_eq!(classify('é'), CharClass::Word);
        assert_eq!(classify('.'), CharClass::Punctuation);
        assert_eq!(classify('\t'), CharClass::Blank);
    }

    #[test]
    fn inside_word() {
        assert_eq!(at("hello world", 8), Some(("world".into(), 6, true)));
        assert_eq!(at("hello world", 4), Some(("hello".into(), 0, true)));
    }

    #[test]
    fn on_blank_takes_next_word() {
        assert_eq!(at("foo   bar", 4), Some(("bar".into(), 6, true)));
    }

    #[test]
    fn keyword_preferred_over_punctuation() {
        assert_eq!(at("x = (y)", 2), Some(("y".into(), 5, true)));
    }

    #[test]
    fn punctuation_when_no_keyword_follows() {
        assert_eq!(at("abc ->", 4), Some(("->".into(), 4, false)));
    }

    #[test]
    fn second_line_offsets() {
        assert_eq!(at("one\ntwo three", 9), Some(("three".into(), 8, true)));
    }

    #[test]
    fn nothing_after_caret() {
        assert_eq!(at("word   ", 5), None);
        assert_eq!(at("", 0), None);
    }
}
