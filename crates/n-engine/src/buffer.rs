//! Buffer access — the engine's read-only view of the host's text.
//!
//! The host owns the text. The engine only needs four primitives to search
//! it, collected in the [`BufferView`] trait; everything else (line content,
//! offset ↔ position conversion) is derived from those by provided methods.
//!
//! [`TextBuffer`] is the stock implementation, a thin wrapper over a
//! [`ropey::Rope`] that overrides the provided methods with O(log n) rope
//! lookups. Hosts with their own text storage implement the trait directly.
//!
//! # Coordinates
//!
//! Offsets are absolute char indices (Unicode scalar values). A buffer
//! ending with `\n` has a trailing empty line, matching how ropey counts
//! lines and how editors display files.

use std::fs;
use std::io;
use std::path::Path;

use ropey::Rope;

use crate::position::Position;

// ---------------------------------------------------------------------------
// BufferView
// ---------------------------------------------------------------------------

/// Read-only, line-addressable text as seen by the search engine.
pub trait BufferView {
    /// Number of lines. A non-empty buffer always has at least one.
    fn line_count(&self) -> usize;

    /// The char at `offset`, or `None` past the end.
    fn char_at(&self, offset: usize) -> Option<char>;

    /// Offset of the first char of `line`, or `None` if the line doesn't exist.
    fn line_start(&self, line: usize) -> Option<usize>;

    /// Total number of chars.
    fn len_chars(&self) -> usize;

    /// True when the buffer holds no text.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// The line containing `offset`. Offsets past the end map to the last line.
    fn line_of(&self, offset: usize) -> usize {
        let count = self.line_count();
        if count == 0 {
            return 0;
        }
        // Binary search for the last line starting at or before `offset`.
        let (mut lo, mut hi) = (0, count - 1);
        while lo < hi {
            let mid = (lo + hi).div_ceil(2);
            match self.line_start(mid) {
                Some(start) if start <= offset => lo = mid,
                _ => hi = mid - 1,
            }
        }
        lo
    }

    /// Offset just past the last content char of `line` (line ending excluded).
    fn line_end(&self, line: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let mut end = self
            .line_start(line + 1)
            .unwrap_or_else(|| self.len_chars());
        while end > start && matches!(self.char_at(end - 1), Some('\n' | '\r')) {
            end -= 1;
        }
        Some(end)
    }

    /// The content of `line` without its line ending.
    fn line_text(&self, line: usize) -> Option<String> {
        let start = self.line_start(line)?;
        let end = self.line_end(line)?;
        Some((start..end).filter_map(|i| self.char_at(i)).collect())
    }

    /// Convert an offset to `(line, col)`. Offsets past the end are clamped.
    fn position_of(&self, offset: usize) -> Position {
        let offset = offset.min(self.len_chars());
        let line = self.line_of(offset);
        let start = self.line_start(line).unwrap_or(0);
        Position::new(line, offset.saturating_sub(start))
    }

    /// Convert `(line, col)` to an offset, clamping the column to the line's
    /// content. Returns `None` if the line doesn't exist.
    fn offset_of(&self, pos: Position) -> Option<usize> {
        let start = self.line_start(pos.line)?;
        let end = self.line_end(pos.line)?;
        Some(start + pos.col.min(end - start))
    }
}

// ---------------------------------------------------------------------------
// TextBuffer
// ---------------------------------------------------------------------------

/// A rope-backed [`BufferView`].
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a buffer from a string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Load a buffer from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid UTF-8.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    /// The underlying rope.
    #[inline]
    #[must_use]
    pub const fn rope(&self) -> &Rope {
        &self.rope
    }
}

impl BufferView for TextBuffer {
    #[inline]
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    #[inline]
    fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.rope.len_chars()).then(|| self.rope.char(offset))
    }

    #[inline]
    fn line_start(&self, line: usize) -> Option<usize> {
        (line < self.rope.len_lines()).then(|| self.rope.line_to_char(line))
    }

    #[inline]
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn line_of(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let s: String = self.rope.line(line).chars().collect();
        Some(s.trim_end_matches(['\n', '\r']).to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// A `BufferView` that only implements the required methods, so the
    /// provided defaults get exercised.
    struct Lines(Vec<char>);

    impl Lines {
        fn new(text: &str) -> Self {
            Self(text.chars().collect())
        }
    }

    impl BufferView for Lines {
        fn line_count(&self) -> usize {
            self.0.iter().filter(|&&c| c == '\n').count() + 1
        }

        fn char_at(&self, offset: usize) -> Option<char> {
            self.0.get(offset).copied()
        }

        fn line_start(&self, line: usize) -> Option<usize> {
            if line == 0 {
                return Some(0);
            }
            self.0
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == '\n')
                .nth(line - 1)
                .map(|(i, _)| i + 1)
        }

        fn len_chars(&self) -> usize {
            self.0.len()
        }
    }

    // -- TextBuffer ---------------------------------------------------------

    #[test]
    fn empty_buffer_has_one_line() {
        let buf = TextBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_text(0).as_deref(), Some(""));
        assert_eq!(buf.char_at(0), None);
    }

    #[test]
    fn line_starts_and_chars() {
        let buf = TextBuffer::from_text("foo\nbar\nfoo");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.line_start(1), Some(4));
        assert_eq!(buf.line_start(2), Some(8));
        assert_eq!(buf.line_start(3), None);
        assert_eq!(buf.char_at(8), Some('f'));
        assert_eq!(buf.char_at(11), None);
        assert_eq!(buf.len_chars(), 11);
    }

    #[test]
    fn line_text_strips_crlf() {
        let buf = TextBuffer::from_text("one\r\ntwo\r\n");
        assert_eq!(buf.line_text(0).as_deref(), Some("one"));
        assert_eq!(buf.line_text(1).as_deref(), Some("two"));
        assert_eq!(buf.line_text(2).as_deref(), Some(""));
        assert_eq!(buf.line_end(0), Some(3));
    }

    #[test]
    fn position_conversion_round_trips() {
        let buf = TextBuffer::from_text("café\nlatte");
        assert_eq!(buf.position_of(6), Position::new(1, 1));
        assert_eq!(buf.offset_of(Position::new(1, 1)), Some(6));
        assert_eq!(buf.position_of(100), Position::new(1, 5));
    }

    #[test]
    fn offset_of_clamps_column() {
        let buf = TextBuffer::from_text("ab\ncdef");
        assert_eq!(buf.offset_of(Position::new(0, 9)), Some(2));
        assert_eq!(buf.offset_of(Position::new(5, 0)), None);
    }

    // -- Provided methods ---------------------------------------------------

    #[test]
    fn default_line_of_matches_rope() {
        let text = "alpha\n\nbeta\ngamma\n";
        let plain = Lines::new(text);
        let rope = TextBuffer::from_text(text);
        for offset in 0..=text.len() {
            assert_eq!(plain.line_of(offset), rope.line_of(offset), "offset {offset}");
        }
    }

    #[test]
    fn default_line_text() {
        let plain = Lines::new("alpha\n\nbeta");
        assert_eq!(plain.line_text(0).as_deref(), Some("alpha"));
        assert_eq!(plain.line_text(1).as_deref(), Some(""));
        assert_eq!(plain.line_text(2).as_deref(), Some("beta"));
        assert_eq!(plain.line_text(3), None);
    }
}
