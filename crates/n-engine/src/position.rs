//! Line/column positions.
//!
//! The engine itself addresses text by absolute char offset (the caret). A
//! [`Position`] is the `(line, col)` view of such an offset, used wherever a
//! line matters: line offsets (`/pat/+2`), jump-list deduplication and the
//! `line:col` shown to the user.
//!
//! All coordinates are **0-indexed** and columns count chars, not bytes.
//! Conversion to 1-indexed happens only in `Display`.

use std::fmt;

/// A position in a text buffer: (line, column), both 0-indexed.
///
/// Positions are ordered line first, then column, so
/// `Position { line: 0, col: 5 }` < `Position { line: 1, col: 0 }`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin — line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// The position `delta` lines away, clamped to `0..line_count`.
    ///
    /// The column is reset to 0: Vim's line offsets always land at the start
    /// of the target line.
    #[must_use]
    pub fn shift_lines(self, delta: isize, line_count: usize) -> Self {
        let last = line_count.saturating_sub(1);
        let line = self.line.saturating_add_signed(delta).min(last);
        Self { line, col: 0 }
    }
}

impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for human display, matching Vim's `line:col` ruler.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_line_then_col() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 3));
        assert_eq!(
            Position::new(4, 4).cmp(&Position::new(4, 4)),
            std::cmp::Ordering::Equal
        );
    }

    #[test]
    fn display_is_1_indexed() {
        assert_eq!(Position::ZERO.to_string(), "1:1");
        assert_eq!(Position::new(9, 4).to_string(), "10:5");
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", Position::new(3, 7)), "Pos(3:7)");
    }

    #[test]
    fn shift_lines_down_and_up() {
        let p = Position::new(3, 5);
        assert_eq!(p.shift_lines(2, 10), Position::new(5, 0));
        assert_eq!(p.shift_lines(-1, 10), Position::new(2, 0));
    }

    #[test]
    fn shift_lines_clamps_to_buffer() {
        let p = Position::new(1, 2);
        assert_eq!(p.shift_lines(-5, 4), Position::ZERO);
        assert_eq!(p.shift_lines(50, 4), Position::new(3, 0));
    }
}
