//! Search state — what `n` and `N` repeat.
//!
//! One [`SearchState`] lives in each editing session. Explicit searches
//! (`/`, `?`, `*`, `#`) overwrite it through [`SearchState::record_search`];
//! repeats only read it. The pattern stored here carries its offset, so
//! `n` after `/foo/e` lands on match ends too.

use std::collections::VecDeque;

use crate::pattern::Pattern;
use crate::scanner::SearchDirection;

/// Maximum number of entries kept in the search history (Vim's default
/// `history` value).
const HISTORY_MAX: usize = 50;

// ---------------------------------------------------------------------------
// SearchState
// ---------------------------------------------------------------------------

/// Last search pattern, its direction, and the highlight flag.
#[derive(Debug, Default)]
pub struct SearchState {
    last_pattern: Option<Pattern>,
    last_direction: SearchDirection,
    /// Whether `hlsearch` highlights are currently shown. Cleared by
    /// `:nohlsearch`, set again by the next search.
    highlight: bool,
    history: SearchHistory,
}

impl SearchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `pattern` as the one `n` / `N` repeat.
    pub fn record_search(&mut self, pattern: Pattern, direction: SearchDirection) {
        self.history.push(&pattern.to_string());
        self.last_pattern = Some(pattern);
        self.last_direction = direction;
        self.highlight = true;
    }

    /// The last pattern and direction, or `None` before the first search.
    #[must_use]
    pub fn last(&self) -> Option<(&Pattern, SearchDirection)> {
        self.last_pattern.as_ref().map(|p| (p, self.last_direction))
    }

    #[inline]
    #[must_use]
    pub const fn last_pattern(&self) -> Option<&Pattern> {
        self.last_pattern.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn last_direction(&self) -> SearchDirection {
        self.last_direction
    }

    #[inline]
    #[must_use]
    pub const fn highlight_enabled(&self) -> bool {
        self.highlight
    }

    /// `:nohlsearch` — hide highlights until the next search.
    pub const fn clear_highlight(&mut self) {
        self.highlight = false;
    }

    #[inline]
    #[must_use]
    pub const fn history(&self) -> &SearchHistory {
        &self.history
    }
}

// ---------------------------------------------------------------------------
// SearchHistory
// ---------------------------------------------------------------------------

/// Previously searched patterns, oldest first.
///
/// Re-searching an entry moves it to the newest slot instead of adding a
/// duplicate. The oldest entry is dropped past [`HISTORY_MAX`].
#[derive(Debug, Default)]
pub struct SearchHistory {
    entries: VecDeque<String>,
}

impl SearchHistory {
    pub fn push(&mut self, entry: &str) {
        if let Some(i) = self.entries.iter().position(|e| e == entry) {
            self.entries.remove(i);
        }
        self.entries.push_back(entry.to_string());
        if self.entries.len() > HISTORY_MAX {
            self.entries.pop_front();
        }
    }

    /// The `n`-th most recent entry (0 = newest).
    #[must_use]
    pub fn recent(&self, n: usize) -> Option<&str> {
        self.entries
            .len()
            .checked_sub(n + 1)
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{compile_pattern, PatternFlags};

    fn pat(text: &str) -> Pattern {
        compile_pattern(
            text,
            PatternFlags {
                delimiter: Some('/'),
                ..PatternFlags::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn starts_empty() {
        let s = SearchState::new();
        assert!(s.last().is_none());
        assert!(!s.highlight_enabled());
        assert!(s.history().is_empty());
    }

    #[test]
    fn record_overwrites() {
        let mut s = SearchState::new();
        s.record_search(pat("foo"), SearchDirection::Forward);
        s.record_search(pat("bar/e"), SearchDirection::Backward);
        let (p, dir) = s.last().unwrap();
        assert_eq!(p.source(), "bar");
        assert_eq!(dir, SearchDirection::Backward);
    }

    #[test]
    fn highlight_cleared_until_next_search() {
        let mut s = SearchState::new();
        s.record_search(pat("foo"), SearchDirection::Forward);
        assert!(s.highlight_enabled());
        s.clear_highlight();
        assert!(!s.highlight_enabled());
        assert!(s.last().is_some());
        s.record_search(pat("foo"), SearchDirection::Forward);
        assert!(s.highlight_enabled());
    }

    #[test]
    fn history_records_offsets_and_dedupes() {
        let mut s = SearchState::new();
        s.record_search(pat("foo"), SearchDirection::Forward);
        s.record_search(pat("bar/e"), SearchDirection::Forward);
        s.record_search(pat("foo"), SearchDirection::Forward);
        let entries: Vec<&str> = s.history().iter().collect();
        assert_eq!(entries, vec!["bar/e", "foo"]);
        assert_eq!(s.history().recent(0), Some("foo"));
        assert_eq!(s.history().recent(1), Some("bar/e"));
        assert_eq!(s.history().recent(2), None);
    }

    #[test]
    fn history_is_bounded() {
        let mut h = SearchHistory::default();
        for i in 0..HISTORY_MAX + 5 {
            h.push(&format!("p{i}"));
        }
        assert_eq!(h.len(), HISTORY_MAX);
        assert_eq!(h.iter().next(), Some("p5"));
    }
}
