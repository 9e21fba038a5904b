//! Buffer scanner — one search hop over a [`BufferView`].
//!
//! A hop looks for the nearest match strictly after (forward) or strictly
//! before (backward) an origin offset, walking line by line. The match at
//! the origin itself is skipped, so feeding a hop's result back in as the
//! next origin always advances.
//!
//! # Wraparound
//!
//! With `wrapscan` on, a hop that reaches the end (start) of the buffer
//! continues from the start (end) and finishes on the origin line. A match
//! anchored exactly at the origin is accepted on this wrapped pass, which
//! is how Vim reports "search hit BOTTOM, continuing at TOP" and lands on
//! the only match in the buffer. With `wrapscan` off the hop stops at the
//! buffer edge.
//!
//! # Anchors
//!
//! Matches are ordered by their *anchor*: the first char normally, the last
//! char when the pattern carries an `e` offset. Anchoring on the end keeps
//! `n` from sticking to the current match after `/foo/e` put the caret on
//! its last char.

use log::trace;
use regex::Regex;

use crate::buffer::BufferView;
use crate::pattern::{Offset, Pattern};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

impl SearchDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    /// The command char that starts a search in this direction, which is
    /// also the pattern/offset delimiter (`/` forward, `?` backward).
    #[must_use]
    pub const fn delimiter(self) -> char {
        match self {
            Self::Forward => '/',
            Self::Backward => '?',
        }
    }
}

// ---------------------------------------------------------------------------
// Match / ScanResult
// ---------------------------------------------------------------------------

/// A match as absolute char offsets `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    /// The hop crossed a buffer edge to find this match.
    pub wrapped: bool,
}

impl Match {
    /// Length in chars. Zero-width matches (`^`, `\<`) have length 0.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Offset of the last char, or the start for zero-width matches.
    #[inline]
    #[must_use]
    pub const fn last_char(&self) -> usize {
        if self.end > self.start {
            self.end - 1
        } else {
            self.start
        }
    }

    /// The offset this match is ordered by for the given anchor.
    #[inline]
    #[must_use]
    pub const fn anchor(&self, anchor: Anchor) -> usize {
        match anchor {
            Anchor::Start => self.start,
            Anchor::End => self.last_char(),
        }
    }
}

/// Which end of a match orders it relative to the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
}

impl Anchor {
    /// `e` offsets anchor on the match end, everything else on the start.
    #[must_use]
    pub const fn for_offset(offset: Offset) -> Self {
        match offset {
            Offset::End(_) => Self::End,
            Offset::None | Offset::Line(_) | Offset::Start(_) => Self::Start,
        }
    }
}

/// A successful search: the caret offset and whether the search wrapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    pub offset: usize,
    pub wrapped: bool,
}

/// The outcome of a scan or repeat. Every failure a search can meet is a
/// variant here; none of them is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanResult {
    Found(Hit),
    /// No match anywhere the search was allowed to look.
    NotFound,
    /// A repeat was requested before any search was made.
    NoPattern,
    /// The host interrupted a multi-hop repeat.
    Cancelled,
}

impl ScanResult {
    /// The new caret offset, if the search succeeded.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::Found(hit) => Some(hit.offset),
            Self::NotFound | Self::NoPattern | Self::Cancelled => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// One search hop from `from`, reported as a [`ScanResult`].
///
/// Returns the raw match start; the pattern's offset is not applied here
/// (see [`crate::resolver`]).
#[must_use]
pub fn scan(
    buf: &dyn BufferView,
    from: usize,
    pattern: &Pattern,
    direction: SearchDirection,
    wrapscan: bool,
) -> ScanResult {
    find_match(buf, from, pattern, direction, wrapscan).map_or(ScanResult::NotFound, |m| {
        ScanResult::Found(Hit {
            offset: m.start,
            wrapped: m.wrapped,
        })
    })
}

/// One search hop from `from`, returning the full match.
#[must_use]
pub fn find_match(
    buf: &dyn BufferView,
    from: usize,
    pattern: &Pattern,
    direction: SearchDirection,
    wrapscan: bool,
) -> Option<Match> {
    if buf.is_empty() {
        return None;
    }

    let anchor = Anchor::for_offset(pattern.offset());
    let origin = buf.position_of(from);
    let line_count = buf.line_count();
    let hop = Hop {
        buf,
        regex: pattern.regex(),
        anchor,
        direction,
    };

    trace!("hop {direction:?} from {origin:?} for {:?}", pattern.source());

    let col = origin.col;
    match direction {
        SearchDirection::Forward => hop
            .line(origin.line, false, |k| k > col)
            .or_else(|| {
                (origin.line + 1..line_count).find_map(|line| hop.line(line, false, |_| true))
            })
            .or_else(|| {
                if !wrapscan {
                    return None;
                }
                (0..origin.line)
                    .find_map(|line| hop.line(line, true, |_| true))
                    .or_else(|| hop.line(origin.line, true, |k| k <= col))
            }),
        SearchDirection::Backward => hop
            .line(origin.line, false, |k| k < col)
            .or_else(|| {
                (0..origin.line)
                    .rev()
                    .find_map(|line| hop.line(line, false, |_| true))
            })
            .or_else(|| {
                if !wrapscan {
                    return None;
                }
                (origin.line + 1..line_count)
                    .rev()
                    .find_map(|line| hop.line(line, true, |_| true))
                    .or_else(|| hop.line(origin.line, true, |k| k >= col))
            }),
    }
}

/// All non-overlapping, non-empty matches in lines `[start_line, end_line)`,
/// in document order. Used to paint `hlsearch` highlights.
#[must_use]
pub fn matches_in_lines(
    buf: &dyn BufferView,
    pattern: &Pattern,
    start_line: usize,
    end_line: usize,
) -> Vec<Match> {
    let mut matches = Vec::new();

    for line in start_line..end_line.min(buf.line_count()) {
        let (Some(text), Some(line_start)) = (buf.line_text(line), buf.line_start(line)) else {
            continue;
        };
        let cols = CharCols::new(&text);
        for m in pattern.regex().find_iter(&text) {
            if m.is_empty() {
                continue;
            }
            matches.push(Match {
                start: line_start + cols.col(m.start()),
                end: line_start + cols.col(m.end()),
                wrapped: false,
            });
        }
    }

    matches
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct Hop<'a> {
    buf: &'a dyn BufferView,
    regex: &'a Regex,
    anchor: Anchor,
    direction: SearchDirection,
}

impl Hop<'_> {
    /// The nearest match on `line` (in hop direction) whose anchor column
    /// satisfies `accept`. Equal anchors resolve to the earliest start in
    /// the hop direction.
    fn line(&self, line: usize, wrapped: bool, accept: impl Fn(usize) -> bool) -> Option<Match> {
        let text = self.buf.line_text(line)?;
        let line_start = self.buf.line_start(line)?;

        let candidates = line_matches(&text, self.regex)
            .into_iter()
            .map(|(start, end)| Match {
                start: line_start + start,
                end: line_start + end,
                wrapped,
            })
            .filter(|m| accept(m.anchor(self.anchor) - line_start));

        let best = match self.direction {
            SearchDirection::Forward => {
                candidates.min_by_key(|m| (m.anchor(self.anchor), m.start))
            }
            SearchDirection::Backward => {
                candidates.max_by_key(|m| (m.anchor(self.anchor), m.start))
            }
        };
        if let Some(m) = best {
            trace!("match {}..{} on line {line} (wrapped={wrapped})", m.start, m.end);
        }
        best
    }
}

/// Every match on a line, one per distinct start column, as char columns
/// `[start, end)`. Overlapping matches are included: in `"aaa"` the pattern
/// `aa` matches at columns 0 and 1.
fn line_matches(text: &str, regex: &Regex) -> Vec<(usize, usize)> {
    let cols = CharCols::new(text);
    let mut out = Vec::new();
    let mut at = 0;

    while at <= text.len() {
        let Some(m) = regex.find_at(text, at) else {
            break;
        };
        out.push((cols.col(m.start()), cols.col(m.end())));
        // Resume one char past this start to find the next start column.
        at = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
    }

    out
}

/// Byte offset → char column lookup for one line.
struct CharCols {
    starts: Vec<usize>,
}

impl CharCols {
    fn new(text: &str) -> Self {
        Self {
            starts: text.char_indices().map(|(b, _)| b).collect(),
        }
    }

    /// Char column of a byte offset on a char boundary.
    fn col(&self, byte: usize) -> usize {
        self.starts.partition_point(|&b| b < byte)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
