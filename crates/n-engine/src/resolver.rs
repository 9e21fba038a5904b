//! Repeat resolver — `[count]n` and `[count]N`.
//!
//! A repeat runs `count` scanner hops with the last pattern, each hop
//! starting from the previous match, and applies the pattern's offset once
//! after the final hop. Any hop that finds nothing fails the whole repeat:
//! a count is never partially satisfied.
//!
//! The host can interrupt a long repeat between hops through [`Cancel`];
//! the caret then stays where it was.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use crate::buffer::BufferView;
use crate::pattern::{Offset, Pattern};
use crate::scanner::{find_match, Anchor, Hit, Match, ScanResult, SearchDirection};
use crate::state::SearchState;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// A host-owned interruption flag, checked before every hop.
pub trait Cancel {
    fn is_cancelled(&self) -> bool;
}

impl Cancel for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// A flag that is never raised.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancel for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Repeat
// ---------------------------------------------------------------------------

/// Repeat the last search `count` times. `reversed` flips the recorded
/// direction (`N`).
#[must_use]
pub fn repeat(
    buf: &dyn BufferView,
    state: &SearchState,
    wrapscan: bool,
    caret: usize,
    count: usize,
    reversed: bool,
    cancel: &dyn Cancel,
) -> ScanResult {
    let Some((pattern, last_direction)) = state.last() else {
        debug!("repeat with no previous pattern");
        return ScanResult::NoPattern;
    };
    let direction = if reversed {
        last_direction.opposite()
    } else {
        last_direction
    };
    resolve(buf, pattern, direction, wrapscan, caret, count, cancel)
}

/// Run `count` hops of `pattern` from `caret` and apply its offset.
#[must_use]
pub fn resolve(
    buf: &dyn BufferView,
    pattern: &Pattern,
    direction: SearchDirection,
    wrapscan: bool,
    caret: usize,
    count: usize,
    cancel: &dyn Cancel,
) -> ScanResult {
    let count = count.max(1);
    let anchor = Anchor::for_offset(pattern.offset());
    let mut from = repeat_origin(buf, caret, pattern.offset());
    let mut wrapped = false;
    let mut first_start: Option<usize> = None;
    let mut last: Option<Match> = None;
    let mut hop = 0;

    while hop < count {
        if cancel.is_cancelled() {
            debug!("search for {:?} interrupted after {hop} of {count} hops", pattern.source());
            return ScanResult::Cancelled;
        }
        let Some(m) = find_match(buf, from, pattern, direction, wrapscan) else {
            debug!("{:?} not found after {hop} of {count} hops", pattern.source());
            return ScanResult::NotFound;
        };
        wrapped |= m.wrapped;
        from = m.anchor(anchor);
        hop += 1;

        // Hops are deterministic, so once the first match comes round again
        // the rest of the count only repeats whole laps.
        match first_start {
            None => first_start = Some(m.start),
            Some(start) if m.start == start && hop < count => {
                let lap = hop - 1;
                hop = count - (count - hop) % lap;
                trace!("lap of {lap} matches, skipping to hop {hop}");
            }
            Some(_) => {}
        }
        last = Some(m);
    }

    let Some(m) = last else {
        return ScanResult::NotFound;
    };
    let offset = apply_offset(buf, &m, pattern.offset());
    debug!(
        "{direction:?} x{count} for {:?}: match {}..{}, caret {caret} -> {offset}",
        pattern.source(),
        m.start,
        m.end
    );
    ScanResult::Found(Hit { offset, wrapped })
}

/// Where the caret lands for `m` under `offset`, clamped to the buffer.
///
/// Line offsets land on column 0 of the target line. Character offsets
/// step over line breaks the way `l` and `h` do with `whichwrap`, so the
/// caret never rests on a `\n` or `\r`.
#[must_use]
pub fn apply_offset(buf: &dyn BufferView, m: &Match, offset: Offset) -> usize {
    match offset {
        Offset::None => m.start,
        Offset::Start(n) => step_chars(buf, m.start, n),
        Offset::End(n) => step_chars(buf, m.last_char(), n),
        Offset::Line(n) => {
            let target = buf.position_of(m.start).shift_lines(n, buf.line_count());
            buf.line_start(target.line).unwrap_or(0)
        }
    }
}

/// Move `n` caret positions from `offset` (negative: backwards), stopping
/// at either end of the buffer.
#[must_use]
pub fn step_chars(buf: &dyn BufferView, offset: usize, n: isize) -> usize {
    let len = buf.len_chars();
    let mut at = offset.min(len.saturating_sub(1));
    for _ in 0..n.unsigned_abs() {
        let next = if n > 0 {
            (at + 1..len).find(|&o| is_caret_stop(buf, o))
        } else {
            (0..at).rev().find(|&o| is_caret_stop(buf, o))
        };
        match next {
            Some(o) => at = o,
            None => break,
        }
    }
    at
}

/// Line content, or the line break of an empty line (its only position).
fn is_caret_stop(buf: &dyn BufferView, offset: usize) -> bool {
    match buf.char_at(offset) {
        Some('\n' | '\r') => buf.line_start(buf.line_of(offset)) == Some(offset),
        Some(_) => true,
        None => false,
    }
}

/// The first hop's origin: the caret with any character offset undone, so
/// a repeat after `/foo/s+2` or `/foo/e-1` doesn't find the same match.
fn repeat_origin(buf: &dyn BufferView, caret: usize, offset: Offset) -> usize {
    match offset.char_shift() {
        0 => caret.min(buf.len_chars()),
        shift => step_chars(buf, caret, -shift),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::buffer::TextBuffer;
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

    fn state(text: &str, direction: SearchDirection) -> SearchState {
        let mut s = SearchState::new();
        s.record_search(pat(text), direction);
        s
    }

    fn found(offset: usize, wrapped: bool) -> ScanResult {
        ScanResult::Found(Hit { offset, wrapped })
    }

    /// Raises itself after a fixed number of checks.
    struct CancelAfter(Cell<usize>);

    impl Cancel for CancelAfter {
        fn is_cancelled(&self) -> bool {
            let left = self.0.get();
            if left == 0 {
                return true;
            }
            self.0.set(left - 1);
            false
        }
    }

    // -- repeat -------------------------------------------------------------

    #[test]
    fn no_pattern() {
        let buf = TextBuffer::from_text("foo");
        let s = SearchState::new();
        for count in [0, 1, 5] {
            assert_eq!(
                repeat(&buf, &s, true, 0, count, false, &NeverCancel),
                ScanResult::NoPattern
            );
        }
    }

    #[test]
    fn next_and_reversed() {
        let buf = TextBuffer::from_text("foo\nbar\nfoo\nfoo");
        let s = state("foo", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 8, 1, false, &NeverCancel), found(12, false));
        // Backwards from there: the first match, one step past its end.
        assert_eq!(repeat(&buf, &s, true, 8, 1, true, &NeverCancel), found(4, false));
    }

    #[test]
    fn reversed_backward_search_goes_forward() {
        let buf = TextBuffer::from_text("foo\nbar\nfoo");
        let s = state("foo", SearchDirection::Backward);
        assert_eq!(repeat(&buf, &s, true, 0, 1, true, &NeverCancel), found(8, false));
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(8, true));
    }

    #[test]
    fn count_wraps() {
        let buf = TextBuffer::from_text("foo\nbar\nfoo");
        let s = state("foo", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 2, false, &NeverCancel), found(0, true));
        assert_eq!(repeat(&buf, &s, true, 0, 3, false, &NeverCancel), found(8, true));
    }

    #[test]
    fn count_is_all_or_nothing_without_wrapscan() {
        let buf = TextBuffer::from_text("foo\nbar\nfoo");
        let s = state("foo", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, false, 0, 1, false, &NeverCancel), found(8, false));
        assert_eq!(
            repeat(&buf, &s, false, 0, 2, false, &NeverCancel),
            ScanResult::NotFound
        );
    }

    #[test]
    fn zero_count_means_one() {
        let buf = TextBuffer::from_text("foo\nbar\nfoo");
        let s = state("foo", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 0, false, &NeverCancel), found(8, false));
    }

    // -- Cancellation -------------------------------------------------------

    #[test]
    fn cancelled_before_first_hop() {
        let buf = TextBuffer::from_text("foo foo");
        let s = state("foo", SearchDirection::Forward);
        let flag = AtomicBool::new(true);
        assert_eq!(
            repeat(&buf, &s, true, 0, 1, false, &flag),
            ScanResult::Cancelled
        );
    }

    #[test]
    fn cancelled_between_hops() {
        let buf = TextBuffer::from_text("foo foo foo foo");
        let s = state("foo", SearchDirection::Forward);
        let cancel = CancelAfter(Cell::new(2));
        assert_eq!(
            repeat(&buf, &s, true, 0, 3, false, &cancel),
            ScanResult::Cancelled
        );
    }

    // -- Offsets ------------------------------------------------------------

    #[test]
    fn end_offset_applied_once() {
        let buf = TextBuffer::from_text("foo foo foo");
        let s = state("foo/e", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(2, false));
        // From the end of the first match, the next end is the second's.
        assert_eq!(repeat(&buf, &s, true, 2, 1, false, &NeverCancel), found(6, false));
        assert_eq!(repeat(&buf, &s, true, 2, 2, false, &NeverCancel), found(10, false));
    }

    #[test]
    fn start_offset_does_not_stick() {
        let buf = TextBuffer::from_text("foo foo foo");
        let s = state("foo/s+1", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(5, false));
        assert_eq!(repeat(&buf, &s, true, 5, 1, false, &NeverCancel), found(9, false));
        assert_eq!(repeat(&buf, &s, true, 5, 1, true, &NeverCancel), found(1, false));
    }

    #[test]
    fn end_offset_backward() {
        let buf = TextBuffer::from_text("foo foo foo");
        let s = state("foo/e-1", SearchDirection::Backward);
        // Caret on the middle `o` of the last match.
        assert_eq!(repeat(&buf, &s, true, 9, 1, false, &NeverCancel), found(5, false));
    }

    #[test]
    fn line_offset_lands_on_column_zero() {
        let buf = TextBuffer::from_text("alpha\n  foo\ngamma\ndelta");
        let s = state("foo/+1", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(12, false));
        let s = state("foo/-1", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(0, false));
    }

    #[test]
    fn offsets_clamp_to_buffer() {
        let buf = TextBuffer::from_text("ab\nfoo");
        let m = Match {
            start: 3,
            end: 6,
            wrapped: false,
        };
        assert_eq!(apply_offset(&buf, &m, Offset::End(10)), 5);
        assert_eq!(apply_offset(&buf, &m, Offset::Start(-10)), 0);
        assert_eq!(apply_offset(&buf, &m, Offset::Line(7)), 3);
        assert_eq!(apply_offset(&buf, &m, Offset::Line(-7)), 0);
    }

    #[test]
    fn char_offsets_step_over_line_breaks() {
        let buf = TextBuffer::from_text("foo\nbar");
        let s = state("foo/e+1", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(4, false));

        let buf = TextBuffer::from_text("foo\r\nbar");
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(5, false));

        let buf = TextBuffer::from_text("xfoo\nbar");
        let s = state("bar/s-1", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(3, false));

        let buf = TextBuffer::from_text("xfoo\r\nbar");
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(3, false));
    }

    #[test]
    fn char_offsets_stop_on_empty_lines() {
        let buf = TextBuffer::from_text("foo\n\nbar");
        let s = state("foo/e+1", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(4, false));
        let s = state("foo/e+2", SearchDirection::Forward);
        assert_eq!(repeat(&buf, &s, true, 0, 1, false, &NeverCancel), found(5, false));
    }

    #[test]
    fn repeat_undoes_offset_across_lines() {
        let buf = TextBuffer::from_text("foo\nfoo\nfoo");
        let s = state("foo/e+1", SearchDirection::Forward);
        // Caret on the first char of line 2, one step past the first match.
        assert_eq!(repeat(&buf, &s, true, 4, 1, false, &NeverCancel), found(8, false));
        // Backwards from there: the first match, one step past its end.
        assert_eq!(repeat(&buf, &s, true, 8, 1, true, &NeverCancel), found(4, false));
    }

    #[test]
    fn step_chars_clamps_at_edges() {
        let buf = TextBuffer::from_text("ab\ncd\n");
        assert_eq!(step_chars(&buf, 4, 10), 4);
        assert_eq!(step_chars(&buf, 1, -10), 0);
        assert_eq!(step_chars(&buf, 1, 1), 3);
        assert_eq!(step_chars(&buf, 3, -1), 1);
        assert_eq!(step_chars(&buf, 3, 0), 3);
    }

    // -- Large counts -------------------------------------------------------

    #[test]
    fn huge_count_skips_whole_laps() {
        let buf = TextBuffer::from_text("foo\nbar\nfoo");
        let s = state("foo", SearchDirection::Forward);
        // Two matches: odd counts land on the next one, even counts return.
        assert_eq!(
            repeat(&buf, &s, true, 0, 999_999_999, false, &NeverCancel),
            found(8, true)
        );
        assert_eq!(repeat(&buf, &s, true, 0, usize::MAX - 1, false, &NeverCancel), found(0, true));
        assert_eq!(repeat(&buf, &s, true, 0, 1_000_001, true, &NeverCancel), found(8, true));
    }

    #[test]
    fn huge_count_with_single_match() {
        let buf = TextBuffer::from_text("abc\nfoo\nabc");
        let s = state("foo", SearchDirection::Backward);
        assert_eq!(repeat(&buf, &s, true, 4, usize::MAX, false, &NeverCancel), found(4, true));
    }
}
