//! Jump list — where search motions jumped from.
//!
//! Commands flagged [`SAVE_JUMP`](crate::command::CommandFlags::SAVE_JUMP)
//! (every search motion) record the caret's pre-jump position here when
//! they succeed. `Ctrl-O` walks back through the list, `Ctrl-I` forward.
//!
//! Entries on the same line collapse into one, the way Vim keeps at most one
//! jump per line.

use std::collections::VecDeque;

use crate::position::Position;

/// Maximum number of entries (Vim's limit).
const JUMPLIST_MAX: usize = 100;

/// Position history for `Ctrl-O` / `Ctrl-I`.
#[derive(Debug, Default)]
pub struct JumpList {
    entries: VecDeque<Position>,
    /// Index of the entry we navigated to, or `None` when at the live
    /// position (not browsing history).
    cursor: Option<usize>,
}

impl JumpList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the position a jump starts from.
    ///
    /// Browsing state is discarded: entries newer than the one we navigated
    /// to are dropped, browser-history style.
    pub fn push(&mut self, pos: Position) {
        if let Some(i) = self.cursor.take() {
            self.entries.truncate(i + 1);
        }
        self.entries.retain(|e| e.line != pos.line);
        self.entries.push_back(pos);
        if self.entries.len() > JUMPLIST_MAX {
            self.entries.pop_front();
        }
    }

    /// `Ctrl-O`: the previous entry. `live` is the caret position, stored on
    /// the first step back so `forward` can return to it.
    pub fn back(&mut self, live: Position) -> Option<Position> {
        let i = match self.cursor {
            Some(i) => i,
            None => {
                if self.entries.is_empty() {
                    return None;
                }
                self.push(live);
                self.entries.len() - 1
            }
        };
        let target = i.checked_sub(1)?;
        self.cursor = Some(target);
        self.entries.get(target).copied()
    }

    /// `Ctrl-I`: the next entry, if we stepped back before.
    pub fn forward(&mut self) -> Option<Position> {
        let next = self.cursor? + 1;
        let pos = self.entries.get(next).copied()?;
        self.cursor = Some(next);
        Some(pos)
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.entries.iter().copied()
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
