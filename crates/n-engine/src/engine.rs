//! Search engine — one editing session's search machinery.
//!
//! [`SearchEngine`] bundles the session state the search motions share:
//! the last pattern ([`SearchState`]), the search options, and the jump
//! list. Hosts own exactly one per session and hand it to the command
//! layer at dispatch time; nothing here is global.
//!
//! # Operations
//!
//! | Method                | Vim                     | Mutates state |
//! |-----------------------|-------------------------|---------------|
//! | [`search`]            | `/pat/off`, `?pat`      | yes           |
//! | [`repeat_search`]     | `[count]n`, `[count]N`  | no            |
//! | [`search_word`]       | `*` `#` `g*` `g#`       | yes           |
//! | [`scan_next`]         | one raw hop forward     | no            |
//! | [`incremental`]       | `incsearch` preview     | no            |
//! | [`highlights`]        | `hlsearch` matches      | no            |
//! | [`apply_set`]         | `:set ...`              | options       |
//! | [`jump_back`]         | `Ctrl-O`                | jump list     |
//!
//! [`search`]: SearchEngine::search
//! [`repeat_search`]: SearchEngine::repeat_search
//! [`search_word`]: SearchEngine::search_word
//! [`scan_next`]: SearchEngine::scan_next
//! [`incremental`]: SearchEngine::incremental
//! [`highlights`]: SearchEngine::highlights
//! [`apply_set`]: SearchEngine::apply_set
//! [`jump_back`]: SearchEngine::jump_back

use log::debug;

use crate::buffer::BufferView;
use crate::command::MotionError;
use crate::jumplist::JumpList;
use crate::options::{parse_set, OptionError, SearchOptions};
use crate::pattern::{self, Offset, Pattern, PatternError, PatternFlags, PatternMode};
use crate::report::Report;
use crate::resolver::{self, Cancel};
use crate::scanner::{self, Match, ScanResult, SearchDirection};
use crate::state::SearchState;
use crate::word::word_at;

/// Session-scoped search state, options and jump list.
#[derive(Debug, Default)]
pub struct SearchEngine {
    state: SearchState,
    options: SearchOptions,
    jumps: JumpList,
}

impl SearchEngine {
    #[must_use]
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn state(&self) -> &SearchState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub const fn options(&self) -> &SearchOptions {
        &self.options
    }

    #[inline]
    pub const fn options_mut(&mut self) -> &mut SearchOptions {
        &mut self.options
    }

    #[inline]
    #[must_use]
    pub const fn jumps(&self) -> &JumpList {
        &self.jumps
    }

    // -- Patterns -----------------------------------------------------------

    /// Compile `text` as typed after `/` (or `?` for backward), honouring
    /// the current `magic`, `ignorecase` and `smartcase` settings.
    ///
    /// # Errors
    ///
    /// See [`pattern::compile_pattern`].
    pub fn compile_pattern(
        &self,
        text: &str,
        direction: SearchDirection,
    ) -> Result<Pattern, PatternError> {
        pattern::compile_pattern(text, PatternFlags::for_search(&self.options, direction))
    }

    /// Make `pattern` the one `n` and `N` repeat.
    pub fn record_search(&mut self, pattern: Pattern, direction: SearchDirection) {
        debug!("last search is now {direction:?} {pattern}");
        self.state.record_search(pattern, direction);
    }

    // -- Motions ------------------------------------------------------------

    /// An explicit `/` or `?` search, `count` matches away.
    ///
    /// An empty pattern reuses the last one: `/` keeps its offset, `//e`
    /// replaces it. The pattern is recorded before scanning, so `n` repeats
    /// it even when this search finds nothing.
    ///
    /// # Errors
    ///
    /// A pattern or offset that fails to compile. State is left untouched.
    pub fn search(
        &mut self,
        buf: &dyn BufferView,
        caret: usize,
        text: &str,
        direction: SearchDirection,
        count: usize,
        cancel: &dyn Cancel,
    ) -> Result<ScanResult, PatternError> {
        let flags = PatternFlags::for_search(&self.options, direction);
        let (source, offset_text) = pattern::split_offset(text, flags.delimiter);

        let pattern = if source.is_empty() {
            let Some(last) = self.state.last_pattern().cloned() else {
                return Ok(ScanResult::NoPattern);
            };
            match offset_text {
                Some(off) => last.with_offset(Offset::parse(off)?),
                None => last,
            }
        } else {
            let offset = offset_text.map_or(Ok(Offset::None), Offset::parse)?;
            pattern::build(source, offset, flags)?
        };

        let result = resolver::resolve(
            buf,
            &pattern,
            direction,
            self.options.wrapscan,
            caret,
            count,
            cancel,
        );
        self.record_search(pattern, direction);
        Ok(result)
    }

    /// `[count]n` (`reversed == false`) and `[count]N`.
    #[must_use]
    pub fn repeat_search(
        &self,
        buf: &dyn BufferView,
        caret: usize,
        count: usize,
        reversed: bool,
        cancel: &dyn Cancel,
    ) -> ScanResult {
        resolver::repeat(
            buf,
            &self.state,
            self.options.wrapscan,
            caret,
            count,
            reversed,
            cancel,
        )
    }

    /// One raw hop with the last pattern in its recorded direction. The
    /// offset is not applied.
    #[must_use]
    pub fn scan_next(&self, buf: &dyn BufferView, caret: usize) -> ScanResult {
        self.raw_hop(buf, caret, false)
    }

    /// One raw hop with the last pattern against its recorded direction.
    #[must_use]
    pub fn scan_previous(&self, buf: &dyn BufferView, caret: usize) -> ScanResult {
        self.raw_hop(buf, caret, true)
    }

    fn raw_hop(&self, buf: &dyn BufferView, caret: usize, reversed: bool) -> ScanResult {
        let Some((pattern, direction)) = self.state.last() else {
            return ScanResult::NoPattern;
        };
        let direction = if reversed {
            direction.opposite()
        } else {
            direction
        };
        scanner::scan(buf, caret, pattern, direction, self.options.wrapscan)
    }

    /// `*` / `#` (`whole_word`) and `g*` / `g#`: search for the word under
    /// or after the caret.
    ///
    /// Case follows `ignorecase` alone; `smartcase` does not apply to a
    /// word taken from the buffer.
    ///
    /// # Errors
    ///
    /// [`MotionError::NoStringUnderCursor`] when the caret's line has
    /// nothing but blanks from the caret on.
    pub fn search_word(
        &mut self,
        buf: &dyn BufferView,
        caret: usize,
        direction: SearchDirection,
        whole_word: bool,
        count: usize,
        cancel: &dyn Cancel,
    ) -> Result<ScanResult, MotionError> {
        let word = word_at(buf, caret).ok_or(MotionError::NoStringUnderCursor)?;
        let source = pattern::word_pattern(&word.text, whole_word && word.keyword);
        let flags = PatternFlags {
            mode: PatternMode::Magic,
            ignorecase: self.options.ignorecase,
            smartcase: false,
            delimiter: None,
        };
        let pattern = pattern::build(source, Offset::None, flags)?;

        // Searching starts from the word's first char, so `*` in the middle
        // of a word still finds the next occurrence.
        let result = resolver::resolve(
            buf,
            &pattern,
            direction,
            self.options.wrapscan,
            word.start,
            count,
            cancel,
        );
        self.record_search(pattern, direction);
        Ok(result)
    }

    /// The match `incsearch` previews while `text` is being typed.
    ///
    /// Incomplete or invalid text previews nothing. State is never touched.
    #[must_use]
    pub fn incremental(
        &self,
        buf: &dyn BufferView,
        caret: usize,
        text: &str,
        direction: SearchDirection,
    ) -> Option<Match> {
        if !self.options.incsearch {
            return None;
        }
        let pattern = self.compile_pattern(text, direction).ok()?;
        scanner::find_match(buf, caret, &pattern, direction, self.options.wrapscan)
    }

    /// Matches of the last pattern to highlight in lines
    /// `[start_line, end_line)`. Empty when `hlsearch` is off or after
    /// `:nohlsearch`.
    #[must_use]
    pub fn highlights(&self, buf: &dyn BufferView, start_line: usize, end_line: usize) -> Vec<Match> {
        if !self.options.hlsearch || !self.state.highlight_enabled() {
            return Vec::new();
        }
        self.state
            .last_pattern()
            .map(|p| scanner::matches_in_lines(buf, p, start_line, end_line))
            .unwrap_or_default()
    }

    /// `:nohlsearch`.
    pub const fn clear_highlight(&mut self) {
        self.state.clear_highlight();
    }

    // -- Options ------------------------------------------------------------

    /// Apply the arguments of a `:set` command.
    ///
    /// Returns the text for the message line (queries and listings).
    ///
    /// # Errors
    ///
    /// Stops at the first directive that fails; earlier ones stay applied,
    /// as in Vim.
    pub fn apply_set(&mut self, args: &str) -> Result<Option<String>, OptionError> {
        let mut shown = Vec::new();
        for directive in parse_set(args) {
            if let Some(text) = self.options.apply(&directive)? {
                shown.push(text);
            }
        }
        debug!("options after :set {args}: {:?}", self.options);
        Ok((!shown.is_empty()).then(|| shown.join("  ")))
    }

    // -- Jumps --------------------------------------------------------------

    /// Apply a report's caret move, recording the start in the jump list
    /// when the report asks for it. Returns the new caret.
    pub fn apply_report(&mut self, buf: &dyn BufferView, caret: usize, report: &Report) -> usize {
        let Some(target) = report.caret else {
            return caret;
        };
        if report.save_jump {
            self.jumps.push(buf.position_of(caret));
        }
        target
    }

    /// `Ctrl-O`: the caret offset of the previous jump.
    pub fn jump_back(&mut self, buf: &dyn BufferView, caret: usize) -> Option<usize> {
        let pos = self.jumps.back(buf.position_of(caret))?;
        buf.offset_of(pos)
    }

    /// `Ctrl-I`: the caret offset of the next jump, after a `Ctrl-O`.
    pub fn jump_forward(&mut self, buf: &dyn BufferView) -> Option<usize> {
        let pos = self.jumps.forward()?;
        buf.offset_of(pos)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
