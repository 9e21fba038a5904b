// SPDX-License-Identifier: MIT
//
// An editing session over one buffer: the caret, the search engine, and the
// command dispatcher.
//
// Each input line is one command:
//
//   /pat[/off]  ?pat[?off]   search, with optional count prefix
//   n  N  *  #  g*  g#       repeats and word searches, optional count
//   :set ...                 option changes and queries
//   :noh[lsearch]            hide search highlights
//   :his[tory] [/] [N]       list search history, or one entry
//   <C-o>  <C-i>             walk the jump list
//
// Every command yields a `Step`: where the caret ended up and what Vim
// would have shown on the message line.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use n_engine::buffer::{BufferView, TextBuffer};
use n_engine::command::Dispatcher;
use n_engine::engine::SearchEngine;
use n_engine::options::SearchOptions;
use n_engine::position::Position;
use n_engine::report::Message;
use n_engine::state::SearchHistory;

/// The visible result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub position: Position,
    pub message: Option<Message>,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.position)?;
        if let Some(message) = &self.message {
            write!(f, "  {message}")?;
        }
        Ok(())
    }
}

pub struct Session {
    buffer: TextBuffer,
    caret: usize,
    engine: SearchEngine,
    dispatcher: Dispatcher,
    /// Raised (by SIGINT in the binary) to interrupt a long repeat.
    interrupt: &'static AtomicBool,
}

impl Session {
    pub fn new(
        buffer: TextBuffer,
        options: SearchOptions,
        interrupt: &'static AtomicBool,
    ) -> Self {
        Self {
            buffer,
            caret: 0,
            engine: SearchEngine::new(options),
            dispatcher: Dispatcher::new(),
            interrupt,
        }
    }

    pub const fn caret(&self) -> usize {
        self.caret
    }

    /// Run one command line.
    pub fn execute(&mut self, input: &str) -> Step {
        let input = input.trim_end_matches(['\r', '\n']);
        self.interrupt.store(false, Ordering::Relaxed);

        let message = if let Some(ex) = input.strip_prefix(':') {
            self.ex_command(ex.trim())
        } else {
            match input.trim() {
                "<C-o>" | "<C-O>" => self.jump(|engine, buf, caret| engine.jump_back(buf, caret)),
                "<C-i>" | "<C-I>" | "<Tab>" => self.jump(|engine, buf, _| engine.jump_forward(buf)),
                _ => self.motion(input),
            }
        };

        Step {
            position: self.buffer.position_of(self.caret),
            message,
        }
    }

    fn motion(&mut self, input: &str) -> Option<Message> {
        let outcome = self.dispatcher.dispatch(
            &mut self.engine,
            &self.buffer,
            self.caret,
            input,
            self.interrupt,
        );
        debug!("{input:?}: {:?}", outcome.flags);
        self.caret = self
            .engine
            .apply_report(&self.buffer, self.caret, &outcome.report);
        outcome.report.message
    }

    fn jump(
        &mut self,
        step: impl FnOnce(&mut SearchEngine, &TextBuffer, usize) -> Option<usize>,
    ) -> Option<Message> {
        if let Some(target) = step(&mut self.engine, &self.buffer, self.caret) {
            self.caret = target;
        }
        None
    }

    fn ex_command(&mut self, ex: &str) -> Option<Message> {
        let (cmd, args) = ex
            .split_once(char::is_whitespace)
            .map_or((ex, ""), |(c, a)| (c, a.trim_start()));
        match cmd {
            "set" | "se" => match self.engine.apply_set(args) {
                Ok(shown) => shown.map(Message::Info),
                Err(e) => Some(Message::Error(e.to_string())),
            },
            "noh" | "nohl" | "nohlsearch" => {
                self.engine.clear_highlight();
                None
            }
            "his" | "hist" | "histo" | "histor" | "history" => Some(self.history(args)),
            _ => Some(Message::Error(format!("E492: Not an editor command: {ex}"))),
        }
    }

    /// `:history [/|?|search] [N]`. A positive `N` counts from the oldest
    /// entry, a negative one from the newest.
    fn history(&self, args: &str) -> Message {
        let (name, index) = match args.split_once(char::is_whitespace) {
            Some((name, index)) => (name, index.trim()),
            None if args.starts_with(|c: char| c == '-' || c.is_ascii_digit()) => ("", args),
            None => (args, ""),
        };
        if !matches!(name, "" | "/" | "?" | "s" | "search") {
            return Message::Error(format!("E488: Trailing characters: {args}"));
        }

        let history = self.engine.state().history();
        let newest = history.len();
        let selected: Vec<(usize, &str)> = if index.is_empty() {
            (1..).zip(history.iter()).collect()
        } else {
            match index.parse::<isize>() {
                Ok(n) => history_entry(history, n).into_iter().collect(),
                Err(_) => return Message::Error(format!("E488: Trailing characters: {index}")),
            }
        };

        let mut lines = vec!["      #  search history".to_string()];
        for (number, entry) in selected {
            let marker = if number == newest { '>' } else { ' ' };
            lines.push(format!("{marker}{number:>6}  {entry}"));
        }
        Message::Info(lines.join("\n"))
    }
}

/// Entry `n` of the history with its 1-based number. Negative `n` counts
/// back from the newest.
fn history_entry(history: &SearchHistory, n: isize) -> Option<(usize, &str)> {
    if n < 0 {
        let back = n.unsigned_abs() - 1;
        history.recent(back).map(|e| (history.len() - back, e))
    } else {
        let number = n.unsigned_abs();
        history.iter().nth(number.checked_sub(1)?).map(|e| (number, e))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    static NEVER_RAISED: AtomicBool = AtomicBool::new(false);

    fn session(text: &str) -> Session {
        Session::new(TextBuffer::from_text(text), SearchOptions::default(), &NEVER_RAISED)
    }

    fn run(s: &mut Session, input: &str) -> String {
        s.execute(input).to_string()
    }

    #[test]
    fn search_and_repeat() {
        let mut s = session("foo\nbar\nfoo");
        assert_eq!(run(&mut s, "/foo"), "3:1  /foo");
        assert_eq!(run(&mut s, "n"), "1:1  search hit BOTTOM, continuing at TOP");
        assert_eq!(run(&mut s, "N"), "3:1  search hit TOP, continuing at BOTTOM");
        assert_eq!(run(&mut s, "/baz"), "3:1  E486: Pattern not found: baz");
    }

    #[test]
    fn set_changes_matching() {
        let mut s = session("Foo\nfoo");
        assert_eq!(run(&mut s, ":set ic"), "1:1");
        assert_eq!(run(&mut s, ":set ic?"), "1:1  ignorecase");
        assert_eq!(run(&mut s, "/FOO"), "2:1  /FOO");
        assert_eq!(run(&mut s, ":set nows"), "2:1");
        assert_eq!(
            run(&mut s, "n"),
            "2:1  E385: Search hit BOTTOM without match for: FOO"
        );
        assert_eq!(run(&mut s, ":set bogus"), "2:1  E518: Unknown option: bogus");
    }

    #[test]
    fn jumps_walk_back_and_forth() {
        let mut s = session("a\nfoo\nb\nfoo");
        run(&mut s, "/foo");
        run(&mut s, "n");
        assert_eq!(s.caret(), 8);
        assert_eq!(run(&mut s, "<C-o>"), "2:1");
        assert_eq!(run(&mut s, "<C-o>"), "1:1");
        assert_eq!(run(&mut s, "<C-o>"), "1:1");
        assert_eq!(run(&mut s, "<C-i>"), "2:1");
        assert_eq!(run(&mut s, "<C-i>"), "4:1");
    }

    #[test]
    fn star_with_count() {
        let mut s = session("ab x ab x ab");
        assert_eq!(run(&mut s, "2*"), "1:11  /\\<ab\\>");
    }

    #[test]
    fn history_lists_searches() {
        let mut s = session("foo bar");
        assert_eq!(run(&mut s, ":history"), "1:1        #  search history");
        run(&mut s, "/foo");
        run(&mut s, "/bar/e");
        run(&mut s, "/foo");
        assert_eq!(
            run(&mut s, ":his /"),
            "1:1        #  search history\n      1  bar/e\n>     2  foo"
        );
        assert_eq!(
            run(&mut s, ":history / -2"),
            "1:1        #  search history\n      1  bar/e"
        );
        assert_eq!(
            run(&mut s, ":his 2"),
            "1:1        #  search history\n>     2  foo"
        );
        assert_eq!(run(&mut s, ":his / 9"), "1:1        #  search history");
        assert_eq!(run(&mut s, ":his x"), "1:1  E488: Trailing characters: x");
    }

    #[test]
    fn overflowing_count_finishes() {
        let mut s = session("foo\nbar\nfoo");
        assert_eq!(
            run(&mut s, "99999999999999999999/foo"),
            "3:1  search hit BOTTOM, continuing at TOP"
        );
        // Clamped to 999999999: an odd number of laps over two matches.
        assert_eq!(
            run(&mut s, "99999999999999999998n"),
            "1:1  search hit BOTTOM, continuing at TOP"
        );
    }

    #[test]
    fn ex_errors() {
        let mut s = session("foo");
        assert_eq!(run(&mut s, ":noh"), "1:1");
        assert_eq!(run(&mut s, ":wq"), "1:1  E492: Not an editor command: wq");
        assert_eq!(run(&mut s, "n"), "1:1  E35: No previous regular expression");
    }
}
