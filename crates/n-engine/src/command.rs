//! Search commands — descriptors, handlers, and the dispatcher.
//!
//! Each normal-mode search command is a [`CommandDescriptor`]: its keys, its
//! [`CommandFlags`], and a factory for a stateless [`MotionHandler`]. The
//! [`Dispatcher`] parses typed keys, runs the handler against the session's
//! [`SearchEngine`], and turns the result into a [`Report`].
//!
//! # Commands
//!
//! | Keys          | Handler                       | Motion              |
//! |---------------|-------------------------------|---------------------|
//! | `/pat[/off]`  | [`SearchEntry`] forward       | exclusive, jump     |
//! | `?pat[?off]`  | [`SearchEntry`] backward      | exclusive, jump     |
//! | `n`           | [`SearchAgain`]               | exclusive, jump     |
//! | `N`           | [`SearchAgain`] reversed      | exclusive, jump     |
//! | `*` `#`       | [`SearchWord`] whole word     | exclusive, jump     |
//! | `g*` `g#`     | [`SearchWord`] any match      | exclusive, jump     |
//!
//! All of them accept a count prefix. A line offset (`/foo/+1`) makes the
//! motion linewise, an end offset (`/foo/e`) makes it inclusive.

use std::fmt;

use bitflags::bitflags;
use log::debug;

use crate::buffer::BufferView;
use crate::engine::SearchEngine;
use crate::pattern::{Offset, PatternError};
use crate::report::{Report, ReportContext};
use crate::resolver::Cancel;
use crate::scanner::{ScanResult, SearchDirection};

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

bitflags! {
    /// How a command's motion behaves when it succeeds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct CommandFlags: u8 {
        /// The char under the target is not part of an operator's range.
        const MOT_EXCLUSIVE = 0b0000_0001;
        /// The char under the target is part of the range.
        const MOT_INCLUSIVE = 0b0000_0010;
        /// Operators act on whole lines.
        const MOT_LINEWISE  = 0b0000_0100;
        /// The start position goes into the jump list.
        const SAVE_JUMP     = 0b0000_1000;
    }
}

/// Flags for a search motion whose pattern carries `offset`.
#[must_use]
pub fn motion_flags(base: CommandFlags, offset: Offset) -> CommandFlags {
    let mut flags = base;
    if offset.is_linewise() {
        flags.remove(CommandFlags::MOT_EXCLUSIVE);
        flags.insert(CommandFlags::MOT_LINEWISE);
    } else if offset.is_inclusive() {
        flags.remove(CommandFlags::MOT_EXCLUSIVE);
        flags.insert(CommandFlags::MOT_INCLUSIVE);
    }
    flags
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A search command that failed before it could scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionError {
    Pattern(PatternError),
    NoStringUnderCursor,
    UnknownCommand(String),
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(e) => e.fmt(f),
            Self::NoStringUnderCursor => f.write_str("E348: No string under cursor"),
            Self::UnknownCommand(keys) => write!(f, "E492: Not an editor command: {keys}"),
        }
    }
}

impl std::error::Error for MotionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pattern(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PatternError> for MotionError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Everything a handler may touch, passed in at dispatch time.
pub struct MotionContext<'a> {
    pub engine: &'a mut SearchEngine,
    pub buffer: &'a dyn BufferView,
    pub caret: usize,
    /// At least 1.
    pub count: usize,
    /// Text typed after `/` or `?`.
    pub argument: Option<&'a str>,
    pub cancel: &'a dyn Cancel,
}

/// What a handler did: the scan outcome and the direction it moved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    pub result: ScanResult,
    pub direction: SearchDirection,
}

/// A search command's behaviour. Implementations hold no session state.
pub trait MotionHandler {
    /// Run the motion.
    ///
    /// # Errors
    ///
    /// Failures that happen before scanning (bad pattern, nothing under
    /// the cursor). Scan outcomes, including not found, are `Ok`.
    fn run(&self, ctx: &mut MotionContext<'_>) -> Result<Motion, MotionError>;
}

/// `/` and `?`.
#[derive(Debug, Clone, Copy)]
pub struct SearchEntry {
    pub direction: SearchDirection,
}

impl MotionHandler for SearchEntry {
    fn run(&self, ctx: &mut MotionContext<'_>) -> Result<Motion, MotionError> {
        let result = ctx.engine.search(
            ctx.buffer,
            ctx.caret,
            ctx.argument.unwrap_or_default(),
            self.direction,
            ctx.count,
            ctx.cancel,
        )?;
        Ok(Motion {
            result,
            direction: self.direction,
        })
    }
}

/// `n` and `N`.
#[derive(Debug, Clone, Copy)]
pub struct SearchAgain {
    pub reversed: bool,
}

impl MotionHandler for SearchAgain {
    fn run(&self, ctx: &mut MotionContext<'_>) -> Result<Motion, MotionError> {
        let last = ctx.engine.state().last_direction();
        let direction = if self.reversed { last.opposite() } else { last };
        let result = ctx.engine.repeat_search(
            ctx.buffer,
            ctx.caret,
            ctx.count,
            self.reversed,
            ctx.cancel,
        );
        Ok(Motion { result, direction })
    }
}

/// `*`, `#`, `g*` and `g#`.
#[derive(Debug, Clone, Copy)]
pub struct SearchWord {
    pub direction: SearchDirection,
    pub whole_word: bool,
}

impl MotionHandler for SearchWord {
    fn run(&self, ctx: &mut MotionContext<'_>) -> Result<Motion, MotionError> {
        let result = ctx.engine.search_word(
            ctx.buffer,
            ctx.caret,
            self.direction,
            self.whole_word,
            ctx.count,
            ctx.cancel,
        )?;
        Ok(Motion {
            result,
            direction: self.direction,
        })
    }
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// A command's keys, flags, and handler factory.
pub struct CommandDescriptor {
    pub name: &'static str,
    pub keys: &'static str,
    pub flags: CommandFlags,
    pub make_handler: fn() -> Box<dyn MotionHandler>,
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("keys", &self.keys)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

const SEARCH_MOTION: CommandFlags = CommandFlags::MOT_EXCLUSIVE.union(CommandFlags::SAVE_JUMP);

fn search_forward() -> Box<dyn MotionHandler> {
    Box::new(SearchEntry {
        direction: SearchDirection::Forward,
    })
}

fn search_backward() -> Box<dyn MotionHandler> {
    Box::new(SearchEntry {
        direction: SearchDirection::Backward,
    })
}

fn search_again_next() -> Box<dyn MotionHandler> {
    Box::new(SearchAgain { reversed: false })
}

fn search_again_previous() -> Box<dyn MotionHandler> {
    Box::new(SearchAgain { reversed: true })
}

fn search_word_forward() -> Box<dyn MotionHandler> {
    Box::new(SearchWord {
        direction: SearchDirection::Forward,
        whole_word: true,
    })
}

fn search_word_backward() -> Box<dyn MotionHandler> {
    Box::new(SearchWord {
        direction: SearchDirection::Backward,
        whole_word: true,
    })
}

fn search_partial_forward() -> Box<dyn MotionHandler> {
    Box::new(SearchWord {
        direction: SearchDirection::Forward,
        whole_word: false,
    })
}

fn search_partial_backward() -> Box<dyn MotionHandler> {
    Box::new(SearchWord {
        direction: SearchDirection::Backward,
        whole_word: false,
    })
}

/// Every search command.
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "search-forward",
        keys: "/",
        flags: SEARCH_MOTION,
        make_handler: search_forward,
    },
    CommandDescriptor {
        name: "search-backward",
        keys: "?",
        flags: SEARCH_MOTION,
        make_handler: search_backward,
    },
    CommandDescriptor {
        name: "search-again-next",
        keys: "n",
        flags: SEARCH_MOTION,
        make_handler: search_again_next,
    },
    CommandDescriptor {
        name: "search-again-previous",
        keys: "N",
        flags: SEARCH_MOTION,
        make_handler: search_again_previous,
    },
    CommandDescriptor {
        name: "search-word-forward",
        keys: "*",
        flags: SEARCH_MOTION,
        make_handler: search_word_forward,
    },
    CommandDescriptor {
        name: "search-word-backward",
        keys: "#",
        flags: SEARCH_MOTION,
        make_handler: search_word_backward,
    },
    CommandDescriptor {
        name: "search-partial-forward",
        keys: "g*",
        flags: SEARCH_MOTION,
        make_handler: search_partial_forward,
    },
    CommandDescriptor {
        name: "search-partial-backward",
        keys: "g#",
        flags: SEARCH_MOTION,
        make_handler: search_partial_backward,
    },
];

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// The effect of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub report: Report,
    /// The command's flags, adjusted for the pattern's offset.
    pub flags: CommandFlags,
}

/// Largest count a command takes; longer digit runs are clamped to it.
pub const MAX_COUNT: usize = 999_999_999;

/// Parsed `[count]keys[argument]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput<'a> {
    pub count: Option<usize>,
    pub keys: &'a str,
    pub argument: Option<&'a str>,
}

/// Split typed input into count, command keys, and the `/` `?` argument.
///
/// Returns `None` when no command keys follow the count.
#[must_use]
pub fn parse_keys(input: &str) -> Option<KeyInput<'_>> {
    // A count never starts with 0 (`0` is a motion of its own).
    let digits = if input.starts_with('0') {
        0
    } else {
        input.bytes().take_while(u8::is_ascii_digit).count()
    };
    let count = if digits == 0 {
        None
    } else {
        Some(
            input[..digits]
                .parse::<usize>()
                .map_or(MAX_COUNT, |n| n.min(MAX_COUNT)),
        )
    };
    let rest = &input[digits..];

    let first = rest.chars().next()?;
    let (keys, argument) = match first {
        '/' | '?' => (&rest[..1], Some(&rest[1..])),
        'g' => (rest.get(..2).unwrap_or(rest), None),
        _ => (&rest[..first.len_utf8()], None),
    };
    if argument.is_none() && keys.len() != rest.len() {
        return Some(KeyInput {
            count,
            keys: rest,
            argument: None,
        });
    }
    Some(KeyInput {
        count,
        keys,
        argument,
    })
}

/// Runs search commands against a session's engine.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    commands: &'static [CommandDescriptor],
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    #[must_use]
    pub const fn new() -> Self {
        Self { commands: COMMANDS }
    }

    /// The command bound to `keys`.
    #[must_use]
    pub fn lookup(&self, keys: &str) -> Option<&'static CommandDescriptor> {
        self.commands.iter().find(|c| c.keys == keys)
    }

    /// Parse and run `input` (`n`, `3N`, `/foo/e`, `2*`, ...) with the caret
    /// at `caret`. The jump list is only updated once the host hands the
    /// report to [`SearchEngine::apply_report`].
    pub fn dispatch(
        &self,
        engine: &mut SearchEngine,
        buffer: &dyn BufferView,
        caret: usize,
        input: &str,
        cancel: &dyn Cancel,
    ) -> Outcome {
        let unknown = || Outcome {
            report: Report::from_error(&MotionError::UnknownCommand(input.to_string())),
            flags: CommandFlags::empty(),
        };
        let Some(parsed) = parse_keys(input) else {
            return unknown();
        };
        let Some(command) = self.lookup(parsed.keys) else {
            return unknown();
        };

        let handler = (command.make_handler)();
        let mut ctx = MotionContext {
            engine: &mut *engine,
            buffer,
            caret,
            count: parsed.count.unwrap_or(1).max(1),
            argument: parsed.argument,
            cancel,
        };
        let motion = match handler.run(&mut ctx) {
            Ok(motion) => motion,
            Err(e) => {
                debug!("{} failed: {e}", command.name);
                return Outcome {
                    report: Report::from_error(&e),
                    flags: command.flags,
                };
            }
        };

        let (source, offset) = engine
            .state()
            .last_pattern()
            .map_or((String::new(), Offset::None), |p| (p.source().to_string(), p.offset()));
        let flags = motion_flags(command.flags, offset);
        let report = Report::from_result(
            motion.result,
            &ReportContext {
                pattern: (!source.is_empty()).then_some(source.as_str()),
                offset,
                direction: motion.direction,
                wrapscan: engine.options().wrapscan,
                save_jump: flags.contains(CommandFlags::SAVE_JUMP),
            },
        );
        debug!("{}: {:?} -> {report:?}", command.name, motion.result);
        Outcome { report, flags }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
