//! Result reporter — scan outcomes as host-visible effects.
//!
//! Every [`ScanResult`] variant and every compile error maps to a
//! [`Report`]: an optional caret move, an optional message for the message
//! line, and whether the move should be recorded in the jump list. The host
//! applies the report; nothing here touches host state.
//!
//! Message texts follow Vim's, including its error numbers.

use std::fmt;

use crate::pattern::Offset;
use crate::scanner::{ScanResult, SearchDirection};

/// A line for the message area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Info(String),
    Error(String),
}

impl Message {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Info(s) | Self::Error(s) => s,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// What the reporter needs to know about the search that ran.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    /// Pattern text as the user would recognise it, if there was one.
    pub pattern: Option<&'a str>,
    /// Offset echoed after the pattern when a search lands (`/foo/e`).
    pub offset: Offset,
    /// The direction the search actually moved in (already flipped for `N`).
    pub direction: SearchDirection,
    pub wrapscan: bool,
    /// The command asked for its start position to be kept in the jump list.
    pub save_jump: bool,
}

/// Host-visible effect of a search command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    /// New caret offset; `None` leaves the caret where it is.
    pub caret: Option<usize>,
    pub message: Option<Message>,
    /// Record the pre-move caret in the jump list.
    pub save_jump: bool,
}

impl Report {
    /// Report a scan or repeat outcome.
    #[must_use]
    pub fn from_result(result: ScanResult, ctx: &ReportContext<'_>) -> Self {
        let pattern = ctx.pattern.unwrap_or_default();
        match result {
            ScanResult::Found(hit) => {
                let message = if hit.wrapped {
                    match ctx.direction {
                        SearchDirection::Forward => "search hit BOTTOM, continuing at TOP".to_string(),
                        SearchDirection::Backward => "search hit TOP, continuing at BOTTOM".to_string(),
                    }
                } else {
                    let delimiter = ctx.direction.delimiter();
                    match ctx.offset {
                        Offset::None => format!("{delimiter}{pattern}"),
                        offset => format!("{delimiter}{pattern}{delimiter}{offset}"),
                    }
                };
                Self {
                    caret: Some(hit.offset),
                    message: Some(Message::Info(message)),
                    save_jump: ctx.save_jump,
                }
            }
            ScanResult::NotFound => {
                let text = match (ctx.wrapscan, ctx.direction) {
                    (true, _) => format!("E486: Pattern not found: {pattern}"),
                    (false, SearchDirection::Forward) => {
                        format!("E385: Search hit BOTTOM without match for: {pattern}")
                    }
                    (false, SearchDirection::Backward) => {
                        format!("E384: Search hit TOP without match for: {pattern}")
                    }
                };
                Self::error(text)
            }
            ScanResult::NoPattern => Self::error("E35: No previous regular expression".to_string()),
            ScanResult::Cancelled => Self {
                message: Some(Message::Info("Interrupted".to_string())),
                ..Self::default()
            },
        }
    }

    /// Report a command that failed before searching (bad pattern, no word
    /// under the cursor). The caret stays put.
    #[must_use]
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::error(err.to_string())
    }

    /// A report with only an informational message.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            message: Some(Message::Info(text.into())),
            ..Self::default()
        }
    }

    fn error(text: String) -> Self {
        Self {
            message: Some(Message::Error(text)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.message.as_ref().is_some_and(Message::is_error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
