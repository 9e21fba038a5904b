//! # n-engine — Vim search motions for any text buffer
//!
//! This crate reproduces Vim's search-motion semantics behind a small
//! host-facing interface:
//!
//! - **[`buffer`]** — `BufferView`, the read-only view hosts implement, and a rope-backed `TextBuffer`
//! - **[`position`]** — `Position` (line, col), 0-indexed
//! - **[`pattern`]** — Vim search text (pattern + offset) compiled to a matcher
//! - **[`scanner`]** — one directional hop over the buffer, with wraparound
//! - **[`state`]** — the last pattern and direction, plus search history
//! - **[`resolver`]** — `[count]n` / `[count]N`, offsets, cancellation
//! - **[`report`]** — scan outcomes as caret moves and Vim messages
//! - **[`options`]** — `ignorecase`, `smartcase`, `wrapscan` and friends, `:set` parsing
//! - **[`jumplist`]** — positions search motions jumped from
//! - **[`word`]** — the word under the cursor for `*` and `#`
//! - **[`engine`]** — `SearchEngine`, the per-session bundle of the above
//! - **[`command`]** — command descriptors, motion handlers, and the dispatcher
//!
//! A host owns one [`SearchEngine`](engine::SearchEngine) per session and
//! feeds typed keys to a [`Dispatcher`](command::Dispatcher); the returned
//! [`Report`](report::Report) says where the caret goes and what to show.

pub mod buffer;
pub mod command;
pub mod engine;
pub mod jumplist;
pub mod options;
pub mod pattern;
pub mod position;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod state;
pub mod word;
