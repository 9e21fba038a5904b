//! Pattern compiler — Vim search text to a matchable [`Pattern`].
//!
//! The text typed after `/` or `?` is split into two parts at the first
//! unescaped delimiter: the pattern proper and an optional search offset.
//!
//! ```text
//! /foo\/bar/e+1
//!  ^^^^^^^^^ ^^^
//!  pattern   offset (end of match, one char right)
//! ```
//!
//! # Offsets
//!
//! | Suffix     | Meaning                                   |
//! |------------|-------------------------------------------|
//! | `[+-]n`    | `n` lines down/up, column 0 (linewise)    |
//! | `e[+-n]`   | `n` chars right/left of the match's end    |
//! | `s[+-n]`   | `n` chars right/left of the match's start  |
//! | `b[+-n]`   | same as `s`                               |
//!
//! A bare sign means 1 and bare digits mean downward: `/foo/+` and
//! `/foo/1` both land one line below the match.
//!
//! # Regex dialect
//!
//! In [`PatternMode::Magic`] (Vim's default `magic` setting) the pattern is
//! translated into `regex` syntax. Supported items:
//!
//! | Vim                  | Meaning                                  |
//! |----------------------|------------------------------------------|
//! | `.` `*` `[...]`      | any char, repetition, collection         |
//! | `^` `$`              | anchors, only at the pattern's edges      |
//! | `\<` `\>`            | word boundaries                          |
//! | `\(` `\)` `\%(`      | capturing / non-capturing groups         |
//! | `\|` `\+` `\=` `\?`  | alternation and quantifiers              |
//! | `\{n,m}` `\{-n,m}`   | counted repetition (greedy / lazy)       |
//! | `\d \w \s \a \l \u \x \o \h` | ASCII classes (upper case negates) |
//! | `\v` `\m` `\V`       | very magic / magic / very nomagic        |
//! | `\c` `\C`            | ignore / match case, overriding options  |
//!
//! Patterns match within a single line; `\n` is accepted but never matches.

use std::fmt;

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::options::SearchOptions;
use crate::scanner::SearchDirection;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a search pattern failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Nothing to search for.
    Empty,
    /// The pattern ends with a lone `\`.
    TrailingBackslash,
    /// A Vim pattern item this engine does not implement.
    Unsupported(String),
    /// The text after the delimiter is not a valid search offset.
    BadOffset(String),
    /// The translated pattern was rejected by the regex engine.
    Regex(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("E35: No previous regular expression"),
            Self::TrailingBackslash => f.write_str("E476: Trailing backslash in pattern"),
            Self::Unsupported(item) => write!(f, "E867: Unsupported pattern item: {item}"),
            Self::BadOffset(text) => write!(f, "E488: Invalid search offset: {text}"),
            Self::Regex(msg) => write!(f, "E383: Invalid search string: {msg}"),
        }
    }
}

impl std::error::Error for PatternError {}

// ---------------------------------------------------------------------------
// Offset
// ---------------------------------------------------------------------------

/// Where the caret lands relative to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Offset {
    /// On the first char of the match.
    #[default]
    None,
    /// Column 0 of the line `n` lines below (negative: above) the match.
    Line(isize),
    /// `n` chars from the first char of the match.
    Start(isize),
    /// `n` chars from the last char of the match.
    End(isize),
}

impl Offset {
    /// Parse the text following the pattern delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::BadOffset`] for anything that is not a
    /// (possibly empty) Vim search offset.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let bad = || PatternError::BadOffset(text.to_string());

        let (kind, rest) = match text.chars().next() {
            Some('e') => ('e', &text[1..]),
            Some('s' | 'b') => ('s', &text[1..]),
            _ => ('l', text),
        };

        let (sign, digits) = match rest.chars().next() {
            Some('+') => (1, &rest[1..]),
            Some('-') => (-1, &rest[1..]),
            _ => (1, rest),
        };

        let magnitude: isize = if digits.is_empty() {
            // `e` and `s` alone mean "no shift"; a lone sign means one.
            isize::from(rest.len() != digits.len())
        } else if digits.bytes().all(|b| b.is_ascii_digit()) {
            digits.parse().map_err(|_| bad())?
        } else {
            return Err(bad());
        };
        let n = sign * magnitude;

        Ok(match kind {
            'e' => Self::End(n),
            's' => Self::Start(n),
            _ if text.is_empty() => Self::None,
            _ => Self::Line(n),
        })
    }

    /// Line offsets turn the search into a linewise motion.
    #[inline]
    #[must_use]
    pub const fn is_linewise(self) -> bool {
        matches!(self, Self::Line(_))
    }

    /// End offsets turn the search into an inclusive motion.
    #[inline]
    #[must_use]
    pub const fn is_inclusive(self) -> bool {
        matches!(self, Self::End(_))
    }

    /// Character shift applied to the match, for `s` and `e` offsets.
    #[inline]
    #[must_use]
    pub const fn char_shift(self) -> isize {
        match self {
            Self::Start(n) | Self::End(n) => n,
            Self::None | Self::Line(_) => 0,
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::None => Ok(()),
            Self::Line(n) => write!(f, "{n:+}"),
            Self::Start(0) => f.write_str("s"),
            Self::Start(n) => write!(f, "s{n:+}"),
            Self::End(0) => f.write_str("e"),
            Self::End(n) => write!(f, "e{n:+}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// How the pattern text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternMode {
    /// The whole text is matched verbatim.
    Literal,
    /// Vim regex with `magic` semantics.
    #[default]
    Magic,
}

/// Compilation settings, usually derived from [`SearchOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatternFlags {
    pub mode: PatternMode,
    pub ignorecase: bool,
    pub smartcase: bool,
    /// Character separating pattern and offset (`/` or `?`). `None` means
    /// the whole text is the pattern.
    pub delimiter: Option<char>,
}

impl PatternFlags {
    /// Flags for a search typed after `/` (forward) or `?` (backward).
    #[must_use]
    pub const fn for_search(options: &SearchOptions, direction: SearchDirection) -> Self {
        Self {
            mode: if options.magic {
                PatternMode::Magic
            } else {
                PatternMode::Literal
            },
            ignorecase: options.ignorecase,
            smartcase: options.smartcase,
            delimiter: Some(direction.delimiter()),
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern
// ---------------------------------------------------------------------------

/// A compiled search pattern. Immutable once built.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    offset: Offset,
    mode: PatternMode,
    ignore_case: bool,
    regex: Regex,
}

impl Pattern {
    /// The pattern text as typed, without offset or delimiter escapes.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    #[must_use]
    pub const fn offset(&self) -> Offset {
        self.offset
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> PatternMode {
        self.mode
    }

    /// Whether matching ignores case, after `\c`, `ignorecase` and
    /// `smartcase` were resolved.
    #[inline]
    #[must_use]
    pub const fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// The compiled single-line matcher.
    #[inline]
    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The same pattern with a different offset (`//e` after `/foo`).
    #[must_use]
    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.offset == other.offset
            && self.mode == other.mode
            && self.ignore_case == other.ignore_case
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)?;
        if self.offset != Offset::None {
            write!(f, "/{}", self.offset)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile search text (pattern plus optional offset) into a [`Pattern`].
///
/// # Errors
///
/// Returns [`PatternError`] for an empty pattern, a malformed offset, an
/// unsupported Vim item, or a regex the engine rejects.
pub fn compile_pattern(text: &str, flags: PatternFlags) -> Result<Pattern, PatternError> {
    let (source, offset_text) = split_offset(text, flags.delimiter);
    let offset = offset_text.map_or(Ok(Offset::None), Offset::parse)?;
    build(source, offset, flags)
}

/// Split `text` at the first unescaped `delimiter`.
///
/// Returns the pattern (with `\<delimiter>` unescaped) and the offset text
/// when a delimiter was present. An empty pattern means "reuse the last one".
#[must_use]
pub fn split_offset(text: &str, delimiter: Option<char>) -> (String, Option<&str>) {
    let mut pattern = String::with_capacity(text.len());
    let mut chars = text.char_indices();

    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, next)) if Some(next) == delimiter => pattern.push(next),
                Some((_, next)) => {
                    pattern.push('\\');
                    pattern.push(next);
                }
                None => pattern.push('\\'),
            }
        } else if Some(c) == delimiter {
            return (pattern, Some(&text[i + c.len_utf8()..]));
        } else {
            pattern.push(c);
        }
    }

    (pattern, None)
}

/// Compile an already-split pattern.
pub(crate) fn build(
    source: String,
    offset: Offset,
    flags: PatternFlags,
) -> Result<Pattern, PatternError> {
    if source.is_empty() {
        return Err(PatternError::Empty);
    }

    // `\c` and `\C` are honoured in both modes; everything else in a
    // literal pattern is matched as written.
    let (body, forced) = strip_case_items(&source);
    let (translated, upper) = match flags.mode {
        PatternMode::Literal => (regex::escape(&body), body.chars().any(char::is_uppercase)),
        PatternMode::Magic => (translate(&body)?, has_uppercase(&body)),
    };
    let ignore_case = forced.unwrap_or(flags.ignorecase && !(flags.smartcase && upper));

    let regex = RegexBuilder::new(&translated)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| PatternError::Regex(e.to_string()))?;

    debug!("compiled {source:?} as {translated:?} (ignore_case={ignore_case}, offset={offset:?})");

    Ok(Pattern {
        source,
        offset,
        mode: flags.mode,
        ignore_case,
        regex,
    })
}

/// Escape `word` so it matches literally in a magic pattern, optionally
/// wrapped in `\<` `\>`. Used by `*` and `#`.
#[must_use]
pub fn word_pattern(word: &str, whole_word: bool) -> String {
    let mut out = String::with_capacity(word.len() + 4);
    if whole_word {
        out.push_str("\\<");
    }
    for c in word.chars() {
        if matches!(c, '\\' | '.' | '*' | '$' | '^' | '~' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    if whole_word {
        out.push_str("\\>");
    }
    out
}

/// Remove `\c` / `\C` from the pattern. `\c` wins when both are present.
fn strip_case_items(source: &str) -> (String, Option<bool>) {
    let mut body = String::with_capacity(source.len());
    let mut ignore = false;
    let mut match_case = false;
    let mut chars = source.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            body.push(c);
            continue;
        }
        match chars.next() {
            Some('c') => ignore = true,
            Some('C') => match_case = true,
            Some(next) => {
                body.push('\\');
                body.push(next);
            }
            None => body.push('\\'),
        }
    }

    let forced = if ignore {
        Some(true)
    } else if match_case {
        Some(false)
    } else {
        None
    };
    (body, forced)
}

/// True if the pattern contains an uppercase literal. Escaped characters
/// (`\S`, `\U`) are pattern items, not literals, and don't count.
fn has_uppercase(body: &str) -> bool {
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c.is_uppercase() {
            return true;
        }
    }
    false
}

fn translate(body: &str) -> Result<String, PatternError> {
    let mut t = Translator {
        chars: body.chars().collect(),
        pos: 0,
        out: String::with_capacity(body.len() * 2),
        magic: Magic::Normal,
        at_start: true,
    };
    t.run()?;
    Ok(t.out)
}

// ---------------------------------------------------------------------------
// Vim regex → regex crate translation
// ---------------------------------------------------------------------------

/// Vim's `magic` levels.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Magic {
    /// `\v` — all ASCII punctuation is special.
    Very,
    /// `\m` — the default.
    Normal,
    /// `\V` — only backslash sequences are special.
    VeryNo,
}

struct Translator {
    chars: Vec<char>,
    pos: usize,
    out: String,
    magic: Magic,
    /// At the start of a branch: `^` anchors and `*` is literal.
    at_start: bool,
}

impl Translator {
    fn run(&mut self) -> Result<(), PatternError> {
        while let Some(c) = self.bump() {
            if c == '\\' {
                let Some(e) = self.bump() else {
                    return Err(PatternError::TrailingBackslash);
                };
                self.escaped(e)?;
            } else {
                self.plain(c)?;
            }
        }
        Ok(())
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        Some(c)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Emit an atom (anything a quantifier can follow).
    fn atom(&mut self, s: &str) {
        self.out.push_str(s);
        self.at_start = false;
    }

    /// Emit the start of a new branch (`(`, `|`).
    fn branch(&mut self, s: &str) {
        self.out.push_str(s);
        self.at_start = true;
    }

    fn literal(&mut self, c: char) {
        let mut buf = [0u8; 4];
        let escaped = regex::escape(c.encode_utf8(&mut buf));
        self.atom(&escaped);
    }

    /// `$` is an anchor only before the end of the pattern or a branch.
    fn at_branch_end(&self) -> bool {
        let rest = &self.chars[self.pos..];
        match self.magic {
            Magic::Very => matches!(rest.first(), None | Some('|' | ')')),
            Magic::Normal | Magic::VeryNo => {
                rest.is_empty() || matches!(rest, ['\\', '|' | ')', ..])
            }
        }
    }

    fn plain(&mut self, c: char) -> Result<(), PatternError> {
        if self.magic == Magic::VeryNo {
            self.literal(c);
            return Ok(());
        }

        match c {
            '^' if self.at_start => self.out.push('^'),
            '$' if self.at_branch_end() => self.atom("$"),
            '.' => self.atom("."),
            '*' if self.at_start => self.literal('*'),
            '*' => self.atom("*"),
            '[' => self.collection(),
            _ if self.magic == Magic::Very => self.very_magic(c)?,
            _ => self.literal(c),
        }
        Ok(())
    }

    fn very_magic(&mut self, c: char) -> Result<(), PatternError> {
        match c {
            '(' => self.branch("("),
            ')' => self.atom(")"),
            '|' => self.branch("|"),
            '+' if !self.at_start => self.atom("+"),
            '?' | '=' if !self.at_start => self.atom("?"),
            '{' => self.brace()?,
            '<' | '>' => self.atom(r"\b"),
            '%' if self.peek() == Some('(') => {
                self.pos += 1;
                self.branch("(?:");
            }
            '@' | '&' | '%' => return Err(PatternError::Unsupported(c.to_string())),
            _ => self.literal(c),
        }
        Ok(())
    }

    fn escaped(&mut self, e: char) -> Result<(), PatternError> {
        // Mode switches and character classes mean the same at every level.
        match e {
            'v' => self.magic = Magic::Very,
            'm' => self.magic = Magic::Normal,
            'V' => self.magic = Magic::VeryNo,
            'M' => return Err(PatternError::Unsupported("\\M".into())),
            'n' => self.atom(r"\n"),
            't' => self.atom(r"\t"),
            'e' => self.atom(r"\x1b"),
            'r' => self.atom(r"\r"),
            _ if e.is_ascii_alphabetic() => {
                let class = class_for(e)
                    .ok_or_else(|| PatternError::Unsupported(format!("\\{e}")))?;
                self.atom(class);
            }
            _ if self.magic == Magic::Very => self.literal(e),
            _ => self.escaped_magic(e)?,
        }
        Ok(())
    }

    /// Backslash items of `\m` and `\V`.
    fn escaped_magic(&mut self, e: char) -> Result<(), PatternError> {
        let nomagic = self.magic == Magic::VeryNo;
        match e {
            '(' => self.branch("("),
            ')' => self.atom(")"),
            '|' => self.branch("|"),
            '+' => self.atom("+"),
            '=' | '?' => self.atom("?"),
            '{' => self.brace()?,
            '<' | '>' => self.atom(r"\b"),
            '%' if self.peek() == Some('(') => {
                self.pos += 1;
                self.branch("(?:");
            }
            '%' | '@' | '&' | 'z' => {
                return Err(PatternError::Unsupported(format!("\\{e}")));
            }
            '.' if nomagic => self.atom("."),
            '*' if nomagic => self.atom("*"),
            '[' if nomagic => self.collection(),
            '^' if nomagic && self.at_start => self.out.push('^'),
            '$' if nomagic && self.at_branch_end() => self.atom("$"),
            _ => self.literal(e),
        }
        Ok(())
    }

    /// `\{n,m}` after the `{`. Closes with `}` or `\}`.
    fn brace(&mut self) -> Result<(), PatternError> {
        let start = self.pos;
        let mut inner = String::new();
        loop {
            match self.bump() {
                Some('}') => break,
                Some('\\') if self.peek() == Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(c) if c.is_ascii_digit() || c == ',' || c == '-' => inner.push(c),
                _ => {
                    self.pos = start;
                    return Err(PatternError::Unsupported("\\{".into()));
                }
            }
        }

        let lazy = inner.starts_with('-');
        let range = inner.trim_start_matches('-');
        if range.contains('-') {
            return Err(PatternError::Unsupported(format!("\\{{{inner}}}")));
        }

        let quantifier = match range.split_once(',') {
            None if range.is_empty() => "*".to_string(),
            None => format!("{{{range}}}"),
            Some(("", "")) => "*".to_string(),
            Some(("", max)) => format!("{{0,{max}}}"),
            Some((min, max)) => format!("{{{min},{max}}}"),
        };
        self.atom(&quantifier);
        if lazy {
            self.out.push('?');
        }
        Ok(())
    }

    /// `[...]` after the `[`. An unterminated `[` is a literal bracket.
    fn collection(&mut self) {
        let Some(end) = self.collection_end() else {
            self.literal('[');
            return;
        };

        let mut class = String::from("[");
        let mut i = self.pos;
        if self.chars[i] == '^' {
            class.push('^');
            i += 1;
        }
        if self.chars[i] == ']' {
            class.push_str(r"\]");
            i += 1;
        }

        while i < end {
            let c = self.chars[i];
            match c {
                '[' if self.chars.get(i + 1) == Some(&':') => {
                    // POSIX class: copy through `:]` verbatim.
                    let close = (i + 2..end)
                        .find(|&j| self.chars[j] == ':' && self.chars.get(j + 1) == Some(&']'))
                        .unwrap_or(end - 1);
                    class.extend(&self.chars[i..=close + 1]);
                    i = close + 2;
                    continue;
                }
                '\\' => {
                    i += 1;
                    match self.chars.get(i) {
                        Some('e') => class.push_str(r"\x1b"),
                        Some('t') => class.push_str(r"\t"),
                        Some('n') => class.push_str(r"\n"),
                        Some(&x @ ('\\' | ']' | '^' | '-')) => {
                            class.push('\\');
                            class.push(x);
                        }
                        Some(&x) => {
                            class.push_str(r"\\");
                            push_class_char(&mut class, x);
                        }
                        None => class.push_str(r"\\"),
                    }
                }
                _ => push_class_char(&mut class, c),
            }
            i += 1;
        }

        class.push(']');
        self.pos = end + 1;
        self.atom(&class);
    }

    /// Index of the `]` closing the collection starting at `self.pos`.
    fn collection_end(&self) -> Option<usize> {
        let mut i = self.pos;
        if self.chars.get(i) == Some(&'^') {
            i += 1;
        }
        if self.chars.get(i) == Some(&']') {
            i += 1;
        }
        while let Some(&c) = self.chars.get(i) {
            match c {
                ']' => return Some(i),
                '\\' => i += 2,
                '[' if self.chars.get(i + 1) == Some(&':') => {
                    i = (i + 2..self.chars.len())
                        .find(|&j| self.chars[j] == ':' && self.chars.get(j + 1) == Some(&']'))
                        .map_or(i + 1, |j| j + 2);
                }
                _ => i += 1,
            }
        }
        None
    }
}

/// Push a literal char inside a `regex` class, escaping set operators.
fn push_class_char(class: &mut String, c: char) {
    if matches!(c, '[' | '&' | '~') {
        class.push('\\');
    }
    class.push(c);
}

/// Vim's ASCII character classes. Upper case negates.
const fn class_for(c: char) -> Option<&'static str> {
    Some(match c {
        'd' => "[0-9]",
        'D' => "[^0-9]",
        'w' => "[0-9A-Za-z_]",
        'W' => "[^0-9A-Za-z_]",
        's' => "[ \\t]",
        'S' => "[^ \\t]",
        'a' => "[A-Za-z]",
        'A' => "[^A-Za-z]",
        'l' => "[a-z]",
        'L' => "[^a-z]",
        'u' => "[A-Z]",
        'U' => "[^A-Z]",
        'x' => "[0-9A-Fa-f]",
        'X' => "[^0-9A-Fa-f]",
        'o' => "[0-7]",
        'O' => "[^0-7]",
        'h' => "[A-Za-z_]",
        'H' => "[^A-Za-z_]",
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
