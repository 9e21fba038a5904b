//! Search options and the `:set` grammar.
//!
//! [`SearchOptions`] holds the option values that shape a search. They can
//! come from a config file (the struct is `serde`-deserializable, missing
//! keys take their defaults) and be changed at runtime through `:set`.
//!
//! # Supported syntax
//!
//! | Syntax           | Effect                        |
//! |------------------|-------------------------------|
//! | `:set option`    | Enable                        |
//! | `:set nooption`  | Disable                       |
//! | `:set option!`   | Toggle                        |
//! | `:set option?`   | Query current value           |
//! | `:set`           | Show changed options          |
//! | `:set all`       | Show all options              |
//!
//! # Options
//!
//! | Full name    | Abbrev | Default | Effect                                   |
//! |--------------|--------|---------|------------------------------------------|
//! | `ignorecase` | `ic`   | false   | Case-insensitive matching                |
//! | `smartcase`  | `scs`  | false   | Uppercase in the pattern re-enables case |
//! | `wrapscan`   | `ws`   | true    | Searches wrap around the buffer edges    |
//! | `hlsearch`   | `hls`  | true    | Highlight all matches of the last search |
//! | `incsearch`  | `is`   | true    | Preview matches while typing             |
//! | `magic`      | `magic`| true    | Vim regex; off means literal patterns    |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Full names and abbreviations, in display order.
const OPTIONS: [(&str, &str); 6] = [
    ("hlsearch", "hls"),
    ("ignorecase", "ic"),
    ("incsearch", "is"),
    ("magic", "magic"),
    ("smartcase", "scs"),
    ("wrapscan", "ws"),
];

// ---------------------------------------------------------------------------
// SearchOptions
// ---------------------------------------------------------------------------

/// Option values consulted by the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SearchOptions {
    pub ignorecase: bool,
    pub smartcase: bool,
    pub wrapscan: bool,
    pub hlsearch: bool,
    pub incsearch: bool,
    pub magic: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            ignorecase: false,
            smartcase: false,
            wrapscan: true,
            hlsearch: true,
            incsearch: true,
            magic: true,
        }
    }
}

impl SearchOptions {
    /// Current value of an option by full name or abbreviation.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<bool> {
        Some(match canonical(name)? {
            "ignorecase" => self.ignorecase,
            "smartcase" => self.smartcase,
            "wrapscan" => self.wrapscan,
            "hlsearch" => self.hlsearch,
            "incsearch" => self.incsearch,
            _ => self.magic,
        })
    }

    fn slot(&mut self, name: &str) -> Option<&mut bool> {
        Some(match canonical(name)? {
            "ignorecase" => &mut self.ignorecase,
            "smartcase" => &mut self.smartcase,
            "wrapscan" => &mut self.wrapscan,
            "hlsearch" => &mut self.hlsearch,
            "incsearch" => &mut self.incsearch,
            _ => &mut self.magic,
        })
    }

    /// Apply one `:set` directive.
    ///
    /// Returns the text to show on the message line, if any (queries and
    /// listings).
    ///
    /// # Errors
    ///
    /// Unknown option names and `option=value` assignments (all search
    /// options are boolean) are rejected without changing anything.
    pub fn apply(&mut self, directive: &SetDirective) -> Result<Option<String>, OptionError> {
        match directive {
            SetDirective::On(name) => self.set(name, |_| true),
            SetDirective::Off(name) => self.set(name, |_| false),
            SetDirective::Toggle(name) => self.set(name, |v| !v),
            SetDirective::Query(name) => {
                let value = self
                    .get(name)
                    .ok_or_else(|| OptionError::Unknown(name.clone()))?;
                let full = canonical(name).unwrap_or(name);
                Ok(Some(format_bool(full, value)))
            }
            SetDirective::Assign(name, value) => {
                if canonical(name).is_none() {
                    return Err(OptionError::Unknown(name.clone()));
                }
                Err(OptionError::InvalidArgument(format!("{name}={value}")))
            }
            SetDirective::ShowChanged => Ok(Some(self.listing(true))),
            SetDirective::ShowAll => Ok(Some(self.listing(false))),
        }
    }

    fn set(&mut self, name: &str, f: impl FnOnce(bool) -> bool) -> Result<Option<String>, OptionError> {
        let slot = self
            .slot(name)
            .ok_or_else(|| OptionError::Unknown(name.to_string()))?;
        *slot = f(*slot);
        Ok(None)
    }

    /// Options formatted for `:set` / `:set all`.
    fn listing(&self, changed_only: bool) -> String {
        let defaults = Self::default();
        OPTIONS
            .iter()
            .filter_map(|(full, _)| {
                let value = self.get(full)?;
                let changed = defaults.get(full) != Some(value);
                (!changed_only || changed).then(|| format_bool(full, value))
            })
            .collect::<Vec<_>>()
            .join("  ")
    }
}

/// The full name of an option given its full name or abbreviation.
#[must_use]
pub fn canonical(name: &str) -> Option<&'static str> {
    OPTIONS
        .iter()
        .find(|(full, abbrev)| name == *full || name == *abbrev)
        .map(|(full, _)| *full)
}

/// Returns `true` if `name` is a known boolean option (full name or abbreviation).
#[must_use]
pub fn is_bool_option(name: &str) -> bool {
    canonical(name).is_some()
}

// ---------------------------------------------------------------------------
// OptionError
// ---------------------------------------------------------------------------

/// A `:set` directive that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    Unknown(String),
    InvalidArgument(String),
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "E518: Unknown option: {name}"),
            Self::InvalidArgument(arg) => write!(f, "E474: Invalid argument: {arg}"),
        }
    }
}

impl std::error::Error for OptionError {}

// ---------------------------------------------------------------------------
// :set parsing
// ---------------------------------------------------------------------------

/// A parsed `:set` directive.
///
/// Produced by [`parse_set`] from the arguments to `:set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    /// `:set option` — enable a boolean option.
    On(String),

    /// `:set nooption` — disable a boolean option.
    Off(String),

    /// `:set option!` — toggle a boolean option.
    Toggle(String),

    /// `:set option?` — query the current value.
    Query(String),

    /// `:set option=value` — assign a value.
    Assign(String, String),

    /// `:set` with no arguments — show changed options.
    ShowChanged,

    /// `:set all` — show all options.
    ShowAll,
}

/// Parse the full `:set` arguments string into directives.
///
/// Multiple space-separated arguments are supported (e.g., `:set ic scs`).
/// An empty argument string produces [`SetDirective::ShowChanged`].
#[must_use]
pub fn parse_set(args: &str) -> Vec<SetDirective> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return vec![SetDirective::ShowChanged];
    }
    trimmed.split_whitespace().map(parse_set_arg).collect()
}

/// Parse a single `:set` argument into a directive.
#[must_use]
pub fn parse_set_arg(arg: &str) -> SetDirective {
    if arg == "all" {
        return SetDirective::ShowAll;
    }

    if let Some((name, value)) = arg.split_once('=') {
        return SetDirective::Assign(name.to_string(), value.to_string());
    }

    if let Some(name) = arg.strip_suffix('?') {
        return SetDirective::Query(name.to_string());
    }

    if let Some(name) = arg.strip_suffix('!') {
        return SetDirective::Toggle(name.to_string());
    }

    // `nooption` only if the remainder is a known option, so an unknown
    // `nofoo` is reported as `nofoo` rather than `foo`.
    if let Some(name) = arg.strip_prefix("no") {
        if is_bool_option(name) {
            return SetDirective::Off(name.to_string());
        }
    }

    SetDirective::On(arg.to_string())
}

/// Format a boolean option for display (`:set` output).
///
/// Returns `"name"` when true, `"noname"` when false.
#[must_use]
pub fn format_bool(name: &str, value: bool) -> String {
    if value {
        name.to_string()
    } else {
        format!("no{name}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_set_arg ─────────────────────────────────────────────────────

    #[test]
    fn parse_forms() {
        assert_eq!(parse_set_arg("ic"), SetDirective::On("ic".into()));
        assert_eq!(parse_set_arg("noic"), SetDirective::Off("ic".into()));
        assert_eq!(parse_set_arg("nowrapscan"), SetDirective::Off("wrapscan".into()));
        assert_eq!(parse_set_arg("scs!"), SetDirective::Toggle("scs".into()));
        assert_eq!(parse_set_arg("hls?"), SetDirective::Query("hls".into()));
        assert_eq!(parse_set_arg("all"), SetDirective::ShowAll);
        assert_eq!(
            parse_set_arg("ws=1"),
            SetDirective::Assign("ws".into(), "1".into())
        );
    }

    #[test]
    fn parse_unknown_no_prefix_kept_whole() {
        assert_eq!(parse_set_arg("nofoobar"), SetDirective::On("nofoobar".into()));
    }

    #[test]
    fn parse_nois_disables_incsearch() {
        assert_eq!(parse_set_arg("nois"), SetDirective::Off("is".into()));
    }

    #[test]
    fn parse_multiple_and_empty() {
        assert_eq!(parse_set(""), vec![SetDirective::ShowChanged]);
        assert_eq!(
            parse_set("ic scs nows"),
            vec![
                SetDirective::On("ic".into()),
                SetDirective::On("scs".into()),
                SetDirective::Off("ws".into()),
            ]
        );
    }

    // ── SearchOptions ────────────────────────────────────────────────────

    #[test]
    fn defaults() {
        let o = SearchOptions::default();
        assert!(!o.ignorecase && !o.smartcase);
        assert!(o.wrapscan && o.magic);
    }

    #[test]
    fn apply_on_off_toggle() {
        let mut o = SearchOptions::default();
        o.apply(&SetDirective::On("ic".into())).unwrap();
        assert!(o.ignorecase);
        o.apply(&SetDirective::Off("wrapscan".into())).unwrap();
        assert!(!o.wrapscan);
        o.apply(&SetDirective::Toggle("ws".into())).unwrap();
        assert!(o.wrapscan);
    }

    #[test]
    fn apply_query_uses_full_name() {
        let mut o = SearchOptions::default();
        assert_eq!(
            o.apply(&SetDirective::Query("ic".into())),
            Ok(Some("noignorecase".into()))
        );
    }

    #[test]
    fn apply_unknown_is_error() {
        let mut o = SearchOptions::default();
        let err = o.apply(&SetDirective::On("number".into())).unwrap_err();
        assert_eq!(err, OptionError::Unknown("number".into()));
        assert_eq!(err.to_string(), "E518: Unknown option: number");
        assert_eq!(o, SearchOptions::default());
    }

    #[test]
    fn apply_assign_is_invalid() {
        let mut o = SearchOptions::default();
        assert_eq!(
            o.apply(&SetDirective::Assign("ic".into(), "1".into())),
            Err(OptionError::InvalidArgument("ic=1".into()))
        );
    }

    #[test]
    fn listing_changed_and_all() {
        let mut o = SearchOptions::default();
        assert_eq!(o.apply(&SetDirective::ShowChanged), Ok(Some(String::new())));
        o.apply(&SetDirective::On("ic".into())).unwrap();
        o.apply(&SetDirective::Off("hls".into())).unwrap();
        assert_eq!(
            o.apply(&SetDirective::ShowChanged),
            Ok(Some("nohlsearch  ignorecase".into()))
        );
        let all = o.apply(&SetDirective::ShowAll).unwrap().unwrap();
        assert_eq!(
            all,
            "nohlsearch  ignorecase  incsearch  magic  nosmartcase  wrapscan"
        );
    }

    #[test]
    fn format_bool_on_off() {
        assert_eq!(format_bool("wrapscan", true), "wrapscan");
        assert_eq!(format_bool("wrapscan", false), "nowrapscan");
    }
}
