// SPDX-License-Identifier: MIT
//
// Configuration file loading.
//
// The file is TOML with a single `[search]` table holding the option
// defaults a session starts with:
//
//   [search]
//   ignorecase = true
//   smartcase = true
//   wrapscan = false
//
// Missing keys keep their Vim defaults. `-c PATH` names the file
// explicitly; otherwise `<config dir>/n-search/config.toml` is read when it
// exists, and built-in defaults are used when it doesn't.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use n_engine::options::SearchOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchOptions,
}

impl Config {
    /// Parse a config file's contents.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `explicit`, or from the default location if present.
    ///
    /// An explicitly named file must exist; the default one is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!("loaded {}: {:?}", path.display(), config.search);
        Ok(config)
    }
}

/// `<config dir>/n-search/config.toml`.
fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("n-search").join("config.toml"))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
