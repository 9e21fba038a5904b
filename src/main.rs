// SPDX-License-Identifier: MIT
//
// n-search — replay Vim search motions over a file.
//
// This binary is a reference host for the n-engine crate:
//
//   n-engine → patterns, scanning, repeats, reports, the search session
//   n-search → file loading, config, and a line-oriented command loop
//
// Usage:
//
//   n-search [-c CONFIG] FILE [COMMAND...]
//
// Commands come from the arguments, or from stdin (one per line) when none
// are given. After each command the caret is printed as `line:col` followed
// by the message Vim would show:
//
//   $ n-search notes.txt /todo n 2N
//   4:7  /todo
//   9:1  /todo
//   1:3  search hit TOP, continuing at BOTTOM
//
// Ctrl-C interrupts a long-running command (`999999999n` over a huge file)
// and leaves the caret where it was.
//
// `RUST_LOG=n_engine=debug` traces what each search did.

mod config;
mod session;
mod signal;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};

use n_engine::buffer::TextBuffer;

use crate::config::Config;
use crate::session::Session;

const USAGE: &str = "usage: n-search [-c CONFIG] FILE [COMMAND...]";

// ─── Arguments ──────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    file: PathBuf,
    commands: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut config = None;
    let mut file = None;
    let mut commands = Vec::new();

    while let Some(arg) = args.next() {
        if file.is_some() {
            commands.push(arg);
            continue;
        }
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args.next().context("-c needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => bail!("{USAGE}"),
            _ => file = Some(PathBuf::from(arg)),
        }
    }

    let Some(file) = file else {
        bail!("{USAGE}");
    };
    Ok(Args {
        config,
        file,
        commands,
    })
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = Config::load(args.config.as_deref())?;
    let buffer = TextBuffer::from_file(&args.file)
        .with_context(|| format!("cannot open {}", args.file.display()))?;

    let mut session = Session::new(buffer, config.search, &signal::INTERRUPTED);
    let mut out = io::stdout().lock();

    if args.commands.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line.context("reading commands from stdin")?;
            if line.trim().is_empty() {
                continue;
            }
            writeln!(out, "{}", signal::while_running(|| session.execute(&line)))?;
        }
    } else {
        for command in &args.commands {
            writeln!(out, "{}", signal::while_running(|| session.execute(command)))?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    signal::install();

    if let Err(e) = run() {
        eprintln!("n-search: {e:#}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn file_and_commands() {
        assert_eq!(
            args(&["notes.txt", "/foo", "3n"]).unwrap(),
            Args {
                config: None,
                file: PathBuf::from("notes.txt"),
                commands: vec!["/foo".into(), "3n".into()],
            }
        );
    }

    #[test]
    fn config_flag() {
        let parsed = args(&["-c", "my.toml", "notes.txt"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("my.toml")));
        assert!(parsed.commands.is_empty());
    }

    #[test]
    fn flags_after_file_are_commands() {
        let parsed = args(&["notes.txt", "-c"]).unwrap();
        assert_eq!(parsed.commands, vec!["-c".to_string()]);
    }

    #[test]
    fn missing_file_or_config_path() {
        assert!(args(&[]).is_err());
        assert!(args(&["-c"]).is_err());
        assert!(args(&["-h"]).is_err());
    }
}
