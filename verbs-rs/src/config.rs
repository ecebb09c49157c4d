//! `.verbsrc` configuration file parser.
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set <name>=<value>` or `/set <name> <value>` | seed a variable |
//! | `/set blocking_wait=on` | select the blocking `wait` mode |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | skipped |
//!
//! Values are read the way script words are: numbers, booleans, `null` and
//! JSON lists are parsed, quoted values stay strings.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::context::ExecutionContext;
use crate::delay::DelayMode;
use crate::error::VerbError;
use crate::script::Value;

/// Reserved setting that selects [`DelayMode::Blocking`].
pub const BLOCKING_WAIT: &str = "blocking_wait";

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Settings read from an rc file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Config {
    pub delay_mode: DelayMode,
    /// Variables to seed, in file order.
    pub vars: Vec<(String, Value)>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Unknown directives are skipped.  Returns the config and a list of
    /// any errors on recognised lines; a bad line never stops the load.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected a /command, found {line:?}"),
                });
                continue;
            };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));

            match cmd {
                "set" => {
                    let tokens = split_args(args_str.trim());
                    if let Err(message) = config.apply_set(&tokens) {
                        errors.push(ConfigError { line: lineno, message });
                    }
                }
                other => debug!(line = lineno, command = other, "config: skipping directive"),
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// A fresh execution context with this config's delay mode and variables.
    pub fn build_context(&self) -> Result<ExecutionContext, VerbError> {
        let mut ctx = ExecutionContext::with_delay_mode(self.delay_mode);
        for (name, value) in &self.vars {
            ctx.vars_mut().assign(name, value.clone())?;
        }
        Ok(ctx)
    }

    fn apply_set(&mut self, tokens: &[Arg]) -> Result<(), String> {
        let Some(first) = tokens.first() else {
            return Err("/set: requires an argument".into());
        };

        let (name, value) = if let Some((name, value)) = first.text.split_once('=') {
            let value = Arg { text: value.to_owned(), quoted: first.quoted };
            (name.trim().to_owned(), value.to_value())
        } else if tokens.len() == 2 {
            (first.text.clone(), tokens[1].to_value())
        } else if tokens.len() > 2 {
            let joined: Vec<&str> = tokens[1..].iter().map(|t| t.text.as_str()).collect();
            (first.text.clone(), Value::Str(joined.join(" ")))
        } else {
            return Err(format!("/set: missing value for '{}'", first.text));
        };

        if name.trim_start_matches('$').is_empty() {
            return Err("/set: variable name cannot be empty".into());
        }

        if name == BLOCKING_WAIT {
            self.delay_mode = if parse_flag(&value)? {
                DelayMode::Blocking
            } else {
                DelayMode::NonBlocking
            };
            return Ok(());
        }

        self.vars.push((name, value));
        Ok(())
    }
}

fn parse_flag(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(0) => Ok(false),
        Value::Int(1) => Ok(true),
        Value::Str(s) => match s.to_ascii_lowercase().as_str() {
            "on" | "yes" => Ok(true),
            "off" | "no" => Ok(false),
            _ => Err(format!("/set: {BLOCKING_WAIT} expects on/off, got '{s}'")),
        },
        other => Err(format!("/set: {BLOCKING_WAIT} expects on/off, got '{other}'")),
    }
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Arg {
    text: String,
    quoted: bool,
}

impl Arg {
    fn to_value(&self) -> Value {
        if self.quoted {
            Value::Str(self.text.clone())
        } else {
            Value::parse_literal(&self.text)
        }
    }
}

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
fn split_args(s: &str) -> Vec<Arg> {
    let mut args = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if !in_quotes => {
                in_quotes = true;
                quoted = true;
            }
            '"' if in_quotes => in_quotes = false,
            '\\' if in_quotes => cur.extend(chars.next()),
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() || quoted {
                    args.push(Arg { text: std::mem::take(&mut cur), quoted });
                    quoted = false;
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() || quoted {
        args.push(Arg { text: cur, quoted });
    }
    args
}

// ── Tests ─────────────────────────────────────────────────────────────────────
