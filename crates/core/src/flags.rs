//! Command-line flag parsing for stage workers
//!
//! Flags are generated from the stage schema, so the syntax follows the
//! single-dash convention pipeline workers are invoked with:
//!
//! - `-name=value` / `--name=value`
//! - `-name value` (string flags only)
//! - `-name` (boolean flags only, sets true)
//!
//! Parsing stops at the first non-flag argument, at a lone `-`, or after a
//! `--` terminator. Everything after that is positional.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::{Error, Result};

/// Flag parsing failure, surfaced verbatim to the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// Flag name not registered
    #[error("flag provided but not defined: -{0}")]
    Undefined(String),

    /// `-h` / `-help` given without such a flag being registered
    #[error("flag: help requested")]
    HelpRequested,

    /// Argument looks like a flag but has no usable name
    #[error("bad flag syntax: {0}")]
    BadSyntax(String),

    /// String flag given as the last argument without a value
    #[error("flag needs an argument: -{0}")]
    MissingArgument(String),

    /// Boolean flag value could not be parsed
    #[error("invalid boolean value {value:?} for -{name}: parse error")]
    InvalidBoolean {
        /// Flag name
        name: String,
        /// Rejected value
        value: String,
    },

    /// Same flag name registered twice
    #[error("flag redefined: {0}")]
    Redefined(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FlagValue {
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone)]
struct Flag {
    name: String,
    value: FlagValue,
}

/// A set of named flags plus the positional arguments left after parsing
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
    index: HashMap<String, usize>,
    positional: Vec<String>,
}

impl FlagSet {
    /// Create an empty flag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a string flag
    pub fn define_string(&mut self, name: &str, default: &str) -> std::result::Result<(), FlagError> {
        self.define(name, FlagValue::String(default.to_string()))
    }

    /// Register a boolean flag
    pub fn define_bool(&mut self, name: &str, default: bool) -> std::result::Result<(), FlagError> {
        self.define(name, FlagValue::Bool(default))
    }

    fn define(&mut self, name: &str, value: FlagValue) -> std::result::Result<(), FlagError> {
        if self.index.contains_key(name) {
            return Err(FlagError::Redefined(name.to_string()));
        }
        self.index.insert(name.to_string(), self.flags.len());
        self.flags.push(Flag {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    /// Parse arguments (without the program name).
    ///
    /// Later occurrences of a flag overwrite earlier ones.
    pub fn parse<I, S>(&mut self, args: I) -> std::result::Result<(), FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into).collect::<Vec<String>>().into_iter();

        while let Some(arg) = args.next() {
            if arg.len() < 2 || !arg.starts_with('-') {
                self.positional.push(arg);
                break;
            }
            if arg == "--" {
                break;
            }

            let stripped = arg.strip_prefix("--").unwrap_or(&arg[1..]);
            if stripped.is_empty() || stripped.starts_with('-') || stripped.starts_with('=') {
                return Err(FlagError::BadSyntax(arg));
            }

            let (name, inline_value) = match stripped.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (stripped, None),
            };

            let slot = match self.index.get(name) {
                Some(&slot) => slot,
                None if name == "help" || name == "h" => return Err(FlagError::HelpRequested),
                None => return Err(FlagError::Undefined(name.to_string())),
            };

            let value = match (&self.flags[slot].value, inline_value) {
                (FlagValue::Bool(_), Some(raw)) => FlagValue::Bool(parse_bool(&raw).ok_or_else(|| {
                    FlagError::InvalidBoolean {
                        name: name.to_string(),
                        value: raw.clone(),
                    }
                })?),
                (FlagValue::Bool(_), None) => FlagValue::Bool(true),
                (FlagValue::String(_), Some(raw)) => FlagValue::String(raw),
                (FlagValue::String(_), None) => match args.next() {
                    Some(next) => FlagValue::String(next),
                    None => return Err(FlagError::MissingArgument(name.to_string())),
                },
            };
            self.flags[slot].value = value;
        }

        self.positional.extend(args);
        Ok(())
    }

    /// Value of a string flag
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.lookup(name)? {
            FlagValue::String(s) => Some(s),
            FlagValue::Bool(_) => None,
        }
    }

    /// Value of a boolean flag
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.lookup(name)? {
            FlagValue::Bool(b) => Some(*b),
            FlagValue::String(_) => None,
        }
    }

    fn lookup(&self, name: &str) -> Option<&FlagValue> {
        self.index.get(name).map(|&slot| &self.flags[slot].value)
    }

    /// Positional argument `i`, if present
    pub fn arg(&self, i: usize) -> Option<&str> {
        self.positional.get(i).map(String::as_str)
    }

    /// All positional arguments
    pub fn args(&self) -> &[String] {
        &self.positional
    }

    /// Registered flag names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(|f| f.name.as_str())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

static PROCESS_ARGS_TAKEN: AtomicBool = AtomicBool::new(false);

/// Arguments for a single resolution pass
///
/// A context can be parsed exactly once. Contexts over the real process
/// arguments can be created once per process.
#[derive(Debug, Clone)]
pub struct ParseContext {
    args: Vec<String>,
    consumed: bool,
}

impl ParseContext {
    /// Context over explicit arguments (without the program name)
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            consumed: false,
        }
    }

    /// Context over the process arguments, skipping the program name
    pub fn from_process_args() -> Result<Self> {
        if PROCESS_ARGS_TAKEN.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyParsed);
        }
        Ok(Self::new(std::env::args().skip(1)))
    }

    /// Whether the arguments were already handed out for parsing
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Arguments held by this context
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Hand out the arguments for the single permitted pass
    pub(crate) fn take_args(&mut self) -> Result<Vec<String>> {
        if self.consumed {
            return Err(Error::AlreadyParsed);
        }
        self.consumed = true;
        Ok(std::mem::take(&mut self.args))
    }
}
