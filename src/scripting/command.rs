//! Script commands
//!
//! Every script line parses into one [`Command`]. The set is closed; the
//! name table below is the only place command names are spelled.

use crate::common::{Error, Result};

/// A parsed script command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `call_tool <tool> [arg...]`
    CallTool { name: String, args: Vec<String> },
    /// `set_var <name> <path>`
    SetVar { name: String, path: String },
    /// `input_var <name> [prompt...]`
    InputVar { name: String, prompt: Option<String> },
    /// `assert_contains <needle>` or `assert_contains <haystack> <needle>`
    AssertContains { a: String, b: Option<String> },
    /// `assert_equals <expected>` or `assert_equals <a> <b>`
    AssertEquals { a: String, b: Option<String> },
    /// `assert_number <value>`
    AssertNumber { value: String },
    /// `assert_gt <a> <b>`
    AssertGreaterThan { a: String, b: String },
    /// `assert_string_length <value...> <min> <max>`
    AssertStringLength { value: String, min: usize, max: usize },
    /// `timeout <ms> <command...>`
    Timeout { ms: u64, inner: Box<Command> },
    /// `expect_error <command...>`
    ExpectError { inner: Box<Command> },
}

/// Command names, resolved through [`COMMANDS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    CallTool,
    SetVar,
    InputVar,
    AssertContains,
    AssertEquals,
    AssertNumber,
    AssertGreaterThan,
    AssertStringLength,
    Timeout,
    ExpectError,
}

/// Dispatch table
const COMMANDS: &[(&str, CommandKind)] = &[
    ("call_tool", CommandKind::CallTool),
    ("set_var", CommandKind::SetVar),
    ("input_var", CommandKind::InputVar),
    ("assert_contains", CommandKind::AssertContains),
    ("assert_equals", CommandKind::AssertEquals),
    ("assert_number", CommandKind::AssertNumber),
    ("assert_gt", CommandKind::AssertGreaterThan),
    ("assert_string_length", CommandKind::AssertStringLength),
    ("timeout", CommandKind::Timeout),
    ("expect_error", CommandKind::ExpectError),
];

impl CommandKind {
    pub fn from_name(name: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }

    pub fn name(self) -> &'static str {
        COMMANDS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(n, _)| *n)
            .unwrap_or("unknown")
    }
}

impl Command {
    /// Build a command from a tokenized line
    pub fn parse(tokens: &[String]) -> Result<Self> {
        let (first, args) = tokens
            .split_first()
            .ok_or_else(|| Error::Dispatch("empty command".to_string()))?;

        let kind = CommandKind::from_name(first)
            .ok_or_else(|| Error::Dispatch(format!("unknown command: {}", first)))?;
        let name = kind.name();

        match kind {
            CommandKind::CallTool => {
                let (tool, rest) = args
                    .split_first()
                    .ok_or_else(|| Error::usage(name, "<tool_name> [args...]"))?;
                Ok(Command::CallTool {
                    name: tool.clone(),
                    args: rest.to_vec(),
                })
            }

            CommandKind::SetVar => match args {
                [var, path] => Ok(Command::SetVar {
                    name: var.clone(),
                    path: path.clone(),
                }),
                _ => Err(Error::usage(name, "<name> <path>")),
            },

            CommandKind::InputVar => {
                let (var, prompt) = args
                    .split_first()
                    .ok_or_else(|| Error::usage(name, "a variable name"))?;
                Ok(Command::InputVar {
                    name: var.clone(),
                    prompt: (!prompt.is_empty()).then(|| prompt.join(" ")),
                })
            }

            CommandKind::AssertContains | CommandKind::AssertEquals => {
                let (a, b) = match args {
                    [a] => (a.clone(), None),
                    [a, b] => (a.clone(), Some(b.clone())),
                    _ => return Err(Error::usage(name, "1 or 2 arguments")),
                };
                Ok(if kind == CommandKind::AssertContains {
                    Command::AssertContains { a, b }
                } else {
                    Command::AssertEquals { a, b }
                })
            }

            CommandKind::AssertNumber => match args {
                [value] => Ok(Command::AssertNumber {
                    value: value.clone(),
                }),
                _ => Err(Error::usage(name, "1 argument")),
            },

            CommandKind::AssertGreaterThan => match args {
                [a, b] => Ok(Command::AssertGreaterThan {
                    a: a.clone(),
                    b: b.clone(),
                }),
                _ => Err(Error::usage(name, "2 arguments")),
            },

            CommandKind::AssertStringLength => {
                // The value may have been split by interpolation; everything
                // before the two bounds belongs to it
                if args.len() < 3 {
                    return Err(Error::usage(
                        name,
                        &format!("at least 3 arguments (value, min, max), got {}", args.len()),
                    ));
                }
                let (value, bounds) = args.split_at(args.len() - 2);
                let (min, max) = match (bounds[0].parse(), bounds[1].parse()) {
                    (Ok(min), Ok(max)) => (min, max),
                    _ => {
                        return Err(Error::Dispatch(format!(
                            "{} min and max must be non-negative integers",
                            name
                        )))
                    }
                };
                Ok(Command::AssertStringLength {
                    value: value.join(" "),
                    min,
                    max,
                })
            }

            CommandKind::Timeout => {
                let (ms, rest) = args
                    .split_first()
                    .ok_or_else(|| Error::usage(name, "<milliseconds> <command...>"))?;
                let ms = ms.parse().map_err(|_| {
                    Error::Dispatch(format!("{} milliseconds must be an integer, got '{}'", name, ms))
                })?;
                if rest.is_empty() {
                    return Err(Error::usage(name, "<milliseconds> <command...>"));
                }
                Ok(Command::Timeout {
                    ms,
                    inner: Box::new(Command::parse(rest)?),
                })
            }

            CommandKind::ExpectError => {
                if args.is_empty() {
                    return Err(Error::usage(name, "a command"));
                }
                Ok(Command::ExpectError {
                    inner: Box::new(Command::parse(args)?),
                })
            }
        }
    }

    /// Name as written in scripts
    pub fn name(&self) -> &'static str {
        let kind = match self {
            Command::CallTool { .. } => CommandKind::CallTool,
            Command::SetVar { .. } => CommandKind::SetVar,
            Command::InputVar { .. } => CommandKind::InputVar,
            Command::AssertContains { .. } => CommandKind::AssertContains,
            Command::AssertEquals { .. } => CommandKind::AssertEquals,
            Command::AssertNumber { .. } => CommandKind::AssertNumber,
            Command::AssertGreaterThan { .. } => CommandKind::AssertGreaterThan,
            Command::AssertStringLength { .. } => CommandKind::AssertStringLength,
            Command::Timeout { .. } => CommandKind::Timeout,
            Command::ExpectError { .. } => CommandKind::ExpectError,
        };
        kind.name()
    }
}
