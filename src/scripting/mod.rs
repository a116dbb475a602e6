//! Test script interpreter
//!
//! A script is a sequence of one-line commands (`call_tool`, `set_var`,
//! assertions, ...). The [`Runner`] executes them in order against a
//! [`ToolInvoker`], stopping at the first failure.

pub mod assertions;
pub mod coerce;
pub mod command;
pub mod extract;
pub mod invoker;
pub mod lexer;
pub mod runner;
pub mod vars;

#[cfg(test)]
pub(crate) mod testing;

pub use command::Command;
pub use invoker::{InputSource, StdinInput, ToolInvoker};
pub use runner::{RunSummary, Runner, RunnerState};
pub use vars::VariableStore;
