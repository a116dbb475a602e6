//! Common utilities shared by the CLI, the protocol client and the script runner

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
