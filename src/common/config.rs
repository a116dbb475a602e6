//! Configuration file handling
//!
//! Profiles name a server once so scripts can be run with `-p <profile>`
//! instead of repeating the launch command or URL.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::paths::config_candidates;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Named server profiles
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// How to reach one MCP server
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// Shell command that starts a stdio server
    pub command: Option<String>,

    /// HTTP endpoint of a remote server
    pub url: Option<String>,
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Timeout for the initialize handshake
    #[serde(default = "default_initialize")]
    pub initialize_secs: u64,

    /// Timeout for any other request
    #[serde(default = "default_request")]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            initialize_secs: default_initialize(),
            request_secs: default_request(),
        }
    }
}

fn default_initialize() -> u64 {
    10
}
fn default_request() -> u64 {
    300
}

/// Where the server lives, after profiles and flags are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Launch a child process and speak stdio
    Command(String),
    /// POST to an HTTP endpoint
    Url(String),
}

impl Config {
    /// Load configuration from an explicit path, or from the first default
    /// location that exists
    ///
    /// Returns default configuration if no file exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        for path in config_candidates() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load a single configuration file
    ///
    /// A missing file yields the default configuration. `.toml` files are
    /// parsed as TOML, anything else as YAML.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        let config = if is_toml {
            toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?
        } else if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?
        };

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply a profile if one is named, otherwise use the command line flags
    pub fn resolve_target(
        &self,
        profile: Option<&str>,
        command: Option<&str>,
        url: Option<&str>,
    ) -> Result<Target> {
        let (command, url) = match profile {
            Some(name) => {
                let profile = self
                    .profiles
                    .get(name)
                    .ok_or_else(|| Error::Config(format!("profile not found: {}", name)))?;
                (profile.command.as_deref(), profile.url.as_deref())
            }
            None => (command, url),
        };

        match (command, url) {
            (Some(cmd), _) if !cmd.trim().is_empty() => Ok(Target::Command(cmd.to_string())),
            (_, Some(url)) if !url.trim().is_empty() => Ok(Target::Url(url.to_string())),
            _ => Err(Error::Config(
                "either --command or --url is required".to_string(),
            )),
        }
    }
}
