//! Configuration file locations

use std::path::PathBuf;

/// Name used for the per-user configuration directory
const APP_NAME: &str = "mcp-tester";

/// Project-local configuration file, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "mcp-tester.yml";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/mcp-tester/`
/// - macOS: `~/Library/Application Support/mcp-tester/`
/// - Windows: `%APPDATA%\mcp-tester\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the per-user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Candidate configuration files in lookup order
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    candidates.extend(config_path());
    candidates
}
