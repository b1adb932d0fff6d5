//! Path utilities for release-tagger.
//!
//! Configuration lives under `~/.release-tagger/`:
//! - `~/.release-tagger/config.toml` - main configuration

use std::path::PathBuf;

/// Returns the release-tagger home directory (`~/.release-tagger/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".release-tagger")
}

/// Returns the default config file path (`~/.release-tagger/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}
