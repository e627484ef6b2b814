//! Configuration Module
//!
//! `Configuration` is fixed before the run starts and threaded through every
//! component. It is layered, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. Values declared on the tool
//! 3. User settings file (`~/.config/bindcli/config.toml`, or `$BINDCLI_CONFIG`)
//! 4. Command-line flags
//!
//! Layers 3 and 4 are both partial [`Settings`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};
use crate::store::OverwritePolicy;

/// Environment variable overriding the settings file location
pub const CONFIG_ENV: &str = "BINDCLI_CONFIG";

/// Effective run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub overwrite: OverwritePolicy,
    /// Show a progress bar in sequential mode
    pub bar: bool,
    /// Column separator of standard input lines
    pub stdin_sep: String,
    /// Column separator of standard output lines
    pub stdout_sep: String,
    /// Skip missing datasets when collecting from all input files
    pub omit_missing: bool,
    pub parallel: bool,
    /// Skip the invocation when an indexed output file does not exist
    pub must_exist: bool,
    /// Print the timing report after the run
    pub timings: bool,
    /// File receiving the command line of the run
    pub cmd_log: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::Prompt,
            bar: false,
            stdin_sep: " ".to_string(),
            stdout_sep: " ".to_string(),
            omit_missing: false,
            parallel: false,
            must_exist: false,
            timings: false,
            cmd_log: None,
        }
    }
}

impl Configuration {
    /// Apply a partial layer on top of this configuration
    pub fn layered(mut self, layer: &Settings) -> Self {
        if let Some(overwrite) = layer.overwrite {
            self.overwrite = overwrite;
        }
        if let Some(bar) = layer.bar {
            self.bar = bar;
        }
        if let Some(sep) = layer.insep.as_ref().filter(|s| !s.is_empty()) {
            self.stdin_sep = sep.clone();
        }
        if let Some(sep) = layer.outsep.as_ref().filter(|s| !s.is_empty()) {
            self.stdout_sep = sep.clone();
        }
        if let Some(omit) = layer.omit_missing {
            self.omit_missing = omit;
        }
        if let Some(must_exist) = layer.must_exist {
            self.must_exist = must_exist;
        }
        if let Some(timings) = layer.timings {
            self.timings = timings;
        }
        if let Some(path) = &layer.cmd_log {
            self.cmd_log = Some(path.clone());
        }
        self
    }
}

/// Partial configuration (settings file or command-line flags)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub overwrite: Option<OverwritePolicy>,
    pub bar: Option<bool>,
    pub insep: Option<String>,
    pub outsep: Option<String>,
    pub omit_missing: Option<bool>,
    pub must_exist: Option<bool>,
    pub timings: Option<bool>,
    pub cmd_log: Option<PathBuf>,
}

impl Settings {
    /// Returns `~/.config/bindcli/` on Unix, `%APPDATA%/bindcli/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bindcli")
    }

    /// Settings file path, honoring `$BINDCLI_CONFIG`
    pub fn config_path() -> PathBuf {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::config_dir().join("config.toml"),
        }
    }

    /// Load the user settings file
    ///
    /// Returns empty settings if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| BindError::Settings {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| BindError::Settings {
            reason: format!("Failed to parse {}: {}", path.display(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Configuration::default();
        assert_eq!(cfg.overwrite, OverwritePolicy::Prompt);
        assert_eq!(cfg.stdin_sep, " ");
        assert!(!cfg.bar);
    }

    #[test]
    fn layers_override_in_order() {
        let file = Settings {
            overwrite: Some(OverwritePolicy::Never),
            outsep: Some(",".into()),
            ..Default::default()
        };
        let flags = Settings {
            overwrite: Some(OverwritePolicy::Always),
            ..Default::default()
        };
        let cfg = Configuration::default().layered(&file).layered(&flags);
        assert_eq!(cfg.overwrite, OverwritePolicy::Always);
        assert_eq!(cfg.stdout_sep, ",");
        assert_eq!(cfg.stdin_sep, " ");
    }

    #[test]
    fn empty_separator_is_ignored() {
        let layer = Settings {
            insep: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(Configuration::default().layered(&layer).stdin_sep, " ");
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("none.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "overwrite = \"never\"\nbar = true\ninsep = \",\"\n").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.overwrite, Some(OverwritePolicy::Never));
        assert_eq!(settings.bar, Some(true));
        assert_eq!(settings.insep.as_deref(), Some(","));
    }

    #[test]
    fn malformed_settings_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "overwrite = 3").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(BindError::Settings { .. })
        ));
    }

    #[test]
    fn config_path_ends_with_toml() {
        if std::env::var_os(CONFIG_ENV).is_none() {
            let path = Settings::config_path();
            assert!(path.to_string_lossy().contains("bindcli"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
