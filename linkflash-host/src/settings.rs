//! Tool settings
//!
//! Read from an optional `linkflash.toml` in the project directory. Every
//! key has a default, so a missing file (or an empty one) gives the stock
//! Makefile workflow.
//!
//! ```toml
//! config_path = "src/user_config.h"
//! port_patterns = ["/dev/ttyUSB*", "/dev/ttyACM*"]
//! tail_lines = 10
//! log_level = "debug"
//!
//! [commands]
//! flash = ["make", "flash", "SERIAL_PORT={port}"]
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::Deserialize;

use crate::ports::PortPattern;
use crate::runner::PORT_PLACEHOLDER;

/// Settings file name looked up in the project directory
pub const SETTINGS_FILE: &str = "linkflash.toml";

/// Settings load failure
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// External commands run by a flash sequence
///
/// Each is an argument vector; `{port}` is replaced with the selected port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Commands {
    /// Best-effort cleanup, result ignored
    pub clean: Vec<String>,
    pub build: Vec<String>,
    pub flash: Vec<String>,
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            clean: vec!["make".into(), "clean".into()],
            build: vec!["make".into()],
            flash: vec!["make".into(), "flash".into(), "SERIAL_PORT={port}".into()],
        }
    }
}

/// Complete tool settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Working directory for the build and flash commands
    pub project_root: PathBuf,
    /// Header path, relative to `project_root`
    pub config_path: PathBuf,
    /// Serial device patterns, one `*` in the file name
    pub port_patterns: Vec<String>,
    /// Output lines shown when a command fails
    pub tail_lines: usize,
    /// Log file, relative to `project_root`; `None` disables file logging
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub commands: Commands,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            config_path: PathBuf::from("src/user_config.h"),
            port_patterns: vec!["/dev/ttyUSB*".into(), "/dev/ttyACM*".into()],
            tail_lines: 10,
            log_file: Some(PathBuf::from("linkflash.log")),
            log_level: "info".into(),
            commands: Commands::default(),
        }
    }
}

impl Settings {
    /// Parse settings text without validating it
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load `linkflash.toml` from `dir`, falling back to defaults
    ///
    /// A relative `project_root` is resolved against `dir`.
    pub fn discover(dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(SETTINGS_FILE);
        let mut settings = if path.is_file() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        if settings.project_root.is_relative() {
            settings.project_root = dir.join(&settings.project_root);
        }
        Ok(settings)
    }

    /// Load a settings file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));

        if self.commands.build.is_empty() {
            return invalid("commands.build is empty");
        }
        if self.commands.flash.is_empty() {
            return invalid("commands.flash is empty");
        }
        if !self.commands.flash.iter().any(|a| a.contains(PORT_PLACEHOLDER)) {
            return invalid("commands.flash must contain {port}");
        }
        if self.tail_lines == 0 {
            return invalid("tail_lines must be at least 1");
        }
        if self.port_patterns.iter().any(|p| p.parse::<PortPattern>().is_err()) {
            return invalid("port_patterns entries need a directory and at most one '*'");
        }
        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(SettingsError::Invalid(format!(
                "unknown log_level {:?}",
                self.log_level
            )));
        }
        Ok(())
    }

    /// Header path resolved against `project_root`
    pub fn config_file(&self) -> PathBuf {
        self.project_root.join(&self.config_path)
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file.as_ref().map(|f| self.project_root.join(f))
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Parsed port patterns, skipping invalid entries
    pub fn patterns(&self) -> Vec<PortPattern> {
        self.port_patterns
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect()
    }
}
