//! Engine configuration.
//!
//! Settings are read from a JSON file. An explicit path wins; otherwise
//! `$XDG_CONFIG_HOME/conductor/config.json` is used when present, and the
//! built-in defaults apply when neither exists. Every field is optional.
//!
//! ```json
//! {
//!   "step_delay_ms": 250,
//!   "pause_on_error": false
//! }
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    engine::DEFAULT_STEP_DELAY,
    error::{EngineError, IoResultExt, Result},
    models::ExecutionOptions,
};

const APP_PREFIX: &str = "conductor";
const CONFIG_FILE: &str = "config.json";

/// Engine-level defaults loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause between auto-proceeding steps, in milliseconds
    #[serde(alias = "stepDelayMs")]
    pub step_delay_ms: u64,

    #[serde(alias = "autoProceed")]
    pub auto_proceed: bool,

    #[serde(alias = "pauseOnError")]
    pub pause_on_error: bool,

    #[serde(alias = "dryRun")]
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let options = ExecutionOptions::default();
        Self {
            step_delay_ms: u64::try_from(DEFAULT_STEP_DELAY.as_millis()).unwrap_or(100),
            auto_proceed: options.auto_proceed,
            pause_on_error: options.pause_on_error,
            dry_run: options.dry_run,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from `path`, or from the XDG config directory when
    /// no path is given.
    ///
    /// # Errors
    ///
    /// Fails if an explicit `path` cannot be read, or if the selected file is
    /// not valid JSON for this type. A missing XDG file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::find_default() {
                Some(path) => Self::from_file(&path),
                None => {
                    debug!("No configuration file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Reads configuration from a specific file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path).fs_context(path)?;
        serde_json::from_str(&raw).map_err(|e| EngineError::Configuration {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Writes this configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).fs_context(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).fs_context(path)
    }

    /// Location of the configuration file in the XDG config directory,
    /// creating the directory if needed.
    pub fn default_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix(APP_PREFIX)
            .place_config_file(CONFIG_FILE)
            .map_err(|e| EngineError::XdgDirectory(e.to_string()))
    }

    fn find_default() -> Option<PathBuf> {
        xdg::BaseDirectories::with_prefix(APP_PREFIX).find_config_file(CONFIG_FILE)
    }

    /// Execution options seeded from this configuration.
    pub fn default_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            auto_proceed: self.auto_proceed,
            pause_on_error: self.pause_on_error,
            dry_run: self.dry_run,
        }
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults_match_execution_options() {
        let config = EngineConfig::default();
        assert_eq!(config.step_delay_ms, 100);
        assert_eq!(config.default_options(), ExecutionOptions::default());
        assert_eq!(config.step_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "stepDelayMs": 5, "pause_on_error": false }"#).unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();

        assert_eq!(config.step_delay_ms, 5);
        assert!(!config.pause_on_error);
        assert!(config.auto_proceed);
        assert!(!config.default_options().pause_on_error);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = EngineConfig::load(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(matches!(err, EngineError::FileSystem { .. }));
    }

    #[test]
    fn test_malformed_file_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ step_delay_ms: ").unwrap();

        let err = EngineConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = EngineConfig {
            step_delay_ms: 0,
            dry_run: true,
            ..Default::default()
        };

        config.save(&path).unwrap();

        assert_eq!(EngineConfig::from_file(&path).unwrap(), config);
    }
}
