//! # Configuration
//!
//! YAML configuration for hosts that embed the engine.
//!
//! ## Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path in the `PNBERT_CONFIG` environment variable
//! 2. `./pnbert.yaml`
//! 3. `<user config dir>/pnbert/config.yaml`
//! 4. `/etc/pnbert/config.yaml`
//!
//! ## Example Configuration
//!
//! ```yaml
//! variant: pn23
//!
//! checker:
//!   lock_threshold: 10
//!   window_length: 10
//!   window_error_limit: 20
//!   window_policy: reset
//!
//! logging:
//!   level: info
//!   format: json
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::checker::{CheckerConfig, PatternChecker};
use crate::error::{BertError, BertResult};
use crate::generator::PatternGenerator;
use crate::logging::LogConfig;
use crate::variant::PnVariant;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PNBERT_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BertConfig {
    /// Sequence used by both generator and checker
    pub variant: PnVariant,
    pub checker: CheckerConfig,
    pub logging: LogConfig,
}

impl BertConfig {
    /// Load from the search path, or defaults if no file exists.
    pub fn load() -> BertResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
            tracing::warn!("{} points at missing file {}", CONFIG_ENV, path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate a specific file.
    pub fn load_from(path: &Path) -> BertResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BertError::ConfigRead(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), variant = %config.variant, "loaded config");
        Ok(config)
    }

    /// Parse and validate a YAML string.
    pub fn parse(yaml: &str) -> BertResult<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| BertError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./pnbert.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "pnbert") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/pnbert/config.yaml"));
        paths
    }

    pub fn validate(&self) -> BertResult<()> {
        if self.checker.lock_threshold == 0 {
            return Err(BertError::Config(
                "lock_threshold must be > 0".to_string(),
            ));
        }
        if self.checker.window_length == 0 {
            return Err(BertError::Config(
                "window_length must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Generator for the configured variant.
    pub fn generator(&self) -> PatternGenerator {
        PatternGenerator::new(self.variant)
    }

    /// Checker for the configured variant and thresholds.
    pub fn checker(&self) -> PatternChecker {
        PatternChecker::with_config(self.variant, self.checker.clone())
    }

    pub fn example_yaml() -> String {
        let config = Self {
            variant: PnVariant::Pn23,
            ..Default::default()
        };
        serde_yaml::to_string(&config).unwrap_or_default()
    }
}
