//! Engine configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/fifusion/config/engine.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! The host loads the config once and hands it to [`crate::Dashboard`]; nothing
//! in the engine reads configuration mid-computation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregatorConfig;
use crate::error::{Error, Result};
use crate::health::HealthConfig;
use crate::insights::InsightConfig;
use crate::normalize::{minor_unit_exponent, NormalizerConfig};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub normalizer: NormalizerConfig,
    pub aggregator: AggregatorConfig,
    pub health: HealthConfig,
    pub insights: InsightConfig,
}

impl EngineConfig {
    /// Load configuration (explicit path, then default override, then embedded)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = match override_path {
            Some(path) if path.exists() => read_config(path)?,
            Some(path) => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )))
            }
            None => match default_config_path() {
                Some(path) if path.exists() => read_config(&path)?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// The compiled-in defaults
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    fn validate(&self) -> Result<()> {
        if self.normalizer.max_minor_units <= 0 {
            return Err(Error::Config(
                "normalizer.max_minor_units must be positive".to_string(),
            ));
        }
        if let Some(code) = &self.normalizer.currency {
            minor_unit_exponent(Some(code))
                .map_err(|e| Error::Config(format!("normalizer.currency: {}", e)))?;
        }
        if self.aggregator.accrual_window_days <= 0 {
            return Err(Error::Config(
                "aggregator.accrual_window_days must be positive".to_string(),
            ));
        }
        if self.health.expense_trend_threshold_pct <= 0.0 {
            return Err(Error::Config(
                "health.expense_trend_threshold_pct must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("fifusion").join("config").join("engine.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::Config(format!("Failed to read config: {}", e)))
}
