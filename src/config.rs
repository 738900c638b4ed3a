//! Run configuration, loadable from TOML.
//!
//! ```toml
//! min_frequency = 3
//! bond_length = 1.5
//! normalize = true
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::corpus::DEFAULT_MIN_FREQUENCY;
use crate::geometry::DEFAULT_BOND_LENGTH;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractConfig {
    /// Keys seen fewer times than this are not written to the library.
    #[serde(default = "default_min_frequency")]
    pub min_frequency: usize,
    /// Target median bond length when coordinates are normalized.
    #[serde(default = "default_bond_length")]
    pub bond_length: f64,
    /// Rescale and center template coordinates before writing.
    #[serde(default)]
    pub normalize: bool,
}

fn default_min_frequency() -> usize {
    DEFAULT_MIN_FREQUENCY
}
fn default_bond_length() -> f64 {
    DEFAULT_BOND_LENGTH
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_frequency: default_min_frequency(),
            bond_length: default_bond_length(),
            normalize: false,
        }
    }
}

impl ExtractConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ExtractConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_frequency == 0 {
            return Err(ConfigError::Invalid("min_frequency must be at least 1".into()));
        }
        if !(self.bond_length.is_finite() && self.bond_length > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "bond_length must be a positive number, got {}",
                self.bond_length
            )));
        }
        Ok(())
    }
}
