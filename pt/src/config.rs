//! Configuration for progresstrack

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Settings applied when consolidating reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Retention cap for transient ids and errors per step when merging
    ///
    /// Only lowers the window: tracking always keeps up to
    /// [`crate::TransientData::MAX_TRACKED`], which is also the upper bound here.
    #[serde(default = "default_max_tracked")]
    pub max_tracked: usize,
}

fn default_max_tracked() -> usize {
    crate::TransientData::MAX_TRACKED
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tracked: default_max_tracked(),
        }
    }
}

impl Config {
    /// Reject settings that would make merged reports useless
    pub fn validate(&self) -> Result<()> {
        if self.max_tracked == 0 {
            return Err(eyre::eyre!("max_tracked must be at least 1"));
        }
        let max = crate::TransientData::MAX_TRACKED;
        if self.max_tracked > max {
            return Err(eyre::eyre!("max_tracked must be at most {}, got {}", max, self.max_tracked));
        }
        Ok(())
    }

    /// Load config from file, or use defaults
    ///
    /// Fallback chain: explicit path, `./progresstrack.yml`,
    /// `<config dir>/progresstrack/progresstrack.yml`, built-in defaults.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(config_path)
                .context(format!("Failed to load config from {}", config_path.display()));
        }

        let default_paths = [
            Some(PathBuf::from("progresstrack.yml")),
            dirs::config_dir().map(|p| p.join("progresstrack").join("progresstrack.yml")),
        ];

        for candidate in default_paths.iter().flatten() {
            if candidate.exists() {
                match Self::load_from_file(candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        debug!("Config::load: no config file found, using defaults");
        Ok(Config::default())
    }

    /// Read and validate a single config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), max_tracked = config.max_tracked, "Config::load_from_file: loaded");
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).context(format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }
}
