//! Racer configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::precondition::{OpenCheck, Precondition, Strategy};
use crate::race::RacePaths;

/// Main racer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files involved in the race
    pub paths: PathsConfig,

    /// Polling behaviour
    pub race: RaceConfig,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.race.poll_interval_ms == 0 {
            return Err(eyre::eyre!("poll-interval-ms must be greater than zero"));
        }
        self.race_paths()?;
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .racer.yml
        let local_config = PathBuf::from(".racer.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/racer/racer.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("racer").join("racer.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Build the validated path triple
    pub fn race_paths(&self) -> Result<RacePaths> {
        let paths = RacePaths::new(&self.paths.target, &self.paths.sensitive, &self.paths.temp)?;
        Ok(paths)
    }
}

/// Target, sensitive and staging paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// File the victim checks and later uses
    pub target: PathBuf,

    /// File whose contents are planted into the target
    pub sensitive: PathBuf,

    /// Staging file; must live on the same filesystem as the target
    pub temp: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::from(crate::DEFAULT_TARGET),
            sensitive: PathBuf::from(crate::DEFAULT_SENSITIVE),
            temp: PathBuf::from(crate::DEFAULT_TEMP),
        }
    }
}

/// Polling behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Delay between precondition probes in milliseconds
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Which gate to wait on
    pub precondition: Strategy,

    /// Which write-open failures count as "is open"
    #[serde(rename = "open-check")]
    pub open_check: OpenCheck,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: crate::DEFAULT_POLL_INTERVAL_MS,
            precondition: Strategy::default(),
            open_check: OpenCheck::default(),
        }
    }
}

impl RaceConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Combine strategy and open check into the precondition to run
    pub fn precondition(&self) -> Precondition {
        Precondition::new(self.precondition, self.open_check)
    }
}
