//! Named precondition strategies

use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RaceError;
use crate::fs::{FileSystem, is_lock_contention};

/// Which gate the racer waits on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Target exists
    Exists,
    /// Target exists and nobody holds it open for writing
    #[default]
    ExistsUnlocked,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exists" => Ok(Self::Exists),
            "exists-unlocked" | "unlocked" => Ok(Self::ExistsUnlocked),
            _ => Err(format!("Unknown precondition: {}. Use exists or exists-unlocked", s)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => write!(f, "exists"),
            Self::ExistsUnlocked => write!(f, "exists-unlocked"),
        }
    }
}

/// Which write-open failures count as "is open"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenCheck {
    /// Any failure means open, permission errors included
    #[default]
    Broad,
    /// Only lock contention means open; other failures are fatal
    Strict,
}

impl OpenCheck {
    /// Whether the target must be treated as held open right now
    pub fn is_open<F: FileSystem + ?Sized>(&self, fs: &F, target: &Path) -> Result<bool, RaceError> {
        let err = match fs.open_for_write(target) {
            Ok(()) => return Ok(false),
            Err(err) => err,
        };

        if is_lock_contention(&err) {
            debug!(target = %target.display(), "Target is locked by another writer");
            return Ok(true);
        }

        match self {
            Self::Broad => {
                debug!(target = %target.display(), error = %err, "Write probe failed, treating target as open");
                Ok(true)
            }
            Self::Strict if err.kind() == io::ErrorKind::NotFound => {
                debug!(target = %target.display(), "Target vanished between probes");
                Ok(true)
            }
            Self::Strict => Err(RaceError::Probe {
                path: target.to_path_buf(),
                source: err,
            }),
        }
    }
}

impl FromStr for OpenCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "broad" => Ok(Self::Broad),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("Unknown open check: {}. Use broad or strict", s)),
        }
    }
}

impl fmt::Display for OpenCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broad => write!(f, "broad"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// The gate polled before the swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Exists,
    ExistsUnlocked(OpenCheck),
}

impl Default for Precondition {
    fn default() -> Self {
        Self::ExistsUnlocked(OpenCheck::default())
    }
}

impl Precondition {
    pub fn new(strategy: Strategy, open_check: OpenCheck) -> Self {
        match strategy {
            Strategy::Exists => Self::Exists,
            Strategy::ExistsUnlocked => Self::ExistsUnlocked(open_check),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Exists => Strategy::Exists,
            Self::ExistsUnlocked(_) => Strategy::ExistsUnlocked,
        }
    }

    /// Evaluate the gate once against `target`
    pub fn evaluate<F: FileSystem + ?Sized>(&self, fs: &F, target: &Path) -> Result<bool, RaceError> {
        if !fs.exists(target) {
            return Ok(false);
        }
        match self {
            Self::Exists => Ok(true),
            Self::ExistsUnlocked(check) => Ok(!check.is_open(fs, target)?),
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => write!(f, "exists"),
            Self::ExistsUnlocked(check) => write!(f, "exists-unlocked ({})", check),
        }
    }
}
