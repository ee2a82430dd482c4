//! Race error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a race attempt
///
/// Every variant is fatal: the racer never retries anything except the
/// precondition poll itself.
#[derive(Debug, Error)]
pub enum RaceError {
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to replace {to} with {from}: {source}")]
    Replace {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to probe {path}: {source}")]
    Probe {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Paths must be distinct, {0} given twice")]
    PathConflict(PathBuf),
}

impl RaceError {
    /// Name of the step that failed
    pub fn stage(&self) -> &'static str {
        match self {
            RaceError::Copy { .. } => "copy",
            RaceError::Replace { .. } => "replace",
            RaceError::Probe { .. } => "probe",
            RaceError::PathConflict(_) => "setup",
        }
    }

    /// Check if the underlying failure was a permission error
    pub(crate) fn is_permission_denied(&self) -> bool {
        self.io_error()
            .map(|e| e.kind() == io::ErrorKind::PermissionDenied)
            .unwrap_or(false)
    }

    fn io_error(&self) -> Option<&io::Error> {
        match self {
            RaceError::Copy { source, .. } | RaceError::Replace { source, .. } | RaceError::Probe { source, .. } => {
                Some(source)
            }
            RaceError::PathConflict(_) => None,
        }
    }
}
