//! The racer: wait for the gate, then swap the target

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::RaceError;
use crate::fs::{FileSystem, OsFileSystem};
use crate::poll::poll_until;
use crate::precondition::Precondition;

/// The three paths a race works on, guaranteed distinct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RacePaths {
    target: PathBuf,
    sensitive: PathBuf,
    temp: PathBuf,
}

impl RacePaths {
    pub fn new(
        target: impl Into<PathBuf>,
        sensitive: impl Into<PathBuf>,
        temp: impl Into<PathBuf>,
    ) -> Result<Self, RaceError> {
        let target = target.into();
        let sensitive = sensitive.into();
        let temp = temp.into();

        if target == sensitive || target == temp {
            return Err(RaceError::PathConflict(target));
        }
        if sensitive == temp {
            return Err(RaceError::PathConflict(sensitive));
        }

        Ok(Self { target, sensitive, temp })
    }

    /// File the victim trusts
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// File whose contents get planted
    pub fn sensitive(&self) -> &Path {
        &self.sensitive
    }

    /// Staging file, consumed by the rename
    pub fn temp(&self) -> &Path {
        &self.temp
    }
}

/// Result of a successful race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceOutcome {
    /// Precondition evaluations, including the one that succeeded
    pub attempts: u64,
    /// Clock time at which the precondition held
    pub detected_after: Duration,
    /// Bytes copied from the sensitive file
    pub bytes_copied: u64,
}

/// Polls a precondition on the target, then swaps in the sensitive file
///
/// The swap is `copy(sensitive -> temp)` followed by `rename(temp -> target)`.
/// Nothing guards the gap between the last probe and the copy; that gap is
/// the race being demonstrated. The racer is single-shot: it returns after
/// the first successful rename.
pub struct Racer<F, C> {
    fs: F,
    clock: C,
    paths: RacePaths,
    poll_interval: Duration,
    precondition: Precondition,
}

impl<F: FileSystem, C: Clock> Racer<F, C> {
    pub fn new(fs: F, clock: C, paths: RacePaths) -> Self {
        Self {
            fs,
            clock,
            paths,
            poll_interval: crate::DEFAULT_POLL_INTERVAL,
            precondition: Precondition::default(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.precondition = precondition;
        self
    }

    pub fn paths(&self) -> &RacePaths {
        &self.paths
    }

    pub fn precondition(&self) -> Precondition {
        self.precondition
    }

    /// Evaluate the configured precondition once, without touching anything
    pub fn probe(&self) -> Result<bool, RaceError> {
        self.precondition.evaluate(&self.fs, &self.paths.target)
    }

    /// Race using the configured precondition
    pub fn run(&self) -> Result<RaceOutcome, RaceError> {
        let precondition = self.precondition;
        info!(
            target = %self.paths.target.display(),
            precondition = %precondition,
            interval_ms = u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX),
            "Racer started"
        );
        self.run_with(|fs, target| precondition.evaluate(fs, target))
    }

    /// Race using a caller-supplied precondition
    pub fn run_with<P>(&self, mut precondition: P) -> Result<RaceOutcome, RaceError>
    where
        P: FnMut(&F, &Path) -> Result<bool, RaceError>,
    {
        let target = &self.paths.target;
        let stats = poll_until(&self.clock, self.poll_interval, || precondition(&self.fs, target))?;
        info!(
            attempts = stats.attempts,
            elapsed_ms = u64::try_from(stats.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Precondition met"
        );

        let bytes_copied = self.swap()?;
        info!(
            target = %target.display(),
            sensitive = %self.paths.sensitive.display(),
            bytes_copied,
            "Target replaced"
        );

        Ok(RaceOutcome {
            attempts: stats.attempts,
            detected_after: stats.elapsed,
            bytes_copied,
        })
    }

    fn swap(&self) -> Result<u64, RaceError> {
        let RacePaths { target, sensitive, temp } = &self.paths;

        let bytes = self.fs.copy(sensitive, temp).map_err(|source| RaceError::Copy {
            from: sensitive.clone(),
            to: temp.clone(),
            source,
        })?;
        debug!(temp = %temp.display(), bytes, "Staged sensitive contents");

        self.fs.rename(temp, target).map_err(|source| RaceError::Replace {
            from: temp.clone(),
            to: target.clone(),
            source,
        })?;
        Ok(bytes)
    }
}

/// Race on the real filesystem with wall-clock polling
pub fn run(
    target: impl Into<PathBuf>,
    sensitive: impl Into<PathBuf>,
    temp: impl Into<PathBuf>,
    poll_interval: Duration,
    precondition: Precondition,
) -> Result<RaceOutcome, RaceError> {
    let paths = RacePaths::new(target, sensitive, temp)?;
    Racer::new(OsFileSystem, SystemClock::new(), paths)
        .with_poll_interval(poll_interval)
        .with_precondition(precondition)
        .run()
}
