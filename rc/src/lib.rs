//! Racer - TOCTOU file-swap race primitive
//!
//! Polls a target path until a precondition holds, then replaces the
//! target's contents with a sensitive file's contents by copying into a
//! staging file and renaming it over the target. The gap between the
//! probe and the swap is the time-of-check-to-time-of-use window a victim
//! process leaves open.
//!
//! # Modules
//!
//! - [`race`] - The racer and its path triple
//! - [`precondition`] - Named gate strategies (exists, exists-unlocked)
//! - [`poll`] - Unbounded retry-until-condition loop
//! - [`fs`] - Filesystem capability, real and in-memory
//! - [`clock`] - Injectable time source
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use racer::{OsFileSystem, Precondition, RacePaths, Racer, SystemClock};
//!
//! let paths = RacePaths::new("example.txt", "sensitive.txt", "temp.txt")?;
//! let outcome = Racer::new(OsFileSystem, SystemClock::new(), paths)
//!     .with_precondition(Precondition::Exists)
//!     .run()?;
//! println!("swapped after {} probes", outcome.attempts);
//! ```

use std::time::Duration;

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod fs;
pub mod poll;
pub mod precondition;
pub mod race;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::RaceError;
pub use fs::{FileSystem, MemoryFileSystem, Mutation, OsFileSystem};
pub use poll::{PollStats, poll_until};
pub use precondition::{OpenCheck, Precondition, Strategy};
pub use race::{RaceOutcome, RacePaths, Racer, run};

/// Default target path
pub const DEFAULT_TARGET: &str = "example.txt";

/// Default sensitive path
pub const DEFAULT_SENSITIVE: &str = "sensitive.txt";

/// Default staging path
pub const DEFAULT_TEMP: &str = "temp.txt";

/// Default delay between probes in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default delay between probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
