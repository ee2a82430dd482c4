//! Filesystem capability used by the racer
//!
//! The racer never touches `std::fs` directly. Everything it needs from the
//! shared filesystem goes through [`FileSystem`], so a race can be driven
//! against the real disk ([`OsFileSystem`]) or against an instrumented
//! in-memory fake ([`MemoryFileSystem`]).

mod memory;
mod os;

use std::io;
use std::path::Path;

pub use memory::{MemoryFileSystem, Mutation, WriteHold};
pub use os::OsFileSystem;

/// The four operations the race depends on
pub trait FileSystem {
    /// Whether an entry exists at `path` (symlinks followed)
    fn exists(&self, path: &Path) -> bool;

    /// Try to open the existing file at `path` for writing
    ///
    /// `Ok(())` means nobody else holds it. Lock contention is reported as
    /// [`fs2::lock_contended_error`]; any other failure is passed through.
    /// Never creates or truncates the file.
    fn open_for_write(&self, path: &Path) -> io::Result<()>;

    /// Copy the full contents of `from` into `to`, returning bytes written
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Rename `from` onto `to`, replacing `to` in a single step
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn open_for_write(&self, path: &Path) -> io::Result<()> {
        (**self).open_for_write(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        (**self).copy(from, to)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }
}

/// Check if an error from [`FileSystem::open_for_write`] means another
/// handle holds the file
pub fn is_lock_contention(err: &io::Error) -> bool {
    let contended = fs2::lock_contended_error();
    match (err.raw_os_error(), contended.raw_os_error()) {
        (Some(code), Some(expected)) => code == expected,
        _ => err.kind() == io::ErrorKind::WouldBlock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_lock_contention() {
        assert!(is_lock_contention(&fs2::lock_contended_error()));
        assert!(is_lock_contention(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_lock_contention(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!is_lock_contention(&io::Error::from(io::ErrorKind::NotFound)));
    }
}
