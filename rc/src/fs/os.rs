//! Real filesystem backed by `std::fs`

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use fs2::FileExt;
use tracing::trace;

use super::FileSystem;

/// The local disk
///
/// `open_for_write` opens the existing file with write access and then
/// takes a non-blocking exclusive advisory lock, released immediately. A
/// writer holding an advisory lock therefore shows up as contention.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open_for_write(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        FileExt::try_lock_exclusive(&file)?;
        trace!(path = %path.display(), "Write probe acquired lock");
        FileExt::unlock(&file)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}
