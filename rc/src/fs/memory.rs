//! In-memory filesystem for driving races deterministically

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::FileSystem;

/// A state change made through the [`FileSystem`] trait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Copy { from: PathBuf, to: PathBuf },
    Rename { from: PathBuf, to: PathBuf },
}

#[derive(Debug, Default)]
struct Entry {
    data: Vec<u8>,
    writers: usize,
}

#[derive(Debug, Default)]
struct State {
    files: HashMap<PathBuf, Entry>,
    denied: HashSet<PathBuf>,
    mutations: Vec<Mutation>,
}

/// Shared in-memory filesystem
///
/// Clones share the same state, so a test can keep one handle to play the
/// victim while the racer owns another. Direct writes through
/// [`MemoryFileSystem::write`] model external actors and are not recorded;
/// only trait operations land in [`MemoryFileSystem::mutations`].
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    state: Arc<Mutex<State>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or overwrite a file as an external actor
    pub fn write(&self, path: impl AsRef<Path>, data: impl AsRef<[u8]>) {
        let mut state = self.lock();
        let entry = state.files.entry(path.as_ref().to_path_buf()).or_default();
        entry.data = data.as_ref().to_vec();
    }

    /// Read a file's contents, if present
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().files.get(path.as_ref()).map(|e| e.data.clone())
    }

    /// Delete a file as an external actor
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.lock().files.remove(path.as_ref()).is_some()
    }

    /// Hold `path` open for writing until the returned guard is dropped
    ///
    /// Like opening with create, an absent file comes into existence empty.
    pub fn hold_for_write(&self, path: impl AsRef<Path>) -> WriteHold {
        let path = path.as_ref().to_path_buf();
        self.lock().files.entry(path.clone()).or_default().writers += 1;
        WriteHold { fs: self.clone(), path }
    }

    /// Make every write-open of `path` fail with permission denied
    pub fn deny_write(&self, path: impl AsRef<Path>) {
        self.lock().denied.insert(path.as_ref().to_path_buf());
    }

    /// Trait operations performed so far, in order
    pub fn mutations(&self) -> Vec<Mutation> {
        self.lock().mutations.clone()
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    fn open_for_write(&self, path: &Path) -> io::Result<()> {
        let state = self.lock();
        let Some(entry) = state.files.get(path) else {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        };
        if state.denied.contains(path) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        if entry.writers > 0 {
            return Err(fs2::lock_contended_error());
        }
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let mut state = self.lock();
        let data = state
            .files
            .get(from)
            .map(|e| e.data.clone())
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        if state.denied.contains(to) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        let len = data.len() as u64;
        state.files.entry(to.to_path_buf()).or_default().data = data;
        state.mutations.push(Mutation::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(len)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.lock();
        let entry = state
            .files
            .remove(from)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        state.files.insert(to.to_path_buf(), entry);
        state.mutations.push(Mutation::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }
}

/// Guard returned by [`MemoryFileSystem::hold_for_write`]
#[derive(Debug)]
pub struct WriteHold {
    fs: MemoryFileSystem,
    path: PathBuf,
}

impl Drop for WriteHold {
    fn drop(&mut self) {
        if let Some(entry) = self.fs.lock().files.get_mut(&self.path) {
            entry.writers = entry.writers.saturating_sub(1);
        }
    }
}
