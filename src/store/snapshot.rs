//! store::snapshot
//!
//! On-disk JSON snapshot of a [`Keyspace`], guarded by an exclusive lock.
//!
//! # Storage
//!
//! - `<path>` - The snapshot itself (pretty-printed JSON)
//! - `<path>.lock` - Lock file with OS-level exclusive lock
//!
//! # Invariants
//!
//! - The lock is held from [`SnapshotFile::open`] until the guard is dropped
//! - Lock acquisition is non-blocking (fails fast if locked)
//! - Commits are atomic (write to temp file, then rename)
//! - A missing snapshot reads as an empty keyspace
//!
//! # Example
//!
//! ```no_run
//! use memberflow::store::{MemoryStore, SnapshotFile};
//! use std::path::Path;
//!
//! let snapshot = SnapshotFile::open(Path::new("/var/lib/memberflow/state.json")).unwrap();
//! let store = MemoryStore::from_keyspace(snapshot.load().unwrap());
//!
//! // ... run lifecycle operations against `store` ...
//!
//! snapshot.commit(&store.snapshot().unwrap()).unwrap();
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use super::memory::Keyspace;

/// Errors from snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Another process already holds the lock.
    #[error("state file '{0}' is locked by another memberflow process")]
    AlreadyLocked(PathBuf),

    /// Failed to create the lock file or its directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// The snapshot exists but is not a valid keyspace.
    #[error("failed to parse state file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    /// I/O error reading or writing the snapshot.
    #[error("state file i/o error at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A locked snapshot file.
///
/// The lock is released when this guard is dropped.
#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
    lock_path: PathBuf,
    lock: Option<File>,
}

impl SnapshotFile {
    /// Lock the snapshot at `path` for exclusive use.
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::AlreadyLocked`] if another process holds the lock
    /// - [`SnapshotError::CreateFailed`] if the lock file cannot be created
    /// - [`SnapshotError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn open(path: &Path) -> Result<Self, SnapshotError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SnapshotError::CreateFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let lock_path = lock_path_for(path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                SnapshotError::CreateFailed(format!("cannot open {}: {}", lock_path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path: path.to_path_buf(),
                lock_path,
                lock: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(SnapshotError::AlreadyLocked(path.to_path_buf()))
            }
            Err(e) => Err(SnapshotError::AcquireFailed(e.to_string())),
        }
    }

    /// Path of the snapshot.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock file.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Read the snapshot.
    pub fn load(&self) -> Result<Keyspace, SnapshotError> {
        if !self.path.exists() {
            return Ok(Keyspace::default());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| SnapshotError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        serde_json::from_str(&contents).map_err(|e| SnapshotError::ParseError {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Write the snapshot atomically.
    pub fn commit(&self, keyspace: &Keyspace) -> Result<(), SnapshotError> {
        let contents = serde_json::to_string_pretty(keyspace).map_err(|e| {
            SnapshotError::ParseError {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| SnapshotError::Io { path, source }
        };

        let mut file = File::create(&temp_path).map_err(io_err(&temp_path))?;
        file.write_all(contents.as_bytes())
            .map_err(io_err(&temp_path))?;
        file.sync_all().map_err(io_err(&temp_path))?;

        fs::rename(&temp_path, &self.path).map_err(io_err(&self.path))?;
        Ok(())
    }
}

impl Drop for SnapshotFile {
    fn drop(&mut self) {
        // Best-effort release on drop
        if let Some(file) = self.lock.take() {
            let _ = file.unlock();
        }
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
