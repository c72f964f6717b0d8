//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that resources, the backup ledger
//! and tasks can be unit-tested without touching the real filesystem.
//! Production code uses [`SystemFileSystemOps`]; tests use
//! `MockFileSystemOps`.

use std::io;
use std::path::{Path, PathBuf};

use crate::blocks::FileStamp;

/// Abstraction over the file accesses the engine performs.
///
/// Absence is a value, not an error: readers return `Ok(None)` for a missing
/// file so callers can tell "absent" from "unreadable".
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Read the raw bytes of `path`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Write `contents` to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or the write fails.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Delete the file at `path`. Returns `false` if it was already absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    fn remove_file(&self, path: &Path) -> io::Result<bool>;

    /// Modification time and size of `path`, or `None` if it does not exist.
    fn stamp(&self, path: &Path) -> Option<FileStamp>;

    /// Returns the immediate child paths inside `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Remove the directory at `path` if it exists and is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is empty but cannot be removed.
    fn remove_dir_if_empty(&self, path: &Path) -> io::Result<()>;

    /// Read `path` as text, replacing invalid UTF-8 sequences.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn read_text(&self, path: &Path) -> io::Result<Option<String>> {
        Ok(self
            .read(path)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    }

    fn remove_file(&self, path: &Path) -> io::Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn stamp(&self, path: &Path) -> Option<FileStamp> {
        let meta = std::fs::metadata(path).ok()?;
        Some(FileStamp {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()))
            .collect()
    }

    fn remove_dir_if_empty(&self, path: &Path) -> io::Result<()> {
        match std::fs::read_dir(path) {
            Ok(mut entries) => {
                if entries.next().is_none() {
                    std::fs::remove_dir(path)?;
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-memory [`FileSystemOps`] for unit tests.
///
/// Files live in a map guarded by a mutex. Paths registered with
/// [`deny`](Self::deny) fail every access with `PermissionDenied`.
///
/// # Example
///
/// ```ignore
/// use encfix_cli::operations::MockFileSystemOps;
///
/// let fs = MockFileSystemOps::new().with_file("/home/u/.bashrc", "alias l=ls\n");
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    files: std::sync::Mutex<std::collections::BTreeMap<PathBuf, Vec<u8>>>,
    denied: Vec<PathBuf>,
    writes: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl MockFileSystemOps {
    /// Create an empty mock with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file with text content.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.files
            .lock()
            .expect("mock files poisoned")
            .insert(path.into(), contents.as_bytes().to_vec());
        self
    }

    /// Make every access to `path` fail with `PermissionDenied`.
    #[must_use]
    pub fn deny(mut self, path: impl Into<PathBuf>) -> Self {
        self.denied.push(path.into());
        self
    }

    /// Current text content of `path`, if present.
    #[must_use]
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .lock()
            .expect("mock files poisoned")
            .get(path.as_ref())
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Number of successful writes performed so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn check(&self, path: &Path) -> io::Result<()> {
        if self.denied.iter().any(|p| p == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("mock: access denied to {}", path.display()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().expect("mock files poisoned");
        files.contains_key(path) || files.keys().any(|p| p.starts_with(path))
    }

    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        self.check(path)?;
        Ok(self
            .files
            .lock()
            .expect("mock files poisoned")
            .get(path)
            .cloned())
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.check(path)?;
        self.files
            .lock()
            .expect("mock files poisoned")
            .insert(path.to_path_buf(), contents.to_vec());
        self.writes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<bool> {
        self.check(path)?;
        Ok(self
            .files
            .lock()
            .expect("mock files poisoned")
            .remove(path)
            .is_some())
    }

    fn stamp(&self, path: &Path) -> Option<FileStamp> {
        self.files
            .lock()
            .expect("mock files poisoned")
            .get(path)
            .map(|b| FileStamp {
                modified: None,
                len: b.len() as u64,
            })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.check(path)?;
        let children: std::collections::BTreeSet<PathBuf> = self
            .files
            .lock()
            .expect("mock files poisoned")
            .keys()
            .filter_map(|p| p.strip_prefix(path).ok()?.components().next())
            .map(|first| path.join(first))
            .collect();
        Ok(children.into_iter().collect())
    }

    fn remove_dir_if_empty(&self, path: &Path) -> io::Result<()> {
        self.check(path)
    }
}
