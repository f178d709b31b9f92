// tighten-core/src/filesystem.rs
// ============================================================================
// Module: File-system facade
// Description: Abstraction over open/read/write/rename/exists/mkdirs so
// tests can substitute an in-memory implementation. All writes go
// temp-then-rename.
// ============================================================================

//! ## Overview
//! `spec.md` §9 requires every write to go through a temp-file-then-rename
//! pattern so a crash leaves either the old or the new file, never a
//! half-written one. [`FileSystem::write_atomic`] is the single write
//! primitive every other component (the evidence cache, the artifact
//! emitter) builds on.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// File-system facade errors.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// The requested path does not exist.
    #[error("path not found: {0}")]
    NotFound(String),
    /// An I/O operation failed.
    #[error("io error at {path}: {source}")]
    Io {
        /// The path being operated on.
        path: String,
        /// The underlying I/O error, rendered as text (kept `'static` and
        /// `Send`/`Sync` friendly for use across facade implementations).
        source: String,
    },
}

/// Abstraction over the subset of file-system operations the pipeline
/// needs. Real code uses [`RealFileSystem`]; tests use [`InMemoryFileSystem`].
pub trait FileSystem {
    /// Returns whether a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Reads a file's full contents.
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the path is missing or unreadable.
    fn read(&self, path: &Path) -> Result<Vec<u8>, FileSystemError>;

    /// Creates a directory and all missing parents.
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if directory creation fails.
    fn create_dir_all(&self, path: &Path) -> Result<(), FileSystemError>;

    /// Writes `bytes` to `path` via a temp-file-then-rename so a crash
    /// mid-write leaves either the old file or the complete new one.
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the write or rename fails.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), FileSystemError>;

    /// Removes a directory and everything under it. Missing directories are
    /// not an error (mirrors `spec.md` §4.4: "partial directory state is
    /// treated as absent").
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if removal fails for a reason other than
    /// the directory being absent.
    fn remove_dir_all(&self, path: &Path) -> Result<(), FileSystemError>;

    /// Lists the immediate children of a directory. Returns an empty list
    /// for a missing directory.
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if listing fails for a reason other than
    /// the directory being absent.
    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError>;
}

/// The real file-system implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        std::fs::read(path).map_err(|err| io_error(path, &err))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        std::fs::create_dir_all(path).map_err(|err| io_error(path, &err))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), FileSystemError> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }
        let temp_path = sibling_temp_path(path);
        std::fs::write(&temp_path, bytes).map_err(|err| io_error(&temp_path, &err))?;
        std::fs::rename(&temp_path, path).map_err(|err| io_error(path, &err))?;
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(path, &err)),
        }
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError> {
        match std::fs::read_dir(path) {
            Ok(entries) => {
                let mut out = Vec::new();
                for entry in entries {
                    let entry = entry.map_err(|err| io_error(path, &err))?;
                    out.push(entry.path());
                }
                out.sort();
                Ok(out)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(io_error(path, &err)),
        }
    }
}

fn io_error(path: &Path, source: &std::io::Error) -> FileSystemError {
    FileSystemError::Io { path: path.display().to_string(), source: source.to_string() }
}

fn sibling_temp_path(path: &Path) -> PathBuf {
    let file_name = path.file_name().map_or_else(|| "tmp".to_string(), |name| name.to_string_lossy().to_string());
    let temp_name = format!(".{file_name}.tighten-tmp");
    path.with_file_name(temp_name)
}

/// An in-memory file system for tests, guarded by a single mutex — simple
/// and obviously correct, which matters more than fine-grained locking in a
/// test double.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl InMemoryFileSystem {
    /// Creates an empty in-memory file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        files.contains_key(path) || files.keys().any(|key| key.starts_with(path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        let files = self.files.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        files.get(path).cloned().ok_or_else(|| FileSystemError::NotFound(path.display().to_string()))
    }

    fn create_dir_all(&self, _path: &Path) -> Result<(), FileSystemError> {
        Ok(())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), FileSystemError> {
        let mut files = self.files.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        let mut files = self.files.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        files.retain(|key, _| !key.starts_with(path));
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError> {
        let files = self.files.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut children: Vec<PathBuf> = files
            .keys()
            .filter(|key| key.parent() == Some(path))
            .cloned()
            .collect();
        children.sort();
        Ok(children)
    }
}
