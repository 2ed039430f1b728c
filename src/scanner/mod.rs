//! Scanner module for file enumeration and content hashing.
//!
//! This module provides functionality for:
//! - Flat or recursive directory walking using walkdir
//! - Partial and full content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal producing [`FileRecord`]s
//! - [`hasher`]: BLAKE3 file hashing (bounded prefix and streaming full content)
//! - [`identity`]: device/inode identity so hard links and followed symlinks count once
//!
//! # Example
//!
//! ```no_run
//! use shelf::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     recursive: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod identity;
pub mod walker;

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

// Re-export main types
pub use hasher::{hash_to_hex, Hash, Hasher, PARTIAL_HASH_SIZE};
pub use identity::{FileIdentity, IdentityTracker};
pub use walker::Walker;

/// Metadata for a discovered file.
///
/// Records are captured once by the file source and never mutated
/// afterwards; every later stage works on these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path to the file, absolute or relative to the working directory
    pub path: PathBuf,
    /// Final path component
    pub filename: String,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    #[serde(serialize_with = "serialize_modified")]
    pub modified: SystemTime,
}

impl FileRecord {
    /// Create a new FileRecord. The filename is derived from the path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            filename,
            size,
            modified,
        }
    }

    /// Build a record from already-fetched metadata.
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Self::new(path, metadata.len(), modified)
    }

    /// Build a record by reading the file's current metadata.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if the metadata cannot be read or the path
    /// is not a regular file.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let metadata = std::fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(ScanError::NotAFile(path.to_path_buf()));
        }
        Ok(Self::from_metadata(path.to_path_buf(), &metadata))
    }
}

fn serialize_modified<S>(modified: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let datetime: chrono::DateTime<chrono::Utc> = (*modified).into();
    serializer.serialize_str(&datetime.to_rfc3339())
}

/// Configuration for directory walking.
///
/// Controls depth, filtering and symlink handling.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into subdirectories. A flat walk only lists the root's files.
    pub recursive: bool,

    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Directory names that are never descended into (e.g. the quarantine
    /// directory of a previous run).
    pub exclude_dirs: Vec<String>,
}

impl WalkerConfig {
    /// Create a new configuration from CLI arguments.
    ///
    /// # Arguments
    ///
    /// * `recursive` - Whether to descend into subdirectories
    /// * `follow_symlinks` - Whether to follow symbolic links
    /// * `skip_hidden` - Whether to skip hidden files
    #[must_use]
    pub fn new(recursive: bool, follow_symlinks: bool, skip_hidden: bool) -> Self {
        Self {
            recursive,
            follow_symlinks,
            skip_hidden,
            exclude_dirs: Vec::new(),
        }
    }

    /// Never descend into a directory with this name.
    #[must_use]
    pub fn with_excluded_dir(mut self, name: impl Into<String>) -> Self {
        self.exclude_dirs.push(name.into());
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The specified path is not a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The file this error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
