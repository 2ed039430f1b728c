//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, the file source of the
//! detection pipeline. It lists the regular files under a root, either
//! flat (the root's own files) or recursively, and captures a
//! [`FileRecord`] for each one.
//!
//! # Features
//!
//! - Flat or recursive traversal
//! - Deterministic order (entries sorted by file name per directory)
//! - Hidden file filtering and excluded directory names
//! - Configurable symlink following
//! - Each file emitted once, however many hard links or followed symlinks
//!   lead to it
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use shelf::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{FileRecord, IdentityTracker, ScanError, WalkerConfig};

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Root directory of this walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check the root before walking.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `NotADirectory` for an unusable root.
    pub fn validate_root(&self) -> Result<(), ScanError> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(ScanError::NotADirectory(self.root.clone()))
        }
    }

    /// Whether an entry (file or directory) is pruned before it is visited.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if self.config.skip_hidden && name.starts_with('.') {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            return true;
        }
        if entry.file_type().is_dir() && self.config.exclude_dirs.iter().any(|d| *d == name) {
            log::debug!("Skipping excluded directory: {}", entry.path().display());
            return true;
        }
        false
    }

    /// Walk the directory, yielding file records.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration, so one unreadable entry never aborts the scan.
    ///
    /// A path that resolves to an already emitted file (a hard link, or a
    /// followed symlink and its target) is skipped; the first one in walk
    /// order is kept.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let mut tracker = IdentityTracker::new();

        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded(entry))
            .map_while(move |entry_result| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    return None;
                }
                Some(entry_result)
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(&entry, &mut tracker),
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    fn process_entry(
        &self,
        entry: &DirEntry,
        tracker: &mut IdentityTracker,
    ) -> Option<Result<FileRecord, ScanError>> {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return None;
        }
        if file_type.is_symlink() {
            // Only reachable when links are not followed.
            log::trace!("Skipping symlink: {}", entry.path().display());
            return None;
        }

        let path = entry.path().to_path_buf();
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walk_error(e))),
        };
        if !metadata.is_file() {
            log::trace!("Skipping non-regular file: {}", path.display());
            return None;
        }
        if !tracker.first_sighting(&metadata) {
            log::debug!("Skipping second path to an already listed file: {}", path.display());
            return None;
        }

        Some(Ok(FileRecord::from_metadata(path, &metadata)))
    }

    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.into_io_error() {
            Some(io_error) => ScanError::from_io(&path, io_error),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("filesystem loop detected"),
            },
        }
    }
}
