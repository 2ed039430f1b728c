//! On-disk identity of scanned files.
//!
//! Two paths can name the same data: hard links share an inode, and a
//! followed symlink resolves to its target. Such paths are one file, never
//! duplicates of each other, and removing one of them must not count as
//! keeping a copy. [`IdentityTracker`] lets the walker emit each file once;
//! [`FileIdentity::of`] lets the fate applicator refuse to touch a path that
//! resolves to the spared file.
//!
//! Identity is `(device, inode)` on Unix. Other platforms report no
//! identity, so every path is treated as a distinct file there.

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::Path;

/// Device and inode of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    /// Identity from metadata, if the platform exposes one.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }

    /// Identity of whatever `path` resolves to, following symlinks.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        std::fs::metadata(path)
            .ok()
            .and_then(|m| Self::from_metadata(&m))
    }
}

/// Remembers which files a walk has already produced.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    seen: HashSet<FileIdentity>,
}

impl IdentityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `metadata` and report whether its file is new to this walk.
    ///
    /// Always `true` where no identity is available.
    pub fn first_sighting(&mut self, metadata: &Metadata) -> bool {
        match FileIdentity::from_metadata(metadata) {
            Some(identity) => self.seen.insert(identity),
            None => true,
        }
    }

    /// Number of distinct files recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
