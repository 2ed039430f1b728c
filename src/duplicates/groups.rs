//! Duplicate groups and size-based file organization.
//!
//! # Overview
//!
//! This module provides the [`DuplicateGroup`] emitted by both detectors
//! and the size partition that opens the content cascade.
//!
//! ## Size Partition
//!
//! Files with different lengths cannot be duplicates, so the cascade first
//! buckets records by exact size and drops every bucket holding a single
//! file. No file content is read in this stage.
//!
//! # Example
//!
//! ```
//! use shelf::scanner::FileRecord;
//! use shelf::duplicates::group_by_size;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048, SystemTime::now()),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::DetectionMode;
use crate::scanner::FileRecord;

/// A set of files found equivalent by one detector.
///
/// For content groups `key` is the hex full-content hash; for name groups
/// it is the canonical filename. Detectors only emit groups with two or
/// more members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Equivalence key shared by every member
    pub key: String,
    /// Detector that produced this group
    pub kind: DetectionMode,
    /// Members in the order they were supplied to the detector
    pub members: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(key: impl Into<String>, kind: DetectionMode, members: Vec<FileRecord>) -> Self {
        Self {
            key: key.into(),
            kind,
            members,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.members.iter().map(|f| f.size).sum()
    }

    /// Size shared by content duplicates (the first member's size otherwise).
    #[must_use]
    pub fn size(&self) -> u64 {
        self.members.first().map_or(0, |f| f.size)
    }

    /// Space held by all copies except the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        if self.members.len() > 1 {
            self.total_size().saturating_sub(self.members[0].size)
        } else {
            0
        }
    }

    /// Number of redundant copies (total - 1).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Paths of the files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|f| f.path.clone()).collect()
    }

    /// Whether a file with this path is a member.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|f| f.path == path)
    }
}

/// Statistics from the size partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton buckets)
    pub eliminated_unique: usize,
    /// Number of zero-length files encountered
    pub empty_files: usize,
    /// Number of size buckets with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (first stage of content detection).
///
/// Zero-length files form an ordinary bucket: they all have the same
/// (empty) content and are reported as duplicates of each other.
///
/// # Returns
///
/// A tuple of:
/// - `BTreeMap<u64, Vec<FileRecord>>` - Buckets with 2+ files, ordered by size;
///   each bucket keeps the input order of its files
/// - `GroupingStats` - Statistics about the grouping operation
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileRecord>,
) -> (BTreeMap<u64, Vec<FileRecord>>, GroupingStats) {
    let mut all_groups: BTreeMap<u64, Vec<FileRecord>> = BTreeMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        if file.size == 0 {
            stats.empty_files += 1;
            log::debug!("Empty file encountered: {}", file.path.display());
        }
        all_groups.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = all_groups.len();

    let filtered_groups: BTreeMap<u64, Vec<FileRecord>> = all_groups
        .into_iter()
        .filter(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    size,
                    files[0].path.display()
                );
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size group {} bytes: {} potential duplicates",
                    size,
                    files.len()
                );
                true
            }
        })
        .collect();

    log::info!(
        "Size partition complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (filtered_groups, stats)
}
