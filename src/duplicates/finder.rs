//! Content duplicate detection with a three-stage cascade.
//!
//! # Overview
//!
//! Each stage only looks at the survivors of the previous one, so file
//! content is read as little as possible:
//! 1. **Size partition**: bucket by size (see [`crate::duplicates::groups`])
//! 2. **Partial hash**: hash the first [`PARTIAL_HASH_SIZE`] bytes of files
//!    sharing a size and drop singleton buckets
//! 3. **Full hash**: hash the whole content of the remaining files; files
//!    sharing a full hash form a [`DuplicateGroup`]
//!
//! A file that cannot be opened or read is excluded from its bucket and
//! reported as a warning; it never aborts the run.
//!
//! Hash computations are independent per file and may run on a bounded
//! rayon pool. Results are collected in input order, so the grouping is the
//! same as with a single thread.
//!
//! # Example
//!
//! ```no_run
//! use shelf::duplicates::{find_content_duplicates, FinderConfig};
//! use shelf::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let records: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//!
//! let (groups, summary) = find_content_duplicates(records, &FinderConfig::default()).unwrap();
//! println!("{} groups, {} reclaimable", groups.len(), summary.reclaimable_display());
//! ```
//!
//! [`PARTIAL_HASH_SIZE`]: crate::scanner::PARTIAL_HASH_SIZE

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::{group_by_size, DetectionMode, DuplicateGroup};
use crate::progress::ProgressCallback;
use crate::scanner::{hash_to_hex, FileRecord, Hash, HashError, Hasher, ScanError};

/// Threshold for logging large files.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100MB

/// Configuration for the content cascade.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for hashing. `1` hashes strictly sequentially.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Create a new configuration with custom I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn hasher(&self) -> Hasher {
        match self.shutdown_flag {
            Some(ref flag) => Hasher::new().with_shutdown_flag(Arc::clone(flag)),
            None => Hasher::new(),
        }
    }
}

/// Statistics from the partial hash stage.
#[derive(Debug, Default)]
pub struct PartialHashStats {
    /// Total files that entered the stage
    pub input_files: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of files that failed to hash (I/O errors)
    pub failed_files: usize,
    /// Errors encountered during partial hashing
    pub errors: Vec<HashError>,
    /// Number of files eliminated with a unique partial hash
    pub unique_partials: usize,
    /// Number of files that could still be duplicates
    pub potential_duplicates: usize,
    /// Number of partial buckets with 2+ files
    pub duplicate_groups: usize,
    /// Whether the stage was interrupted by shutdown
    pub interrupted: bool,
}

impl PartialHashStats {
    /// Percentage of files eliminated by partial hash comparison.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let eliminated = self.input_files - self.potential_duplicates;
            (eliminated as f64 / self.input_files as f64) * 100.0
        }
    }
}

/// Statistics from the full hash stage.
#[derive(Debug, Default)]
pub struct FullHashStats {
    /// Total files that entered the stage
    pub input_files: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of files that failed to hash (I/O errors)
    pub failed_files: usize,
    /// Errors encountered during full hashing
    pub errors: Vec<HashError>,
    /// Total bytes hashed across all files
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of confirmed duplicate files (excluding one copy per group)
    pub duplicate_files: usize,
    /// Total space held by redundant copies
    pub wasted_space: u64,
    /// Whether the stage was interrupted by shutdown
    pub interrupted: bool,
}

impl FullHashStats {
    /// Fill the group-derived counters.
    pub fn calculate_wasted_space(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.wasted_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    }
}

/// Hash every file with `hash_fn`, on the configured pool.
///
/// The returned vector has the input order. `None` marks files skipped
/// because shutdown was requested.
fn hash_files<F>(
    files: Vec<FileRecord>,
    config: &FinderConfig,
    phase: &str,
    hash_fn: F,
) -> Vec<(FileRecord, Option<Result<Hash, HashError>>)>
where
    F: Fn(&Path) -> Result<Hash, HashError> + Sync,
{
    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(phase, files.len());
    }

    let process = |(idx, file): (usize, FileRecord)| {
        if config.is_shutdown_requested() {
            return (file, None);
        }
        if let Some(ref callback) = config.progress_callback {
            callback.on_progress(idx + 1, file.path.to_string_lossy().as_ref());
        }
        if file.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({} MB): {}",
                file.size / (1024 * 1024),
                file.path.display()
            );
        }
        let result = hash_fn(&file.path);
        match result {
            Ok(_) => {
                log::trace!("{} hash computed: {}", phase, file.path.display());
                if let Some(ref callback) = config.progress_callback {
                    callback.on_item_completed(file.size);
                }
            }
            Err(HashError::Interrupted(_)) => return (file, None),
            Err(ref e) => log::warn!("Failed to hash {}: {}", file.path.display(), e),
        }
        (file, Some(result))
    };

    let results = if config.io_threads <= 1 {
        files.into_iter().enumerate().map(process).collect()
    } else {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.io_threads)
            .build()
        {
            Ok(pool) => pool.install(|| files.into_par_iter().enumerate().map(&process).collect()),
            Err(e) => {
                log::warn!("Failed to create hashing thread pool ({}), hashing sequentially", e);
                files.into_iter().enumerate().map(process).collect()
            }
        }
    };

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(phase);
    }

    results
}

/// Group same-size files by partial hash (stage 2).
///
/// Buckets are keyed by `(size, partial hash)` so files of different sizes
/// never share a bucket, and only buckets with 2+ files are returned.
#[must_use]
pub fn phase2_partial_hash(
    size_groups: BTreeMap<u64, Vec<FileRecord>>,
    config: &FinderConfig,
) -> (BTreeMap<(u64, Hash), Vec<FileRecord>>, PartialHashStats) {
    let all_files: Vec<FileRecord> = size_groups.into_values().flatten().collect();
    let mut stats = PartialHashStats {
        input_files: all_files.len(),
        ..Default::default()
    };

    if all_files.is_empty() {
        log::debug!("Partial hash: No files to process");
        return (BTreeMap::new(), stats);
    }

    log::info!("Partial hash: hashing leading bytes of {} files", all_files.len());

    let hasher = config.hasher();
    let results = hash_files(all_files, config, "partial", |path| hasher.partial_hash(path));

    let mut buckets: BTreeMap<(u64, Hash), Vec<FileRecord>> = BTreeMap::new();
    for (file, result) in results {
        match result {
            None => stats.interrupted = true,
            Some(Ok(hash)) => {
                stats.hashed_files += 1;
                buckets.entry((file.size, hash)).or_default().push(file);
            }
            Some(Err(e)) => {
                stats.failed_files += 1;
                stats.errors.push(e);
            }
        }
    }

    let filtered: BTreeMap<(u64, Hash), Vec<FileRecord>> = buckets
        .into_iter()
        .filter(|((_, hash), files)| {
            if files.len() == 1 {
                stats.unique_partials += 1;
                log::trace!(
                    "Eliminated unique partial hash {}: {}",
                    hash_to_hex(hash),
                    files[0].path.display()
                );
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                true
            }
        })
        .collect();

    if stats.interrupted {
        log::info!("Partial hash: Interrupted by shutdown signal");
    }
    log::info!(
        "Partial hash complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.input_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (filtered, stats)
}

/// Confirm duplicates by full content hash (stage 3).
///
/// Returns groups sorted by hex hash; members keep the order in which they
/// reached this stage.
#[must_use]
pub fn phase3_full_hash(
    partial_groups: BTreeMap<(u64, Hash), Vec<FileRecord>>,
    config: &FinderConfig,
) -> (Vec<DuplicateGroup>, FullHashStats) {
    let all_files: Vec<FileRecord> = partial_groups.into_values().flatten().collect();
    let mut stats = FullHashStats {
        input_files: all_files.len(),
        ..Default::default()
    };

    if all_files.is_empty() {
        log::debug!("Full hash: No files to process");
        return (Vec::new(), stats);
    }

    log::info!("Full hash: hashing complete content of {} files", all_files.len());

    let hasher = config.hasher();
    let results = hash_files(all_files, config, "full", |path| hasher.full_hash(path));

    let mut by_hash: BTreeMap<Hash, Vec<FileRecord>> = BTreeMap::new();
    for (file, result) in results {
        match result {
            None => stats.interrupted = true,
            Some(Ok(hash)) => {
                stats.hashed_files += 1;
                stats.bytes_hashed += file.size;
                by_hash.entry(hash).or_default().push(file);
            }
            Some(Err(e)) => {
                stats.failed_files += 1;
                stats.errors.push(e);
            }
        }
    }

    let groups: Vec<DuplicateGroup> = by_hash
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(hash, files)| {
            let key = hash_to_hex(&hash);
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                key,
                files.len(),
                files[0].size
            );
            DuplicateGroup::new(key, DetectionMode::Content, files)
        })
        .collect();

    stats.calculate_wasted_space(&groups);

    log::info!(
        "Full hash complete: {} groups, {} duplicates, {} bytes reclaimable",
        stats.duplicate_groups,
        stats.duplicate_files,
        stats.wasted_space
    );

    (groups, stats)
}

/// Summary statistics from a detection run.
#[derive(Debug, Default)]
pub struct DetectionSummary {
    /// Total number of files considered
    pub total_files: usize,
    /// Total size of all considered files in bytes
    pub total_size: u64,
    /// Files sharing their size with another file ("partial matches")
    pub size_candidates: usize,
    /// Files sharing size and partial hash with another file
    pub partial_candidates: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of redundant files (one copy per group excluded)
    pub duplicate_files: usize,
    /// Space that removing the redundant copies would free
    pub reclaimable_space: u64,
    /// Files excluded because they could not be read
    pub failed_files: usize,
    /// Errors behind `failed_files`
    pub errors: Vec<HashError>,
    /// Errors reported by the file source
    pub scan_errors: Vec<ScanError>,
    /// Wall time of the detection
    pub duration: Duration,
}

impl DetectionSummary {
    /// Whether any per-file error occurred.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.failed_files > 0 || !self.scan_errors.is_empty()
    }

    /// Paths of files excluded because of hash errors.
    #[must_use]
    pub fn failed_paths(&self) -> Vec<PathBuf> {
        self.errors.iter().map(|e| e.path().to_path_buf()).collect()
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// A scan error prevented the run from starting.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Run the full content cascade over a set of records.
///
/// Permuting `records` yields the same groups (same keys and membership);
/// only the order of members inside a group follows the input order.
///
/// # Errors
///
/// Returns [`FinderError::Interrupted`] if shutdown was requested during
/// hashing. Per-file read failures are not errors; they are listed in the
/// summary.
pub fn find_content_duplicates(
    records: impl IntoIterator<Item = FileRecord>,
    config: &FinderConfig,
) -> Result<(Vec<DuplicateGroup>, DetectionSummary), FinderError> {
    let start = Instant::now();

    let (size_groups, size_stats) = group_by_size(records);
    let (partial_groups, partial_stats) = phase2_partial_hash(size_groups, config);
    if partial_stats.interrupted || config.is_shutdown_requested() {
        return Err(FinderError::Interrupted);
    }
    let partial_candidates = partial_stats.potential_duplicates;
    let (groups, full_stats) = phase3_full_hash(partial_groups, config);
    if full_stats.interrupted || config.is_shutdown_requested() {
        return Err(FinderError::Interrupted);
    }

    let mut errors = partial_stats.errors;
    errors.extend(full_stats.errors);

    let summary = DetectionSummary {
        total_files: size_stats.total_files,
        total_size: size_stats.total_size,
        size_candidates: size_stats.potential_duplicates,
        partial_candidates,
        duplicate_groups: full_stats.duplicate_groups,
        duplicate_files: full_stats.duplicate_files,
        reclaimable_space: full_stats.wasted_space,
        failed_files: partial_stats.failed_files + full_stats.failed_files,
        errors,
        scan_errors: Vec::new(),
        duration: start.elapsed(),
    };

    Ok((groups, summary))
}
