//! Moving redundant copies into a holding directory.
//!
//! The holding directory lives under the scanned root (`__duplicates__` by
//! default) and gets one `group_<n>` subdirectory per duplicate group, so
//! copies that share a filename do not collide. If a destination already
//! exists, for example from an earlier run, a ` (k)` suffix is added to the
//! new name instead of overwriting it.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::FileRecord;

/// A file moved into quarantine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    pub from: PathBuf,
    pub to: PathBuf,
    pub size: u64,
}

/// Holding directory for quarantined files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quarantine {
    dir: PathBuf,
}

impl Quarantine {
    /// Holding directory `name` under `root`.
    #[must_use]
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            dir: root.join(name),
        }
    }

    /// Path of the holding directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Subdirectory for the `index`-th group (1-based).
    #[must_use]
    pub fn group_dir(&self, index: usize) -> PathBuf {
        self.dir.join(format!("group_{index}"))
    }

    /// Create the holding directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be created.
    pub fn ensure_exists(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Move `record` into the subdirectory of group `group_index`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the directory creation or the rename. The
    /// source file is left in place on failure.
    pub fn move_into(&self, record: &FileRecord, group_index: usize) -> io::Result<MoveResult> {
        let target_dir = self.group_dir(group_index);
        fs::create_dir_all(&target_dir)?;

        let filename = record
            .path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
        let to = unique_destination(&target_dir, filename);
        relocate(&record.path, &to)?;

        log::debug!("Quarantined: {} -> {}", record.path.display(), to.display());
        Ok(MoveResult {
            from: record.path.clone(),
            to,
            size: record.size,
        })
    }
}

/// Rename `from` to `to`, copying across filesystems when a rename cannot.
fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!("{} is on another filesystem, copying", from.display());
            if let Err(copy_err) = fs::copy(from, to).and_then(|_| fs::File::open(to)?.sync_all()) {
                let _ = fs::remove_file(to);
                return Err(copy_err);
            }
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}

/// First free path for `filename` inside `dir`.
///
/// `name.ext` becomes `name (1).ext`, `name (2).ext`, ... while taken. The
/// name is kept byte for byte, so names that are not valid UTF-8 survive.
#[must_use]
pub fn unique_destination(dir: &Path, filename: impl AsRef<OsStr>) -> PathBuf {
    let filename = Path::new(filename.as_ref());
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let stem = filename.file_stem().unwrap_or(filename.as_os_str());
    let extension = filename.extension();
    (1..)
        .map(|k| {
            let mut name = OsString::from(stem);
            name.push(format!(" ({k})"));
            if let Some(ext) = extension {
                name.push(".");
                name.push(ext);
            }
            dir.join(name)
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
