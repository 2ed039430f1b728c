//! Applying the chosen fate to every redundant copy.
//!
//! Each [`SpareDecision`] is processed in order and every member except the
//! spared one receives the fate:
//! - `report`: nothing is touched; rendering is left to [`crate::output`]
//! - `quarantine`: moved into `<root>/<quarantine_dir>/group_<n>/`
//! - `remove`: permanently deleted once the run has been confirmed
//!
//! A failure on one file is logged and recorded in the [`FateSummary`];
//! processing continues with the next file. Nothing is rolled back.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;
use serde::Serialize;

use super::confirm::Confirm;
use super::delete::{delete_verified, validate_preserves_copy, DeleteResult, FileSnapshot};
use super::quarantine::{MoveResult, Quarantine};
use super::FateError;
use crate::config::{suggest, ConfigError};
use crate::duplicates::SpareDecision;
use crate::scanner::{FileIdentity, FileRecord};

/// Disposition of redundant copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fate {
    /// List the groups, touch nothing
    #[default]
    Report,
    /// Move redundant copies into the holding directory
    Quarantine,
    /// Delete redundant copies permanently
    Remove,
}

impl Fate {
    const NAMES: [&'static str; 3] = ["report", "quarantine", "remove"];

    /// Whether this fate changes the filesystem.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::Report)
    }
}

impl fmt::Display for Fate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report => write!(f, "report"),
            Self::Quarantine => write!(f, "quarantine"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

impl FromStr for Fate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "report" => Ok(Self::Report),
            "quarantine" => Ok(Self::Quarantine),
            "remove" => Ok(Self::Remove),
            _ => Err(ConfigError::UnknownFate {
                value: s.to_string(),
                suggestion: suggest(s, &Self::NAMES),
            }),
        }
    }
}

/// A file the fate could not be applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FateFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a fate application run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FateSummary {
    /// Spared files, one per processed group
    pub kept: Vec<PathBuf>,
    /// Files moved into quarantine
    pub moved: Vec<MoveResult>,
    /// Files permanently deleted
    pub deleted: Vec<DeleteResult>,
    /// Files left in place because of an error
    pub failures: Vec<FateFailure>,
    /// Bytes removed from the scanned tree
    pub bytes_freed: u64,
    /// Whether processing stopped on an interrupt
    pub interrupted: bool,
}

impl FateSummary {
    /// Check if any file failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn fail(&mut self, path: &Path, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Skipping {}: {}", path.display(), message);
        self.failures.push(FateFailure {
            path: path.to_path_buf(),
            message,
        });
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self, fate: Fate) -> String {
        let verb = match fate {
            Fate::Report => return format!("Reported {} group(s), nothing changed", self.kept.len()),
            Fate::Quarantine => format!("Quarantined {} file(s)", self.moved.len()),
            Fate::Remove => format!("Deleted {} file(s)", self.deleted.len()),
        };
        let failed = if self.has_failures() {
            format!(", {} failed", self.failures.len())
        } else {
            String::new()
        };
        format!("{verb}{failed}, freed {}", ByteSize(self.bytes_freed))
    }
}

const SAME_FILE_AS_SPARED: &str = "same file as the spared copy";

/// Whether `record` is another path to the spared file.
fn resolves_to(record: &FileRecord, spared: Option<FileIdentity>) -> bool {
    spared.is_some() && FileIdentity::of(&record.path) == spared
}

/// Applies a [`Fate`] to spare decisions.
#[derive(Debug, Clone)]
pub struct FateApplicator {
    fate: Fate,
    quarantine: Quarantine,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl FateApplicator {
    /// Applicator for a scan of `root`; quarantined files go to
    /// `root/quarantine_dir`.
    #[must_use]
    pub fn new(fate: Fate, root: &Path, quarantine_dir: &str) -> Self {
        Self {
            fate,
            quarantine: Quarantine::new(root, quarantine_dir),
            shutdown_flag: None,
        }
    }

    /// Stop between files once the flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The fate being applied.
    #[must_use]
    pub fn fate(&self) -> Fate {
        self.fate
    }

    /// Holding directory used by the quarantine fate.
    #[must_use]
    pub fn quarantine_dir(&self) -> &Path {
        self.quarantine.dir()
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Apply the fate to every decision.
    ///
    /// For [`Fate::Remove`] the gate is asked once, before the first
    /// deletion; it is not consulted when there is nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate refuses or the holding directory cannot
    /// be created. Per-file failures are recorded in the summary instead.
    pub fn apply(
        &self,
        decisions: &[SpareDecision],
        gate: &mut dyn Confirm,
    ) -> Result<FateSummary, FateError> {
        let mut summary = FateSummary::default();
        let has_redundant = decisions.iter().any(|d| d.redundant().next().is_some());

        match self.fate {
            Fate::Report => {}
            Fate::Quarantine if has_redundant => {
                self.quarantine
                    .ensure_exists()
                    .map_err(|source| FateError::QuarantineDir {
                        path: self.quarantine.dir().to_path_buf(),
                        source,
                    })?;
            }
            Fate::Remove if has_redundant => gate.confirm()?,
            Fate::Quarantine | Fate::Remove => {}
        }

        for (index, decision) in decisions.iter().enumerate() {
            if self.is_shutdown_requested() {
                summary.interrupted = true;
                break;
            }
            summary.kept.push(decision.spared.path.clone());
            match self.fate {
                Fate::Report => {}
                Fate::Quarantine => self.quarantine_group(decision, index + 1, &mut summary),
                Fate::Remove => self.remove_group(decision, &mut summary),
            }
        }

        log::info!("{}", summary.summary(self.fate));
        Ok(summary)
    }

    fn quarantine_group(&self, decision: &SpareDecision, group_index: usize, summary: &mut FateSummary) {
        let spared = FileIdentity::of(&decision.spared.path);
        for record in decision.redundant() {
            if self.is_shutdown_requested() {
                summary.interrupted = true;
                return;
            }
            if resolves_to(record, spared) {
                summary.fail(&record.path, SAME_FILE_AS_SPARED);
                continue;
            }
            match self.quarantine.move_into(record, group_index) {
                Ok(moved) => {
                    summary.bytes_freed += moved.size;
                    summary.moved.push(moved);
                }
                Err(e) => summary.fail(&record.path, format!("failed to move: {e}")),
            }
        }
    }

    fn remove_group(&self, decision: &SpareDecision, summary: &mut FateSummary) {
        let selected: Vec<PathBuf> = decision.redundant().map(|r| r.path.clone()).collect();
        if let Err(e) = validate_preserves_copy(&selected, &decision.group.paths()) {
            for path in &selected {
                summary.fail(path, e.to_string());
            }
            return;
        }
        if let Err(e) = FileSnapshot::capture(&decision.spared.path) {
            for path in &selected {
                summary.fail(path, format!("spared copy unavailable ({e})"));
            }
            return;
        }

        let spared = FileIdentity::of(&decision.spared.path);
        for record in decision.redundant() {
            if self.is_shutdown_requested() {
                summary.interrupted = true;
                return;
            }
            if resolves_to(record, spared) {
                summary.fail(&record.path, SAME_FILE_AS_SPARED);
                continue;
            }
            match delete_verified(record) {
                Ok(deleted) => {
                    summary.bytes_freed += deleted.size;
                    summary.deleted.push(deleted);
                }
                Err(e) => summary.fail(&record.path, e.to_string()),
            }
        }
    }
}
