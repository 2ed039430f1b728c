//! File actions module.
//!
//! This module provides functionality for:
//! - Applying a fate (report, quarantine, remove) to redundant copies
//! - Moving copies into a holding directory
//! - Permanent deletion behind a typed confirmation phrase
//!
//! ```no_run
//! use shelf::actions::{pick_phrase, Fate, FateApplicator, PhrasePrompt};
//! use std::io;
//! use std::path::Path;
//!
//! # let decisions: Vec<shelf::duplicates::SpareDecision> = Vec::new();
//! let applicator = FateApplicator::new(Fate::Remove, Path::new("."), "__duplicates__");
//! let mut gate = PhrasePrompt::new(pick_phrase(&mut rand::thread_rng()), io::stdin().lock(), io::stdout());
//! let summary = applicator.apply(&decisions, &mut gate).unwrap();
//! println!("{}", summary.summary(applicator.fate()));
//! ```

pub mod confirm;
pub mod delete;
pub mod fate;
pub mod quarantine;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// Re-export commonly used types
pub use confirm::{pick_phrase, Confirm, PhrasePrompt, CONFIRMATION_PHRASES};
pub use delete::{
    delete_verified, permanent_delete, validate_preserves_copy, DeleteError, DeleteResult,
    FileSnapshot,
};
pub use fate::{Fate, FateApplicator, FateFailure, FateSummary};
pub use quarantine::{unique_destination, MoveResult, Quarantine};

/// Errors that stop a fate from being applied at all.
#[derive(Debug, Error)]
pub enum FateError {
    /// The holding directory could not be created.
    #[error("cannot create quarantine directory {path}: {source}")]
    QuarantineDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Input ended before the confirmation phrase was typed.
    #[error("deletion cancelled: confirmation phrase was not entered")]
    ConfirmationCancelled,

    /// Reading the answer or writing the prompt failed.
    #[error("confirmation prompt failed: {0}")]
    Prompt(#[source] io::Error),

    /// Interrupted by user.
    #[error("interrupted by user")]
    Interrupted,
}
