//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the shelf binary.
///
/// - 0: Success (duplicates found and handled)
/// - 1: General error (invalid configuration, unreadable root, cancelled deletion)
/// - 2: No duplicates found
/// - 3: Partial success (some files could not be read, moved or deleted)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were found and the fate was applied.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// The run completed without finding duplicates.
    NoDuplicates = 2,
    /// The run completed but some files failed along the way.
    PartialSuccess = 3,
    /// Interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "SH000",
            Self::GeneralError => "SH001",
            Self::NoDuplicates => "SH002",
            Self::PartialSuccess => "SH003",
            Self::Interrupted => "SH130",
        }
    }

    /// Exit code for a run that failed with `err`.
    ///
    /// Interrupts surface as [`ExitCode::Interrupted`], everything else is a
    /// general error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        use crate::actions::FateError;
        use crate::duplicates::FinderError;

        let interrupted = err
            .downcast_ref::<FinderError>()
            .is_some_and(|e| matches!(e, FinderError::Interrupted))
            || err
                .downcast_ref::<FateError>()
                .is_some_and(|e| matches!(e, FateError::Interrupted));
        if interrupted {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "SH001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
