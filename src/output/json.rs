//! JSON output formatter for duplicate resolution runs.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "mode": "content",
//!   "policy": "oldest",
//!   "fate": "report",
//!   "groups": [
//!     {
//!       "key": "abc123...",
//!       "size": 1024,
//!       "members": [
//!         {"path": "a.txt", "filename": "a.txt", "size": 1024, "modified": "2024-01-01T00:00:00Z"}
//!       ],
//!       "spared": "a.txt"
//!     }
//!   ],
//!   "summary": {"total_files": 100, "duplicate_groups": 5, "...": "..."},
//!   "outcome": null,
//!   "exit_code": 0,
//!   "exit_code_name": "SH000"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::{ReportSummary, RunReport};
use crate::actions::{Fate, FateSummary};
use crate::duplicates::{DetectionMode, SparePolicy};
use crate::error::ExitCode;
use crate::scanner::FileRecord;

/// A single group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Full-content hash (content mode) or canonical filename (name mode)
    pub key: String,
    /// Size of the first member in bytes
    pub size: u64,
    pub members: Vec<FileRecord>,
    /// Path of the spared member
    pub spared: String,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    pub mode: DetectionMode,
    pub policy: SparePolicy,
    pub fate: Fate,
    pub groups: Vec<JsonGroup>,
    pub summary: &'a ReportSummary,
    pub outcome: Option<&'a FateSummary>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "SH000")
    pub exit_code_name: &'static str,
}

impl<'a> JsonOutput<'a> {
    /// Create a JSON document from a run report and its exit code.
    #[must_use]
    pub fn new(report: &'a RunReport<'a>, exit_code: ExitCode) -> Self {
        let groups = report
            .decisions
            .iter()
            .map(|decision| JsonGroup {
                key: decision.group.key.clone(),
                size: decision.group.size(),
                members: decision.group.members.clone(),
                spared: decision.spared.path.to_string_lossy().into_owned(),
            })
            .collect();

        Self {
            mode: report.mode,
            policy: report.policy,
            fate: report.fate,
            groups,
            summary: &report.summary,
            outcome: report.outcome,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
