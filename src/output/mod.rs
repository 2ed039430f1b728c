//! Output formatters for duplicate resolution runs.
//!
//! This module provides different output formats for run results:
//! - Text for humans, coloured with yansi
//! - JSON for automation and scripting
//!
//! Both render the same [`RunReport`].
//!
//! # Example
//!
//! ```no_run
//! use shelf::output::{ReportSummary, RunReport, TextOutput};
//! # use shelf::duplicates::{DetectionMode, SparePolicy};
//! # use shelf::actions::Fate;
//! use std::path::Path;
//!
//! # let decisions: Vec<shelf::duplicates::SpareDecision> = Vec::new();
//! let report = RunReport {
//!     root: Path::new("."),
//!     mode: DetectionMode::Content,
//!     policy: SparePolicy::Oldest,
//!     fate: Fate::Report,
//!     decisions: &decisions,
//!     summary: ReportSummary::default(),
//!     outcome: None,
//! };
//! TextOutput::new(&report).write_to(&mut std::io::stdout(), false).unwrap();
//! ```

pub mod json;
pub mod text;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::actions::{Fate, FateSummary};
use crate::config::{suggest, ConfigError};
use crate::duplicates::{DetectionMode, DetectionSummary, NamedSummary, SpareDecision, SparePolicy};

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

/// Report format written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// A single JSON document
    Json,
}

impl OutputFormat {
    const NAMES: [&'static str; 2] = ["text", "json"];
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnknownOutput {
                value: s.to_string(),
                suggestion: suggest(s, &Self::NAMES),
            }),
        }
    }
}

/// Detector-independent run statistics.
///
/// Counters that only one detector produces are `None` for the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_files: usize,
    /// Files sharing their size with another file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_candidates: Option<usize>,
    /// Files sharing size and partial hash with another file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_candidates: Option<usize>,
    /// Files whose name carries a numbering suffix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbered_files: Option<usize>,
    pub duplicate_groups: usize,
    pub duplicate_files: usize,
    pub reclaimable_space: u64,
    pub failed_files: usize,
    /// Groups left alone because no spare could be chosen
    pub skipped_groups: usize,
    pub duration_ms: u64,
}

impl From<&DetectionSummary> for ReportSummary {
    fn from(summary: &DetectionSummary) -> Self {
        Self {
            total_files: summary.total_files,
            size_candidates: Some(summary.size_candidates),
            partial_candidates: Some(summary.partial_candidates),
            numbered_files: None,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            failed_files: summary.failed_files + summary.scan_errors.len(),
            skipped_groups: 0,
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl From<&NamedSummary> for ReportSummary {
    fn from(summary: &NamedSummary) -> Self {
        Self {
            total_files: summary.total_files,
            size_candidates: None,
            partial_candidates: None,
            numbered_files: Some(summary.numbered_files),
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            failed_files: 0,
            skipped_groups: 0,
            duration_ms: 0,
        }
    }
}

/// Everything a formatter needs to render one run.
#[derive(Debug, Clone)]
pub struct RunReport<'a> {
    /// Scanned root; paths are shown relative to it
    pub root: &'a Path,
    pub mode: DetectionMode,
    pub policy: SparePolicy,
    pub fate: Fate,
    pub decisions: &'a [SpareDecision],
    pub summary: ReportSummary,
    /// Result of applying the fate, absent if it was never applied
    pub outcome: Option<&'a FateSummary>,
}

impl RunReport<'_> {
    /// `path` relative to the scanned root when it lies beneath it.
    #[must_use]
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}
