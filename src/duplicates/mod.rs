//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (content stage 1)
//! - Partial hash comparison (content stage 2)
//! - Full hash comparison (content stage 3)
//! - Numbered-variant name detection
//! - Choosing the spared member of each group
//!
//! The content and name detectors are alternative strategies; a run uses
//! exactly one of them, selected by [`DetectionMode`].

pub mod finder;
pub mod groups;
pub mod named;
pub mod spare;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{suggest, ConfigError};

pub use finder::{
    find_content_duplicates, phase2_partial_hash, phase3_full_hash, DetectionSummary,
    FinderConfig, FinderError, FullHashStats, PartialHashStats,
};
pub use groups::{group_by_size, DuplicateGroup, GroupingStats};
pub use named::{canonical_name, find_named_duplicates, NamedSummary, NamedVariant};
pub use spare::{
    LiveMetadata, MetadataProbe, ProbedAttributes, RecordedMetadata, SelectError, SpareDecision,
    SparePolicy, SpareSelector,
};

/// Strategy used to decide that two files are duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Byte-identical content (size → partial hash → full hash)
    #[default]
    Content,
    /// Numbered filename variants of a common base name
    Name,
}

impl DetectionMode {
    const NAMES: [&'static str; 2] = ["content", "name"];
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Name => write!(f, "name"),
        }
    }
}

impl FromStr for DetectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "content" | "hash" => Ok(Self::Content),
            "name" | "named" => Ok(Self::Name),
            _ => Err(ConfigError::UnknownMode {
                value: s.to_string(),
                suggestion: suggest(s, &Self::NAMES),
            }),
        }
    }
}
