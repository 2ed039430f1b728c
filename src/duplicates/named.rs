//! Numbered-variant filename detection.
//!
//! Copying a file over an existing name commonly produces `report (1).pdf`,
//! `report (2).pdf` and so on. This detector groups such variants with
//! their canonical file (`report.pdf`) without reading any content.
//!
//! A stem is numbered when it ends with one or more `" (N)"` suffixes, N
//! being decimal digits. Only the final extension is split off, so
//! `v1.2 (3).txt` has the base `v1.2`. Grouping is by the exact canonical
//! name: `report-final.pdf` never joins `report.pdf`. Names that are not
//! valid UTF-8 cannot be classified and are left out of every group.
//!
//! # Example
//!
//! ```
//! use shelf::duplicates::canonical_name;
//!
//! assert_eq!(canonical_name("photo (2).jpg"), (true, "photo.jpg".to_string()));
//! assert_eq!(canonical_name("photo (draft).jpg"), (false, "photo (draft).jpg".to_string()));
//! ```

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::{DetectionMode, DuplicateGroup};
use crate::scanner::FileRecord;

static NUMBERED_STEM: OnceLock<Regex> = OnceLock::new();

fn numbered_stem() -> &'static Regex {
    NUMBERED_STEM.get_or_init(|| {
        Regex::new(r"^(.*?)( \(\d+\))+$").expect("numbered stem pattern is valid")
    })
}

/// Split a filename into stem and final extension (without the dot).
///
/// A leading dot is part of the stem, so `.bashrc` has no extension.
fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => (&filename[..idx], Some(&filename[idx + 1..])),
        _ => (filename, None),
    }
}

/// Classify a filename.
///
/// Returns whether it is a numbered variant and its canonical name. The
/// name is normalised to NFC first; a file that is not numbered is its own
/// canonical name.
#[must_use]
pub fn canonical_name(filename: &str) -> (bool, String) {
    let normalized: String = filename.nfc().collect();
    let (stem, extension) = split_extension(&normalized);

    let Some(captures) = numbered_stem().captures(stem) else {
        return (false, normalized);
    };
    let base = captures.get(1).map_or("", |m| m.as_str()).trim();
    if base.is_empty() {
        return (false, normalized);
    }

    let canonical = match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base.to_string(),
    };
    (true, canonical)
}

/// A file record annotated by the name detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedVariant {
    pub record: FileRecord,
    /// Whether the filename carries a numbering suffix
    pub is_numbered: bool,
    /// Filename with the numbering suffix removed
    pub canonical_base: String,
}

impl NamedVariant {
    /// Classify a record by its filename.
    #[must_use]
    pub fn from_record(record: FileRecord) -> Self {
        let (is_numbered, canonical_base) = canonical_name(&record.filename);
        Self {
            record,
            is_numbered,
            canonical_base,
        }
    }
}

/// Statistics from a name detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedSummary {
    /// Total number of files considered
    pub total_files: usize,
    /// Files whose name carries a numbering suffix
    pub numbered_files: usize,
    /// Number of groups with 2+ members
    pub duplicate_groups: usize,
    /// Members beyond the first in each group
    pub duplicate_files: usize,
    /// Space held by those members
    pub reclaimable_space: u64,
}

/// Group records that are numbered variants of a common canonical name.
///
/// The canonical file joins its group when present. Groups are sorted by
/// canonical name; members keep input order. Groups may span directories
/// when the records come from a recursive scan.
#[must_use]
pub fn find_named_duplicates(
    records: impl IntoIterator<Item = FileRecord>,
) -> (Vec<DuplicateGroup>, NamedSummary) {
    let mut summary = NamedSummary::default();
    let mut by_name: BTreeMap<String, Vec<FileRecord>> = BTreeMap::new();

    for record in records {
        summary.total_files += 1;
        if record.path.file_name().and_then(OsStr::to_str).is_none() {
            log::warn!(
                "Skipping name check for {}: file name is not valid UTF-8",
                record.path.display()
            );
            continue;
        }
        let variant = NamedVariant::from_record(record);
        if variant.is_numbered {
            summary.numbered_files += 1;
            log::trace!(
                "Numbered variant {} of {}",
                variant.record.path.display(),
                variant.canonical_base
            );
        }
        by_name
            .entry(variant.canonical_base)
            .or_default()
            .push(variant.record);
    }

    let groups: Vec<DuplicateGroup> = by_name
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(name, members)| {
            log::debug!("Name group {}: {} files", name, members.len());
            DuplicateGroup::new(name, DetectionMode::Name, members)
        })
        .collect();

    summary.duplicate_groups = groups.len();
    summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
    summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();

    log::info!(
        "Name detection complete: {} files, {} numbered, {} groups",
        summary.total_files,
        summary.numbered_files,
        summary.duplicate_groups
    );

    (groups, summary)
}
