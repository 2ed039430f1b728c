//! Choosing the one member of a duplicate group that is kept.
//!
//! Every group gets exactly one spared member. The comparative policies
//! (`oldest`, `newest`, `biggest`, `smallest`) read metadata through a
//! [`MetadataProbe`] and keep the first member at an equal extreme, so the
//! choice only depends on metadata and member order.
//!
//! `first` keeps the first member in input order. That order comes from the
//! directory listing and is not portable across platforms or filesystems.
//! `random` picks uniformly using the caller's random number generator.

use std::fmt;
use std::fs;
use std::io;
use std::str::FromStr;
use std::time::SystemTime;

use rand::Rng;
use serde::Serialize;

use super::DuplicateGroup;
use crate::config::{suggest, ConfigError};
use crate::scanner::FileRecord;

/// Rule used to pick the spared member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SparePolicy {
    /// Earliest modification time
    #[default]
    Oldest,
    /// Latest modification time
    Newest,
    /// Largest size
    Biggest,
    /// Smallest size
    Smallest,
    /// First member in input order
    First,
    /// Uniformly random member
    Random,
}

impl SparePolicy {
    const NAMES: [&'static str; 6] = ["oldest", "newest", "biggest", "smallest", "first", "random"];

    /// Whether this policy reads file metadata.
    #[must_use]
    pub fn needs_metadata(self) -> bool {
        matches!(
            self,
            Self::Oldest | Self::Newest | Self::Biggest | Self::Smallest
        )
    }

    /// Whether `candidate` strictly beats `best` under this policy.
    fn prefers(self, candidate: &ProbedAttributes, best: &ProbedAttributes) -> bool {
        match self {
            Self::Oldest => candidate.modified < best.modified,
            Self::Newest => candidate.modified > best.modified,
            Self::Biggest => candidate.size > best.size,
            Self::Smallest => candidate.size < best.size,
            Self::First | Self::Random => false,
        }
    }
}

impl fmt::Display for SparePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Oldest => "oldest",
            Self::Newest => "newest",
            Self::Biggest => "biggest",
            Self::Smallest => "smallest",
            Self::First => "first",
            Self::Random => "random",
        };
        f.write_str(name)
    }
}

impl FromStr for SparePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oldest" | "old" => Ok(Self::Oldest),
            "newest" | "new" => Ok(Self::Newest),
            "biggest" | "big" => Ok(Self::Biggest),
            "smallest" | "small" => Ok(Self::Smallest),
            "first" => Ok(Self::First),
            "random" => Ok(Self::Random),
            _ => Err(ConfigError::UnknownPolicy {
                value: s.to_string(),
                suggestion: suggest(s, &Self::NAMES),
            }),
        }
    }
}

/// Metadata a comparative policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedAttributes {
    pub size: u64,
    pub modified: SystemTime,
}

/// Source of metadata at selection time.
pub trait MetadataProbe {
    /// Read the attributes of one candidate.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be stat'ed.
    fn probe(&self, record: &FileRecord) -> io::Result<ProbedAttributes>;
}

/// Re-reads metadata from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveMetadata;

impl MetadataProbe for LiveMetadata {
    fn probe(&self, record: &FileRecord) -> io::Result<ProbedAttributes> {
        let metadata = fs::metadata(&record.path)?;
        Ok(ProbedAttributes {
            size: metadata.len(),
            modified: metadata.modified()?,
        })
    }
}

/// Uses the values captured when the record was created.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedMetadata;

impl MetadataProbe for RecordedMetadata {
    fn probe(&self, record: &FileRecord) -> io::Result<ProbedAttributes> {
        Ok(ProbedAttributes {
            size: record.size,
            modified: record.modified,
        })
    }
}

/// A group together with its spared member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpareDecision {
    pub group: DuplicateGroup,
    pub spared: FileRecord,
}

impl SpareDecision {
    /// Members other than the spared one, in group order.
    pub fn redundant(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.group
            .members
            .iter()
            .filter(move |member| member.path != self.spared.path)
    }
}

/// Errors from spare selection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// The group has no members.
    #[error("group '{0}' has no members")]
    EmptyGroup(String),

    /// Metadata could not be read for any member.
    #[error("no member of group '{0}' could be inspected")]
    NoReadableMember(String),
}

/// Applies a [`SparePolicy`] to duplicate groups.
#[derive(Debug, Clone)]
pub struct SpareSelector<P = LiveMetadata> {
    policy: SparePolicy,
    probe: P,
}

impl SpareSelector<LiveMetadata> {
    /// Selector reading live filesystem metadata.
    #[must_use]
    pub fn new(policy: SparePolicy) -> Self {
        Self::with_probe(policy, LiveMetadata)
    }
}

impl<P: MetadataProbe> SpareSelector<P> {
    /// Selector with a custom metadata source.
    #[must_use]
    pub fn with_probe(policy: SparePolicy, probe: P) -> Self {
        Self { policy, probe }
    }

    /// The policy in use.
    #[must_use]
    pub fn policy(&self) -> SparePolicy {
        self.policy
    }

    /// Index of the member to spare.
    ///
    /// Candidates whose metadata cannot be read are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::EmptyGroup`] for a group without members and
    /// [`SelectError::NoReadableMember`] when every probe failed.
    pub fn select_index<R: Rng + ?Sized>(
        &self,
        group: &DuplicateGroup,
        rng: &mut R,
    ) -> Result<usize, SelectError> {
        if group.is_empty() {
            return Err(SelectError::EmptyGroup(group.key.clone()));
        }

        match self.policy {
            SparePolicy::First => return Ok(0),
            SparePolicy::Random => return Ok(rng.gen_range(0..group.len())),
            _ => {}
        }

        let mut best: Option<(usize, ProbedAttributes)> = None;
        for (idx, member) in group.members.iter().enumerate() {
            let attributes = match self.probe.probe(member) {
                Ok(attributes) => attributes,
                Err(e) => {
                    log::warn!(
                        "Cannot read metadata of {}, skipping it as a spare candidate: {}",
                        member.path.display(),
                        e
                    );
                    continue;
                }
            };
            let replace = match best {
                None => true,
                Some((_, ref current)) => self.policy.prefers(&attributes, current),
            };
            if replace {
                best = Some((idx, attributes));
            }
        }

        best.map(|(idx, _)| idx)
            .ok_or_else(|| SelectError::NoReadableMember(group.key.clone()))
    }

    /// Pick the spared member of `group`.
    ///
    /// # Errors
    ///
    /// See [`SpareSelector::select_index`].
    pub fn decide<R: Rng + ?Sized>(
        &self,
        group: DuplicateGroup,
        rng: &mut R,
    ) -> Result<SpareDecision, SelectError> {
        let idx = self.select_index(&group, rng)?;
        let spared = group.members[idx].clone();
        log::debug!(
            "Group {}: sparing {} ({})",
            group.key,
            spared.path.display(),
            self.policy
        );
        Ok(SpareDecision { group, spared })
    }
}
