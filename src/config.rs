//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//! 1. built-in defaults
//! 2. the TOML config file (platform config dir, or `--config PATH`)
//! 3. `SHELF_*` environment variables
//! 4. command-line flags (see [`Config::merge_args`])
//!
//! The layered [`Config`] keeps the mode, policy, fate and output as plain
//! strings. [`Config::resolve`] validates them into a typed [`RunSettings`]
//! before anything touches the filesystem, so a typo is reported with a
//! "did you mean" hint instead of silently falling back to a default.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::Fate;
use crate::cli::DuplicatesArgs;
use crate::duplicates::{DetectionMode, SparePolicy};
use crate::output::OutputFormat;

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "SHELF_";

/// Default name of the holding directory used by the quarantine fate.
pub const DEFAULT_QUARANTINE_DIR: &str = "__duplicates__";

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Keys accepted in the config file, used for typo warnings.
const KNOWN_KEYS: [&str; 10] = [
    "detection_mode",
    "spare",
    "fate",
    "quiet",
    "recursive",
    "io_threads",
    "quarantine_dir",
    "skip_hidden",
    "follow_symlinks",
    "output",
];

/// Errors raised while loading or validating configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unknown detection mode.
    #[error("unknown detection mode '{value}'{}", hint(.suggestion))]
    UnknownMode {
        value: String,
        suggestion: Option<String>,
    },

    /// Unknown spare policy.
    #[error("unknown spare policy '{value}'{}", hint(.suggestion))]
    UnknownPolicy {
        value: String,
        suggestion: Option<String>,
    },

    /// Unknown fate.
    #[error("unknown fate '{value}'{}", hint(.suggestion))]
    UnknownFate {
        value: String,
        suggestion: Option<String>,
    },

    /// Unknown output format.
    #[error("unknown output format '{value}'{}", hint(.suggestion))]
    UnknownOutput {
        value: String,
        suggestion: Option<String>,
    },

    /// `io_threads` must be at least 1.
    #[error("io_threads must be at least 1")]
    InvalidIoThreads,

    /// The quarantine directory must be a single plain directory name.
    #[error("invalid quarantine directory name '{0}': expected a single directory name")]
    InvalidQuarantineDir(String),

    /// The config file could not be parsed or extracted.
    #[error("failed to load configuration: {0}")]
    Load(String),
}

fn hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

/// Return the candidate closest to `input`, if it is close enough.
#[must_use]
pub fn suggest(input: &str, candidates: &[&str]) -> Option<String> {
    let input = input.trim().to_lowercase();
    candidates
        .iter()
        .map(|candidate| (*candidate, strsim::jaro_winkler(&input, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate.to_string())
}

/// Layered application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `content` or `name`
    pub detection_mode: String,
    /// Spare policy name
    pub spare: String,
    /// `report`, `quarantine` or `remove`
    pub fate: String,
    /// Suppress per-group report lines
    pub quiet: bool,
    /// Scan subdirectories
    pub recursive: bool,
    /// Number of threads hashing files
    pub io_threads: usize,
    /// Holding directory name, created under the scanned root
    pub quarantine_dir: String,
    /// Ignore entries whose name starts with a dot
    pub skip_hidden: bool,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// `text` or `json`
    pub output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detection_mode: DetectionMode::default().to_string(),
            spare: SparePolicy::default().to_string(),
            fate: Fate::default().to_string(),
            quiet: false,
            recursive: false,
            io_threads: 4,
            quarantine_dir: DEFAULT_QUARANTINE_DIR.to_string(),
            skip_hidden: false,
            follow_symlinks: false,
            output: OutputFormat::default().to_string(),
        }
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub mode: DetectionMode,
    pub policy: SparePolicy,
    pub fate: Fate,
    pub output: OutputFormat,
    pub quiet: bool,
    pub recursive: bool,
    pub io_threads: usize,
    pub quarantine_dir: String,
    pub skip_hidden: bool,
    pub follow_symlinks: bool,
}

impl Config {
    /// Load configuration from `path`, or from the platform default path.
    ///
    /// Never fails: an unreadable or invalid file is logged and the
    /// remaining layers are used on top of the defaults.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from_path(path),
            None => Self::load_layers(None).unwrap_or_else(|e| {
                log::warn!("{}, using defaults", e);
                Self::default()
            }),
        }
    }

    /// Load configuration layered on top of the given file.
    #[must_use]
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{} ({}), ignoring config file", e, path.display());
                Self::load_layers(None).unwrap_or_else(|e| {
                    log::warn!("{}, using defaults", e);
                    Self::default()
                })
            }
        }
    }

    /// Load configuration layered on top of the given file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the file or an environment variable
    /// has the wrong shape.
    pub fn try_load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            warn_unknown_keys(path);
            Self::load_layers(Some(path))
        } else {
            log::debug!("Config file {} not found, using defaults", path.display());
            Self::load_layers(None)
        }
    }

    fn load_layers(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Platform-specific config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "shelf", "shelf").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Write this configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply command-line flags, which take priority over every other layer.
    pub fn merge_args(&mut self, args: &DuplicatesArgs) {
        if args.search {
            self.recursive = true;
        }
        if args.name {
            self.detection_mode = DetectionMode::Name.to_string();
        }
        if args.quarantine {
            self.fate = Fate::Quarantine.to_string();
        }
        if args.remove {
            self.fate = Fate::Remove.to_string();
        }
        if let Some(ref spare) = args.spare {
            self.spare.clone_from(spare);
        }
        if let Some(ref output) = args.output {
            self.output.clone_from(output);
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(ref dir) = args.quarantine_dir {
            self.quarantine_dir.clone_from(dir);
        }
        if args.skip_hidden {
            self.skip_hidden = true;
        }
        if args.follow_symlinks {
            self.follow_symlinks = true;
        }
    }

    /// Validate the layered values.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting as a [`ConfigError`].
    pub fn resolve(&self) -> Result<RunSettings, ConfigError> {
        let mode: DetectionMode = self.detection_mode.parse()?;
        let policy: SparePolicy = self.spare.parse()?;
        let fate: Fate = self.fate.parse()?;
        let output: OutputFormat = self.output.parse()?;

        if self.io_threads == 0 {
            return Err(ConfigError::InvalidIoThreads);
        }
        validate_quarantine_dir(&self.quarantine_dir)?;

        Ok(RunSettings {
            mode,
            policy,
            fate,
            output,
            quiet: self.quiet,
            recursive: self.recursive,
            io_threads: self.io_threads,
            quarantine_dir: self.quarantine_dir.clone(),
            skip_hidden: self.skip_hidden,
            follow_symlinks: self.follow_symlinks,
        })
    }
}

fn validate_quarantine_dir(name: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Ok(()),
        _ => Err(ConfigError::InvalidQuarantineDir(name.to_string())),
    }
}

fn warn_unknown_keys(path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        return;
    };
    for key in table.keys() {
        if KNOWN_KEYS.contains(&key.as_str()) {
            continue;
        }
        match suggest(key, &KNOWN_KEYS) {
            Some(s) => log::warn!("Unknown config key '{}' (did you mean '{}'?)", key, s),
            None => log::warn!("Unknown config key '{}'", key),
        }
    }
}
