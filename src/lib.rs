//! shelf - duplicate file resolver
//!
//! Finds duplicate files in a directory tree, either by content (size, then
//! a partial hash of the first 1024 bytes, then a full BLAKE3 hash) or by
//! numbered filenames such as `photo (1).jpg`. One copy per group is spared
//! according to a policy; the redundant copies are reported, moved into a
//! quarantine directory, or removed after a typed confirmation.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::actions::{pick_phrase, Confirm, FateApplicator, FateError, PhrasePrompt};
use crate::cli::{Cli, Commands, DuplicatesArgs};
use crate::config::Config;
use crate::duplicates::{
    find_content_duplicates, find_named_duplicates, DetectionMode, FinderConfig, FinderError,
    SpareSelector,
};
use crate::error::ExitCode;
use crate::output::{JsonOutput, OutputFormat, ReportSummary, RunReport, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{FileRecord, ScanError, Walker, WalkerConfig};
use crate::signal::ShutdownHandler;

/// Run the command line `cli` on the process's standard streams and return
/// the exit code to use.
///
/// The report goes to stdout; the deletion prompt reads stdin and writes to
/// stderr so a JSON report stays parseable.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unusable root directory,
/// a cancelled deletion, or an interrupt during detection.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let stdin = io::stdin();
    run_app_with(cli, stdin.lock(), io::stdout(), io::stderr())
}

/// Like [`run_app`], with the prompt input, the report output and the
/// prompt output supplied by the caller.
///
/// # Errors
///
/// Same as [`run_app`].
pub fn run_app_with<R, W, E>(
    cli: Cli,
    input: R,
    mut output: W,
    prompt_output: E,
) -> anyhow::Result<ExitCode>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color || !io::stdout().is_terminal() {
        yansi::disable();
    }

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;

    match cli.command {
        Commands::Duplicates(ref args) => {
            let console = Console {
                input,
                output: &mut output,
                prompt_output,
            };
            run_duplicates(args, cli.quiet, &handler, console)
        }
    }
}

/// Streams a run talks to.
struct Console<'a, R, W, E> {
    input: R,
    output: &'a mut W,
    prompt_output: E,
}

fn run_duplicates<R, W, E>(
    args: &DuplicatesArgs,
    quiet: bool,
    handler: &ShutdownHandler,
    console: Console<'_, R, W, E>,
) -> anyhow::Result<ExitCode>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let Console {
        input,
        output,
        prompt_output,
    } = console;

    let mut config = Config::load(args.config.as_deref());
    config.merge_args(args);
    if quiet {
        config.quiet = true;
    }
    let settings = config.resolve()?;
    log::debug!("Settings: {:?}", settings);

    let root = args.path.as_path();
    let walker_config = WalkerConfig::new(
        settings.recursive,
        settings.follow_symlinks,
        settings.skip_hidden,
    )
    .with_excluded_dir(settings.quarantine_dir.clone());
    let walker = Walker::new(root, walker_config).with_shutdown_flag(handler.get_flag());
    walker.validate_root()?;

    let progress = Arc::new(Progress::new(!args.progress || settings.quiet));
    let (records, scan_errors) = collect_records(&walker, progress.as_ref());
    if handler.is_shutdown_requested() {
        return Err(FinderError::Interrupted.into());
    }
    log::info!("Found {} files in {}", records.len(), root.display());

    let (groups, mut summary) = match settings.mode {
        DetectionMode::Content => {
            let finder_config = FinderConfig::default()
                .with_io_threads(settings.io_threads)
                .with_shutdown_flag(handler.get_flag())
                .with_progress_callback(progress.clone());
            let (groups, mut detection) = find_content_duplicates(records, &finder_config)?;
            detection.scan_errors = scan_errors;
            (groups, ReportSummary::from(&detection))
        }
        DetectionMode::Name => {
            let start = Instant::now();
            let (groups, named) = find_named_duplicates(records);
            let mut summary = ReportSummary::from(&named);
            summary.failed_files += scan_errors.len();
            summary.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            (groups, summary)
        }
    };

    let selector = SpareSelector::new(settings.policy);
    let mut rng = rand::thread_rng();
    let mut decisions = Vec::with_capacity(groups.len());
    for group in groups {
        match selector.decide(group, &mut rng) {
            Ok(decision) => decisions.push(decision),
            Err(e) => {
                log::warn!("Skipping group: {}", e);
                summary.skipped_groups += 1;
            }
        }
    }

    if settings.output == OutputFormat::Text {
        let listing = RunReport {
            root,
            mode: settings.mode,
            policy: settings.policy,
            fate: settings.fate,
            decisions: &decisions,
            summary: summary.clone(),
            outcome: None,
        };
        TextOutput::new(&listing).write_listing(&mut *output, settings.quiet)?;
        output.flush()?;
    }

    let applicator = FateApplicator::new(settings.fate, root, &settings.quarantine_dir)
        .with_shutdown_flag(handler.get_flag());
    let outcome = {
        let prompt = PhrasePrompt::new(pick_phrase(&mut rng), input, prompt_output)
            .with_shutdown_flag(handler.get_flag());
        let mut gate = ExitWhileWaiting {
            inner: prompt,
            handler,
        };
        applicator.apply(&decisions, &mut gate)?
    };

    let exit_code = if outcome.interrupted || handler.is_shutdown_requested() {
        ExitCode::Interrupted
    } else if summary.failed_files > 0 || summary.skipped_groups > 0 || outcome.has_failures() {
        ExitCode::PartialSuccess
    } else if decisions.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    };

    let report = RunReport {
        root,
        mode: settings.mode,
        policy: settings.policy,
        fate: settings.fate,
        decisions: &decisions,
        summary,
        outcome: Some(&outcome),
    };
    match settings.output {
        OutputFormat::Text => TextOutput::new(&report).write_results(&mut *output, settings.quiet)?,
        OutputFormat::Json => JsonOutput::new(&report, exit_code).write_to(&mut *output)?,
    }
    output.flush()?;

    Ok(exit_code)
}

fn collect_records(walker: &Walker, progress: &dyn ProgressCallback) -> (Vec<FileRecord>, Vec<ScanError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    progress.on_phase_start("walking", 0);
    for entry in walker.walk() {
        match entry {
            Ok(record) => {
                progress.on_progress(records.len() + 1, &record.path.to_string_lossy());
                records.push(record);
            }
            Err(e) => errors.push(e),
        }
    }
    progress.on_phase_end("walking");

    (records, errors)
}

/// Confirmation gate during which Ctrl+C ends the process at once.
struct ExitWhileWaiting<'a, C> {
    inner: C,
    handler: &'a ShutdownHandler,
}

impl<C: Confirm> Confirm for ExitWhileWaiting<'_, C> {
    fn confirm(&mut self) -> Result<(), FateError> {
        let _guard = self.handler.exit_immediately();
        self.inner.confirm()
    }
}
