//! Human-readable report lines.
//!
//! ```text
//! Duplicate found: a.txt and b.txt [hash: 5e4f...]
//!     - a.txt
//!     - b.txt
//! Spared: a.txt
//! Partial matches: 3
//! Full matches: 2
//! ```
//!
//! Only content groups produce `Duplicate found:` lines. Quiet mode keeps
//! the summary and drops everything per group.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use super::RunReport;
use crate::actions::Fate;
use crate::duplicates::DetectionMode;

/// Text formatter for a [`RunReport`].
#[derive(Debug, Clone)]
pub struct TextOutput<'a> {
    report: &'a RunReport<'a>,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(report: &'a RunReport<'a>) -> Self {
        Self { report }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, quiet: bool) -> io::Result<()> {
        self.write_listing(writer, quiet)?;
        self.write_results(writer, quiet)
    }

    /// Write the per-group lines only.
    ///
    /// Used before a fate is applied so the groups are visible while the
    /// deletion prompt waits.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_listing<W: Write>(&self, writer: &mut W, quiet: bool) -> io::Result<()> {
        if quiet {
            return Ok(());
        }
        self.write_groups(writer)
    }

    /// Write what the fate did, followed by the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_results<W: Write>(&self, writer: &mut W, quiet: bool) -> io::Result<()> {
        if !quiet {
            self.write_outcome(writer)?;
        }
        self.write_summary(writer)
    }

    fn write_groups<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let report = self.report;
        for decision in report.decisions {
            let group = &decision.group;
            if group.kind == DetectionMode::Content {
                if let Some((first, others)) = group.members.split_first() {
                    for other in others {
                        let line = format!(
                            "Duplicate found: {} and {} [hash: {}]",
                            report.display_path(&first.path),
                            report.display_path(&other.path),
                            group.key
                        );
                        writeln!(writer, "{}", line.green())?;
                    }
                }
            }
            for member in &group.members {
                let line = format!("\t- {}", report.display_path(&member.path));
                writeln!(writer, "{}", line.cyan())?;
            }
            let spared = format!("Spared: {}", report.display_path(&decision.spared.path));
            writeln!(writer, "{}", spared.yellow())?;
        }
        Ok(())
    }

    fn write_outcome<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let report = self.report;
        let Some(outcome) = report.outcome else {
            return Ok(());
        };
        for moved in &outcome.moved {
            let line = format!(
                "Quarantined: {} -> {}",
                report.display_path(&moved.from),
                report.display_path(&moved.to)
            );
            writeln!(writer, "{}", line.green())?;
        }
        for deleted in &outcome.deleted {
            let line = format!("Deleted: {}", report.display_path(&deleted.path));
            writeln!(writer, "{}", line.green())?;
        }
        Ok(())
    }

    fn write_summary<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let report = self.report;
        let summary = &report.summary;

        if let Some(partial) = summary.size_candidates {
            writeln!(writer, "{}", format!("Partial matches: {partial}").cyan())?;
            writeln!(
                writer,
                "{}",
                format!("Full matches: {}", summary.duplicate_files + summary.duplicate_groups).cyan()
            )?;
        }
        if let Some(numbered) = summary.numbered_files {
            writeln!(writer, "{}", format!("Numbered files: {numbered}").cyan())?;
        }
        writeln!(
            writer,
            "{}",
            format!(
                "Duplicate groups: {}, redundant files: {}, reclaimable: {}",
                summary.duplicate_groups,
                summary.duplicate_files,
                ByteSize(summary.reclaimable_space)
            )
            .cyan()
        )?;
        if summary.failed_files > 0 {
            let line = format!("{} file(s) could not be read", summary.failed_files);
            writeln!(writer, "{}", line.red())?;
        }
        if summary.skipped_groups > 0 {
            let line = format!("{} group(s) skipped: no spare could be chosen", summary.skipped_groups);
            writeln!(writer, "{}", line.red())?;
        }
        if let Some(outcome) = report.outcome {
            if report.fate != Fate::Report {
                let line = outcome.summary(report.fate);
                if outcome.has_failures() {
                    writeln!(writer, "{}", line.red())?;
                } else {
                    writeln!(writer, "{}", line.green())?;
                }
            }
        }
        Ok(())
    }
}
