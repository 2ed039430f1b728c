//! Progress reporting for the scan and hashing phases.
//!
//! Components report through the [`ProgressCallback`] trait so they stay
//! independent of the terminal. [`Progress`] renders the callbacks with
//! indicatif on stderr: a spinner while walking, then one bar for the
//! partial hash phase and one for the full hash phase.
//!
//! Phase names are `"walking"`, `"partial"` and `"full"`.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receiver of progress events.
///
/// Implementations must be thread-safe: hashing phases report from a
/// worker pool.
pub trait ProgressCallback: Send + Sync {
    /// A phase begins with `total` items (0 when unknown).
    fn on_phase_start(&self, phase: &str, total: usize);

    /// An item of the current phase is being processed.
    fn on_progress(&self, current: usize, path: &str);

    /// An item finished; `bytes` is its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// The phase finished.
    fn on_phase_end(&self, phase: &str);

    /// Free-form status message.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress display.
pub struct Progress {
    multi: MultiProgress,
    current: Mutex<Option<ProgressBar>>,
}

impl Progress {
    /// Progress bars on stderr, or nothing at all when `hidden`.
    #[must_use]
    pub fn new(hidden: bool) -> Self {
        let target = if hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        Self {
            multi: MultiProgress::with_draw_target(target),
            current: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style(color: &str) -> ProgressStyle {
        let template = format!(
            "[{{elapsed_precise}}] [{{bar:40.{color}/blue}}] {{pos}}/{{len}} ({{percent}}%) {{msg}} (ETA: {{eta}})"
        );
        ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn replace_current(&self, bar: Option<ProgressBar>) -> Option<ProgressBar> {
        match self.current.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, bar),
            Err(_) => None,
        }
    }

    fn with_current(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(slot) = self.current.lock() {
            if let Some(ref pb) = *slot {
                f(pb);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        let pb = match phase {
            "walking" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.set_message("Reading files");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            "partial" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style("cyan"));
                pb.set_message("Hashing first 1024 bytes");
                pb
            }
            "full" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style("green"));
                pb.set_message("Hashing entire files");
                pb
            }
            other => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style("white"));
                pb.set_message(other.to_string());
                pb
            }
        };
        if let Some(previous) = self.replace_current(Some(pb)) {
            previous.finish_and_clear();
        }
    }

    fn on_progress(&self, _current: usize, path: &str) {
        let message = truncate_path(path, 40);
        self.with_current(|pb| {
            pb.inc(1);
            pb.set_message(message);
        });
    }

    fn on_phase_end(&self, phase: &str) {
        if let Some(pb) = self.replace_current(None) {
            let message = match phase {
                "walking" => "Reading complete",
                "partial" => "Partial hashing complete",
                "full" => "Full hashing complete",
                _ => "Done",
            };
            pb.finish_with_message(message);
        }
    }

    fn on_message(&self, message: &str) {
        let message = message.to_string();
        self.with_current(|pb| pb.set_message(message));
    }
}

/// Shorten a path for display, keeping the file name.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }
    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name_len = file_name.chars().count();
    if name_len + 4 >= max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }
    format!(".../{file_name}")
}
