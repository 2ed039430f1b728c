//! Confirmation gate in front of permanent deletion.
//!
//! A phrase is drawn at random from [`CONFIRMATION_PHRASES`] and the
//! operator must type it exactly (case-sensitive, surrounding whitespace
//! ignored). A wrong answer re-prompts with no attempt limit. The only ways
//! out without confirming are end of input and an interrupt.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use yansi::Paint;

use super::FateError;

/// Phrases the operator may be asked to type.
pub const CONFIRMATION_PHRASES: [&str; 9] = [
    "danger",
    "permanent",
    "delete",
    "loop",
    "fallback",
    "backup",
    "oxymoron",
    "responsibility",
    "deletion",
];

/// Draw a confirmation phrase uniformly at random.
#[must_use]
pub fn pick_phrase<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    CONFIRMATION_PHRASES[rng.gen_range(0..CONFIRMATION_PHRASES.len())]
}

/// Something that must approve a destructive run.
pub trait Confirm {
    /// Block until the operation is approved.
    ///
    /// # Errors
    ///
    /// Returns a [`FateError`] if approval was not given.
    fn confirm(&mut self) -> Result<(), FateError>;
}

/// Prompt asking for a typed phrase on a line-based input.
pub struct PhrasePrompt<R, W> {
    phrase: String,
    input: R,
    output: W,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl<R: BufRead, W: Write> PhrasePrompt<R, W> {
    /// Prompt for `phrase`, reading from `input` and writing to `output`.
    pub fn new(phrase: impl Into<String>, input: R, output: W) -> Self {
        Self {
            phrase: phrase.into(),
            input,
            output,
            shutdown_flag: None,
        }
    }

    /// Stop waiting once the flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The phrase that has to be typed.
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn prompt(&mut self) -> io::Result<()> {
        writeln!(
            self.output,
            "{}",
            "Getting ready to delete the duplicates. Be cautious!".red().bold()
        )?;
        writeln!(
            self.output,
            "{}",
            format!("Type '{}' to confirm deletion:", self.phrase).yellow()
        )?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> Confirm for PhrasePrompt<R, W> {
    fn confirm(&mut self) -> Result<(), FateError> {
        self.prompt().map_err(FateError::Prompt)?;

        let mut line = String::new();
        loop {
            // `Paint::clear` would shadow the inherent method through auto-ref.
            String::clear(&mut line);
            let read = self.input.read_line(&mut line).map_err(FateError::Prompt)?;
            if self.is_shutdown_requested() {
                return Err(FateError::Interrupted);
            }
            if read == 0 {
                log::info!("Confirmation input closed, nothing deleted");
                return Err(FateError::ConfirmationCancelled);
            }
            if line.trim() == self.phrase {
                log::debug!("Deletion confirmed");
                return Ok(());
            }
            writeln!(
                self.output,
                "{}",
                "Incorrect word. Try again or press Ctrl+C to cancel.".red()
            )
            .map_err(FateError::Prompt)?;
            self.output.flush().map_err(FateError::Prompt)?;
        }
    }
}
