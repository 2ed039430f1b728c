//! Ctrl+C handling.
//!
//! The handler only sets a shared [`AtomicBool`]; the walker, the hashing
//! phases and the fate applicator poll it between files and stop early.
//! Work already done (files moved or deleted) is kept.
//!
//! A blocking read cannot poll anything, so while the deletion prompt waits
//! for input an [`ImmediateExitGuard`] is held and an interrupt terminates
//! the process with [`EXIT_CODE_INTERRUPTED`] right away. Nothing has been
//! deleted at that point.
//!
//! ```no_run
//! use shelf::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install handler");
//! while !handler.is_shutdown_requested() {
//!     // process one file
//! #   break;
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for a run interrupted by the user (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown state.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
    exit_immediately: Arc<AtomicBool>,
}

impl ShutdownHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Flag to hand to long-running components.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Make interrupts terminate the process until the guard is dropped.
    #[must_use = "the guard only has an effect while it is alive"]
    pub fn exit_immediately(&self) -> ImmediateExitGuard {
        self.exit_immediately.store(true, Ordering::SeqCst);
        ImmediateExitGuard {
            flag: Arc::clone(&self.exit_immediately),
        }
    }

    /// Whether an [`ImmediateExitGuard`] is currently held.
    #[must_use]
    pub fn exits_immediately(&self) -> bool {
        self.exit_immediately.load(Ordering::SeqCst)
    }

    fn on_signal(&self) {
        self.request_shutdown();
        let mut stderr = std::io::stderr();
        if self.exits_immediately() {
            let _ = writeln!(stderr, "\nCancelled. Nothing was deleted.");
            let _ = stderr.flush();
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
        let _ = writeln!(stderr, "\nInterrupted. Finishing current file...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    }
}

/// Restores polling behaviour when dropped.
#[derive(Debug)]
pub struct ImmediateExitGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for ImmediateExitGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error installing the handler.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// Calling it again returns the already installed handler with its flag
/// reset.
///
/// # Errors
///
/// Returns [`SignalError`] if the OS refuses the handler.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new).clone();
    let signal_side = handler.clone();
    match ctrlc::set_handler(move || signal_side.on_signal()) {
        Ok(()) => Ok(handler),
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered elsewhere, flag will not be set");
            Ok(handler)
        }
        Err(e) => Err(e.into()),
    }
}
