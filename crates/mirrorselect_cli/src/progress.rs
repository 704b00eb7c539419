//! Progress reporting for the convergence wait.
//!
//! Two modes, auto-detected from the terminal:
//! - Interactive mode (TTY): one indicatif spinner whose message follows the
//!   save-status label as it escalates
//! - Logging mode (non-TTY): structured logging using tracing

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use mirrorselect::convergence::PollEvent;

/// Progress reporter that handles both interactive and logging modes.
pub(crate) enum ProgressReporter {
    /// Animated spinner for TTY.
    Interactive(InteractiveReporter),
    /// Structured logging for non-TTY (CI, pipes).
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Create a new progress reporter, auto-detecting TTY mode.
    pub(crate) fn new() -> Self {
        if Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter)
        }
    }

    /// Handle a poller event.
    pub(crate) fn handle(&self, event: &PollEvent) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    /// Clear any remaining spinner (interactive mode only).
    pub(crate) fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}

/// Interactive reporter with a single spinner.
pub(crate) struct InteractiveReporter {
    bar: ProgressBar,
}

impl InteractiveReporter {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .expect("Invalid template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }

    fn handle(&self, event: &PollEvent) {
        match event {
            PollEvent::Status(status) => {
                self.bar.set_message(status.label().to_string());
            }
            PollEvent::Converged { synced_repo_count } => {
                self.bar.finish_with_message(format!(
                    "✓ Saved, {synced_repo_count} repositories synced"
                ));
            }
            PollEvent::Failed { message } => {
                self.bar.finish_with_message(format!("✗ {message}"));
            }
        }
    }

    fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// Logging reporter using tracing for structured output.
pub(crate) struct LoggingReporter;

impl LoggingReporter {
    fn handle(&self, event: &PollEvent) {
        match event {
            PollEvent::Status(status) => {
                tracing::info!(status = status.label(), "Waiting for sync");
            }
            PollEvent::Converged { synced_repo_count } => {
                tracing::info!(synced_repo_count, "Selection applied");
            }
            PollEvent::Failed { message } => {
                tracing::error!(message = %message, "Convergence wait failed");
            }
        }
    }
}
