//! Status output for the command line.
//!
//! Phases never print directly: they report through a [`Shell`], which
//! handles alignment, color and verbosity. Format: `{status:>12} {message}`.

use std::fmt::Display;
use std::io::{self, IsTerminal};

use indicatif::{ProgressBar, ProgressStyle};

use crate::util::diagnostic::{emit, Diagnostic, Severity};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only, no progress
    Quiet,
    /// Status messages + progress bars
    #[default]
    Normal,
    /// Status messages, no progress bars (tracing carries the detail)
    Verbose,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Finished,
    Cloned,
    Updated,
    Fresh,
    Enabled,

    // In-progress statuses (cyan)
    Fetching,
    Building,
    Installing,
    Compiling,
    Linking,
    Resolving,

    // Warning statuses (yellow)
    Skipped,
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Cloned => "Cloned",
            Status::Updated => "Updated",
            Status::Fresh => "Fresh",
            Status::Enabled => "Enabled",
            Status::Fetching => "Fetching",
            Status::Building => "Building",
            Status::Installing => "Installing",
            Status::Compiling => "Compiling",
            Status::Linking => "Linking",
            Status::Resolving => "Resolving",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished
            | Status::Cloned
            | Status::Updated
            | Status::Fresh
            | Status::Enabled => "\x1b[1;32m",
            Status::Fetching
            | Status::Building
            | Status::Installing
            | Status::Compiling
            | Status::Linking
            | Status::Resolving => "\x1b[1;36m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    /// Create a shell, detecting color support from stderr.
    pub fn new(verbosity: Verbosity, color: bool) -> Self {
        Shell {
            verbosity,
            use_color: color && io::stderr().is_terminal(),
        }
    }

    /// A shell that prints nothing but errors. Used by tests and library callers.
    pub fn quiet() -> Self {
        Shell {
            verbosity: Verbosity::Quiet,
            use_color: false,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    ///
    /// In quiet mode, only Error status is printed.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print a full diagnostic. Quiet mode only lets errors through.
    pub fn diagnostic(&self, diag: &Diagnostic) {
        if self.is_quiet() && diag.severity != Severity::Error {
            return;
        }
        emit(diag, self.use_color);
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!("{}{:>12}\x1b[0m", status.color_code(), text)
        } else {
            format!("{:>12}", text)
        }
    }

    /// Create a progress bar, or a hidden one when quiet or verbose.
    pub fn progress(&self, total: u64, msg: impl Display) -> ProgressBar {
        if self.verbosity != Verbosity::Normal || total <= 1 || !io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(msg.to_string());
        pb
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, true)
    }
}
