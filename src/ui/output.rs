//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! User-facing output goes to stdout and respects the quiet flag.
//! Diagnostics go to stderr through `tracing`; see [`init_logging`].

use std::fmt::Display;

use tracing_subscriber::EnvFilter;

use crate::core::types::GroupName;
use crate::lifecycle::LeaveOutcome;

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "MEMBERFLOW_LOG";

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default `tracing` filter directive for this verbosity.
    pub fn log_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Debug => "memberflow=debug,info",
        }
    }
}

/// Install the stderr `tracing` subscriber.
///
/// `MEMBERFLOW_LOG` takes precedence over the verbosity default. Calling
/// this more than once keeps the first subscriber.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Comma-separated group names, or `(none)`.
pub fn format_groups(groups: &[GroupName]) -> String {
    if groups.is_empty() {
        return "(none)".to_string();
    }
    groups
        .iter()
        .map(GroupName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human summary of a leave.
pub fn format_outcome(outcome: &LeaveOutcome) -> String {
    if outcome.is_noop() {
        return "No memberships changed".to_string();
    }
    let mut lines = vec![format!("Left: {}", format_groups(&outcome.left))];
    if !outcome.destroyed.is_empty() {
        lines.push(format!("Removed empty groups: {}", format_groups(&outcome.destroyed)));
    }
    lines.join("\n")
}
