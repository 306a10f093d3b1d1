//! cli
//!
//! Command-line interface layer for memberflow.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers open the state file, run the
//! [`crate::lifecycle`] manager against it and report the outcome. All
//! membership changes flow through the manager.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::ui::output::{self, Verbosity};

/// Settings shared by every command handler.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit state file from `--state`
    pub state: Option<PathBuf>,
    /// Explicit config file from `--config`
    pub config_path: Option<PathBuf>,
    /// Loaded configuration
    pub config: Config,
    /// Output verbosity
    pub verbosity: Verbosity,
}

impl Context {
    /// The state file to operate on; `--state` wins over config.
    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state {
            Some(path) => Ok(path.clone()),
            None => self
                .config
                .state_path()
                .context("Failed to determine state file location"),
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    output::init_logging(verbosity);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;
    if let Some(path) = config.loaded_from() {
        tracing::debug!(path = %path.display(), "config loaded");
    }

    let ctx = Context {
        state: cli.state,
        config_path: cli.config,
        config,
        verbosity,
    };

    commands::dispatch(cli.command, &ctx)
}
