//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each mutating handler:
//! 1. Locks and loads the state file into memory
//! 2. Runs the lifecycle manager against it
//! 3. Commits the state only if the operation succeeded
//! 4. Formats and displays the outcome
//!
//! # Async Commands
//!
//! The lifecycle manager is async. Handlers create a tokio runtime and
//! `block_on` the async implementation.

mod completion;
mod config_cmd;
mod kick;
mod leave;
mod leave_all;
mod show;
mod state;

pub use completion::completion;
pub use config_cmd::{init as config_init, show as config_show};
pub use kick::kick;
pub use leave::leave;
pub use leave_all::leave_all;
pub use show::{collect as collect_profile, render as render_profile, Membership, Profile};
pub use state::Session;

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Leave { uid, groups } => leave::leave(ctx, uid, &groups),
        Command::Kick { uid, group, owner } => kick::kick(ctx, uid, &group, owner),
        Command::LeaveAll { uid } => leave_all::leave_all(ctx, uid),
        Command::Show { uid } => show::show(ctx, uid),
        Command::Config { action } => match action {
            ConfigAction::Init { force } => config_cmd::init(ctx, force),
            ConfigAction::Show => config_cmd::show(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}
