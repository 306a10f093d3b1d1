//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--state <path>`: Use this snapshot file instead of the configured one
//! - `--config <path>`: Use this config file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::{GroupName, Uid};

/// memberflow - Group membership departure tool
#[derive(Parser, Debug)]
#[command(name = "memberflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Membership state file (overrides `[store] path`)
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Config file (overrides the default search)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Remove a user from one or more groups
    #[command(
        name = "leave",
        long_about = "Remove a user from one or more groups.\n\n\
            Groups the user does not belong to are ignored. Empty privilege \
            groups are deleted, the visible-groups index is refreshed, and the \
            left groups are removed from the user's title.",
        after_help = "\
EXAMPLES:
    # Leave a single group
    memberflow leave --uid 42 moderators

    # Leave several groups at once
    memberflow leave --uid 42 moderators beta-testers"
    )]
    Leave {
        /// User leaving the groups
        #[arg(long)]
        uid: Uid,

        /// Groups to leave
        #[arg(required = true, value_name = "GROUP")]
        groups: Vec<GroupName>,
    },

    /// Remove a user from a group on an administrator's behalf
    #[command(
        name = "kick",
        after_help = "\
EXAMPLES:
    # Kick a regular member
    memberflow kick --uid 42 moderators

    # Kick an owner; fails if they are the last one
    memberflow kick --uid 42 moderators --owner"
    )]
    Kick {
        /// User to remove
        #[arg(long)]
        uid: Uid,

        /// Group to remove the user from
        group: GroupName,

        /// The user is an owner of the group
        #[arg(long)]
        owner: bool,
    },

    /// Remove a user from every group and cancel pending requests
    #[command(name = "leave-all")]
    LeaveAll {
        /// User to remove
        #[arg(long)]
        uid: Uid,
    },

    /// Show a user's memberships and title
    #[command(name = "show")]
    Show {
        /// User to inspect
        #[arg(long)]
        uid: Uid,
    },

    /// Manage configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell.",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    memberflow completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    memberflow completion zsh >> ~/.zshrc"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
