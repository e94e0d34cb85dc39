//! Command-line interface for walkin.
//!
//! This module provides the CLI structure for the `walkin` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AdminArgs, AdminCommand, CheckInCommand, ConfigCommand, PurposeArg, QueueCommand, RoleArg,
    StatusCommand,
};

/// walkin - Walk-in check-in kiosk for the IT help desk
///
/// Visitors check in and join a first-come, first-served queue. Staff unlock
/// an admin view with a PIN to resolve entries, export the day's check-ins
/// and clear data.
#[derive(Debug, Parser)]
#[command(name = "walkin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a visitor in
    CheckIn(CheckInCommand),

    /// Show the line, oldest first
    Queue(QueueCommand),

    /// Show today's counters and storage location
    Status(StatusCommand),

    /// Run a PIN-protected admin action
    Admin(AdminArgs),

    /// Drop history entries from previous days
    Rollover,

    /// Run the interactive kiosk on this terminal
    Kiosk,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
