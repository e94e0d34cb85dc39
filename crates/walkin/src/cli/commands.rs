//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::entry::{Purpose, Role};

/// Check-in command arguments.
#[derive(Debug, Args)]
pub struct CheckInCommand {
    /// Visitor name or `NetID`
    #[arg(short, long)]
    pub name: String,

    /// 8-digit EMPLID, or N/A (the default) if the visitor has none
    #[arg(short, long, default_value = "")]
    pub emplid: String,

    /// Visitor role
    #[arg(short, long, value_enum, default_value = "student")]
    pub role: RoleArg,

    /// Reason for the visit
    #[arg(short, long, value_enum, default_value = "password-reset")]
    pub purpose: PurposeArg,

    /// Free-text details
    #[arg(short, long)]
    pub details: Option<String>,

    /// Acknowledge that the information will be used to assist the request
    #[arg(long)]
    pub accept_policy: bool,
}

/// Queue command arguments.
#[derive(Debug, Args)]
pub struct QueueCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Admin command arguments.
#[derive(Debug, Args)]
pub struct AdminArgs {
    /// Admin PIN
    #[arg(short, long)]
    pub pin: String,

    /// The admin action to perform
    #[command(subcommand)]
    pub action: AdminCommand,
}

/// Admin-only actions.
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Show the queue with today's counters
    List {
        /// Only show entries matching this text
        #[arg(short, long)]
        search: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Mark a queued entry as served
    Resolve {
        /// Entry id, or a unique prefix of it
        id: String,
    },

    /// Write today's check-ins to a CSV file
    Export {
        /// Directory to write the file to
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Remove every queued and historical entry
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Role argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Enrolled student
    Student,
    /// Teaching faculty
    Faculty,
    /// Non-teaching staff
    Staff,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Student => Self::Student,
            RoleArg::Faculty => Self::Faculty,
            RoleArg::Staff => Self::Staff,
        }
    }
}

/// Purpose argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PurposeArg {
    /// Password reset
    PasswordReset,
    /// `NetID` problems
    Netid,
    /// `CUNYfirst` access
    Cunyfirst,
    /// CUNY or Outlook MFA
    Mfa,
    /// Wi-Fi / `HunterSecure`
    Wifi,
    /// Printing / `PaperCut`
    Printing,
    /// `BrightSpace`
    Brightspace,
    /// Email / Outlook
    Email,
    /// Laptop or desktop hardware
    Hardware,
    /// Software install or access
    Software,
    /// Loaner pickup or return
    Loaner,
    /// General question
    General,
    /// Anything else
    Other,
}

impl From<PurposeArg> for Purpose {
    fn from(arg: PurposeArg) -> Self {
        match arg {
            PurposeArg::PasswordReset => Self::PasswordReset,
            PurposeArg::Netid => Self::NetId,
            PurposeArg::Cunyfirst => Self::CunyFirst,
            PurposeArg::Mfa => Self::Mfa,
            PurposeArg::Wifi => Self::WiFi,
            PurposeArg::Printing => Self::Printing,
            PurposeArg::Brightspace => Self::BrightSpace,
            PurposeArg::Email => Self::Email,
            PurposeArg::Hardware => Self::Hardware,
            PurposeArg::Software => Self::Software,
            PurposeArg::Loaner => Self::Loaner,
            PurposeArg::General => Self::GeneralQuestion,
            PurposeArg::Other => Self::Other,
        }
    }
}
