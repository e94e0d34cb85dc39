//! Core check-in types for walkin.
//!
//! This module defines the record stored for every walk-in visitor along with
//! the closed sets of roles and purposes a visitor can pick from.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sentinel stored when the visitor has no EMPLID to give.
pub const EMPLID_NOT_AVAILABLE: &str = "N/A";

/// The visitor's affiliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    /// Enrolled student.
    #[default]
    Student,
    /// Teaching faculty.
    Faculty,
    /// Non-teaching staff.
    Staff,
}

impl Role {
    /// Every role, in menu order.
    pub const ALL: [Role; 3] = [Role::Student, Role::Faculty, Role::Staff];

    /// The label shown to visitors and written to exports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Faculty => "Faculty",
            Self::Staff => "Staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::unknown_choice("role", wanted))
    }
}

/// Why the visitor came to the help desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Purpose {
    /// Password reset.
    #[default]
    #[serde(rename = "Password reset")]
    PasswordReset,
    /// `NetID` account problems.
    #[serde(rename = "NetID")]
    NetId,
    /// `CUNYfirst` access.
    #[serde(rename = "CunyFirst")]
    CunyFirst,
    /// Multi-factor authentication.
    #[serde(rename = "CUNY MFA / Outlook MFA")]
    Mfa,
    /// Wireless network.
    #[serde(rename = "Wi-Fi / HunterSecure")]
    WiFi,
    /// Printing and print quotas.
    #[serde(rename = "Printing / PaperCut")]
    Printing,
    /// Learning management system.
    #[serde(rename = "BrightSpace")]
    BrightSpace,
    /// Mail client or mailbox.
    #[serde(rename = "Email / Outlook")]
    Email,
    /// Physical machines.
    #[serde(rename = "Hardware (laptop/desktop)")]
    Hardware,
    /// Software installation or licensing.
    #[serde(rename = "Software install/access")]
    Software,
    /// Loaner equipment.
    #[serde(rename = "Loaner pickup/return")]
    Loaner,
    /// Anything informational.
    #[serde(rename = "General question")]
    GeneralQuestion,
    /// Not covered above.
    #[serde(rename = "Other")]
    Other,
}

impl Purpose {
    /// Every purpose, in menu order.
    pub const ALL: [Purpose; 13] = [
        Purpose::PasswordReset,
        Purpose::NetId,
        Purpose::CunyFirst,
        Purpose::Mfa,
        Purpose::WiFi,
        Purpose::Printing,
        Purpose::BrightSpace,
        Purpose::Email,
        Purpose::Hardware,
        Purpose::Software,
        Purpose::Loaner,
        Purpose::GeneralQuestion,
        Purpose::Other,
    ];

    /// The label shown to visitors and written to exports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PasswordReset => "Password reset",
            Self::NetId => "NetID",
            Self::CunyFirst => "CunyFirst",
            Self::Mfa => "CUNY MFA / Outlook MFA",
            Self::WiFi => "Wi-Fi / HunterSecure",
            Self::Printing => "Printing / PaperCut",
            Self::BrightSpace => "BrightSpace",
            Self::Email => "Email / Outlook",
            Self::Hardware => "Hardware (laptop/desktop)",
            Self::Software => "Software install/access",
            Self::Loaner => "Loaner pickup/return",
            Self::GeneralQuestion => "General question",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Purpose {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::unknown_choice("purpose", wanted))
    }
}

fn emplid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{8}$").expect("static EMPLID pattern is valid"))
}

/// A normalized EMPLID: either exactly eight digits or `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmplId(String);

impl EmplId {
    /// The `"N/A"` sentinel.
    #[must_use]
    pub fn not_available() -> Self {
        Self(EMPLID_NOT_AVAILABLE.to_string())
    }

    /// Parse raw kiosk input.
    ///
    /// Blank input and any casing of `n/a` become `"N/A"`; otherwise the
    /// trimmed input must be exactly eight ASCII digits. Returns `None` for
    /// anything else.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(EMPLID_NOT_AVAILABLE) {
            Some(Self::not_available())
        } else if emplid_pattern().is_match(trimmed) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    /// Whether this is the `"N/A"` sentinel.
    #[must_use]
    pub fn is_not_available(&self) -> bool {
        self.0 == EMPLID_NOT_AVAILABLE
    }

    /// The stored string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EmplId {
    fn default() -> Self {
        Self::not_available()
    }
}

impl fmt::Display for EmplId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmplId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == EMPLID_NOT_AVAILABLE || emplid_pattern().is_match(&value) {
            Ok(Self(value))
        } else {
            Err(format!("EMPLID must be 8 digits or 'N/A', got '{value}'"))
        }
    }
}

impl From<EmplId> for String {
    fn from(value: EmplId) -> Self {
        value.0
    }
}

/// A validated check-in payload, before the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Visitor name or `NetID`, trimmed and non-empty.
    pub name_or_net_id: String,
    /// Normalized EMPLID.
    pub emplid: EmplId,
    /// Visitor role.
    pub role: Role,
    /// Reason for the visit.
    pub purpose: Purpose,
    /// Optional notes, `None` when blank.
    pub details: Option<String>,
}

/// A single walk-in check-in.
///
/// Entries are immutable once created; the queue and the history log hold
/// clones of the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique identifier, the only handle used for removal.
    pub id: String,

    /// Creation instant, stored as epoch milliseconds.
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Visitor name or `NetID`.
    pub name_or_net_id: String,

    /// EMPLID or `"N/A"`.
    pub emplid: EmplId,

    /// Visitor role.
    pub role: Role,

    /// Reason for the visit.
    pub purpose: Purpose,

    /// Optional free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Entry {
    /// Build an entry from a validated payload.
    #[must_use]
    pub fn from_new(payload: NewEntry, id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            name_or_net_id: payload.name_or_net_id,
            emplid: payload.emplid,
            role: payload.role,
            purpose: payload.purpose,
            details: payload.details,
        }
    }

    /// Generate a fresh entry identifier.
    #[must_use]
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// The calendar date of this entry in the local timezone.
    #[must_use]
    pub fn local_date(&self) -> NaiveDate {
        self.timestamp.with_timezone(&Local).date_naive()
    }

    /// Local time of day as shown on the kiosk, e.g. `09:05 AM`.
    #[must_use]
    pub fn time_display(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%I:%M %p")
            .to_string()
    }

    /// The details text, or an empty string when absent.
    #[must_use]
    pub fn details_or_empty(&self) -> &str {
        self.details.as_deref().unwrap_or("")
    }

    /// Fields an admin search looks at, in display order.
    #[must_use]
    pub fn searchable_fields(&self) -> [&str; 5] {
        [
            &self.name_or_net_id,
            self.emplid.as_str(),
            self.role.label(),
            self.purpose.label(),
            self.details_or_empty(),
        ]
    }
}
