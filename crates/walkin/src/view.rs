//! Text renderings of the queue.
//!
//! The preview is what visitors see next to the form; the admin table is the
//! staff view with search, short ids for resolving, and today's counters.

use std::fmt::Write as _;

use crate::entry::Entry;
use crate::store::StoreStats;

/// Characters of the id shown in the admin table.
pub const SHORT_ID_LEN: usize = 8;

/// Widest details cell before truncation.
const DETAILS_WIDTH: usize = 28;

/// Lowercase alphanumerics only, so "Wi-Fi" and "wifi" compare equal.
fn fold(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether `entry` matches a search query.
///
/// Case-insensitive substring match over name, EMPLID, role, purpose and
/// details. A query also matches when it appears after dropping punctuation
/// and spaces from both sides. A blank query matches everything.
#[must_use]
pub fn matches(entry: &Entry, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let folded_needle = fold(&needle);
    entry.searchable_fields().iter().any(|field| {
        field.to_lowercase().contains(&needle)
            || (!folded_needle.is_empty() && fold(field).contains(&folded_needle))
    })
}

/// The entries matching `query`, in their original order.
#[must_use]
pub fn filter_entries<'a>(entries: &'a [Entry], query: &str) -> Vec<&'a Entry> {
    entries.iter().filter(|e| matches(e, query)).collect()
}

/// The leading characters of an entry id.
#[must_use]
pub fn short_id(entry: &Entry) -> &str {
    let end = entry
        .id
        .char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(entry.id.len(), |(i, _)| i);
    &entry.id[..end]
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// Read-only queue preview, oldest first.
#[must_use]
pub fn render_preview(queue: &[Entry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Now serving ({} in line)", queue.len());
    if queue.is_empty() {
        out.push_str("  No one in line.\n");
        return out;
    }
    for (position, entry) in queue.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {}  {}",
            position + 1,
            entry.time_display(),
            entry.name_or_net_id
        );
        let _ = writeln!(
            out,
            "      EMPLID {} · {} · {}",
            entry.emplid, entry.role, entry.purpose
        );
        if let Some(details) = &entry.details {
            let _ = writeln!(out, "      {details}");
        }
    }
    out
}

/// Admin table of `rows`, headed by the day's counters.
#[must_use]
pub fn render_admin(rows: &[&Entry], stats: StoreStats, query: &str) -> String {
    let header = ["ID", "Time", "Name/NetID", "EMPLID", "Role", "Purpose", "Details"];
    let cells: Vec<[String; 7]> = rows
        .iter()
        .map(|e| {
            [
                short_id(e).to_string(),
                e.time_display(),
                e.name_or_net_id.clone(),
                e.emplid.to_string(),
                e.role.to_string(),
                e.purpose.to_string(),
                truncate(e.details_or_empty(), DETAILS_WIDTH),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Queue (Admin)   Today: {}   Waiting: {}",
        stats.today, stats.queued
    );
    if !query.trim().is_empty() {
        let _ = writeln!(out, "Search: \"{}\"", query.trim());
    }
    push_row(&mut out, &header.map(String::from), &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    if cells.is_empty() {
        out.push_str("No matches.\n");
    }
    out
}

fn push_row(out: &mut String, row: &[String; 7], widths: &[usize; 7]) {
    let line = row
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
