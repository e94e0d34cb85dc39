//! CSV export of the day's history.
//!
//! Every field is double-quoted with embedded quotes doubled, one row per
//! entry, and a fixed header row.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::info;

use crate::entry::Entry;
use crate::error::{Error, Result};

/// Column names of the export, in order.
pub const HEADER: [&str; 7] = [
    "timestamp_iso",
    "time_display",
    "name_or_netid",
    "emplid",
    "role",
    "purpose",
    "details",
];

/// File name prefix of exports.
const FILE_PREFIX: &str = "hunter_helpdesk_walkins_";

/// A rendered export, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// Suggested file name, dated at export time.
    pub filename: String,
    /// CSV text.
    pub contents: String,
    /// Number of data rows (excluding the header).
    pub rows: usize,
}

impl CsvExport {
    /// Render `entries` in the order given.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer fails.
    pub fn build(entries: &[Entry], exported_at: DateTime<Utc>) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(HEADER)?;
        for entry in entries {
            let timestamp_iso = entry
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true);
            let time_display = entry.time_display();
            writer.write_record([
                timestamp_iso.as_str(),
                time_display.as_str(),
                entry.name_or_net_id.as_str(),
                entry.emplid.as_str(),
                entry.role.label(),
                entry.purpose.label(),
                entry.details_or_empty(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::internal(format!("flushing CSV buffer: {e}")))?;
        let contents = String::from_utf8(bytes)
            .map_err(|e| Error::internal(format!("CSV output is not UTF-8: {e}")))?;

        Ok(Self {
            filename: Self::filename_for(exported_at),
            contents,
            rows: entries.len(),
        })
    }

    /// The export file name for a given instant (UTC date).
    #[must_use]
    pub fn filename_for(at: DateTime<Utc>) -> String {
        format!("{FILE_PREFIX}{}.csv", at.format("%Y-%m-%d"))
    }

    /// Write the export into `dir`, creating it if needed.
    ///
    /// Returns the full path of the written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot
    /// be written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.contents)?;
        info!(rows = self.rows, path = %path.display(), "Exported history");
        Ok(path)
    }
}
