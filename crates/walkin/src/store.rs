//! The persistent queue/history store.
//!
//! Owns the two collections the kiosk revolves around:
//!
//! - the **queue**, unresolved entries in arrival order, and
//! - the **history**, every entry created on the current local day.
//!
//! Every mutation is written back to the [`Repository`] immediately. Storage
//! failures are logged and otherwise ignored so the session keeps working
//! from memory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::entry::{Entry, NewEntry};
use crate::error::{Error, Result};
use crate::export::CsvExport;
use crate::storage::{Repository, Slot};

/// Counters shown on the admin view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Check-ins recorded today, resolved or not.
    pub today: usize,
    /// Entries still waiting in the queue.
    pub queued: usize,
}

/// Queue and history state backed by a [`Repository`].
#[derive(Debug)]
pub struct Store<R, C = SystemClock> {
    repo: R,
    clock: C,
    queue: Vec<Entry>,
    history: Vec<Entry>,
}

impl<R: Repository> Store<R> {
    /// Open a store on the system clock.
    pub fn open(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: Repository, C: Clock> Store<R, C> {
    /// Hydrate a store from `repo`, then sweep history against `clock`.
    ///
    /// Unreadable slots start empty. The queue is re-sorted oldest first.
    pub fn with_clock(repo: R, clock: C) -> Self {
        let state = repo.load();
        let mut store = Self {
            repo,
            clock,
            queue: state.queue,
            history: state.history,
        };
        store.queue.sort_by_key(|e| e.timestamp);

        let dropped = store.sweep_history();
        store.persist(Slot::History);
        debug!(
            queued = store.queue.len(),
            today = store.history.len(),
            dropped,
            "Store loaded"
        );
        store
    }

    /// Record a new check-in.
    ///
    /// Assigns a fresh id and the current timestamp, appends the entry to the
    /// tail of both the queue and the history, and persists both. The payload
    /// is expected to be validated already.
    pub fn add_entry(&mut self, payload: NewEntry) -> Entry {
        let mut id = Entry::generate_id();
        while self.contains_id(&id) {
            id = Entry::generate_id();
        }

        let entry = Entry::from_new(payload, id, self.now_millis());
        self.queue.push(entry.clone());
        self.history.push(entry.clone());
        self.persist(Slot::Queue);
        self.persist(Slot::History);

        info!(id = %entry.id, purpose = %entry.purpose, "Checked in");
        entry
    }

    /// Resolve an entry: drop it from the queue, keep it in history.
    ///
    /// Returns `false` if no queued entry has this id.
    pub fn remove_entry(&mut self, id: &str) -> bool {
        let before = self.queue.len();
        self.queue.retain(|e| e.id != id);
        if self.queue.len() == before {
            debug!(%id, "Resolve ignored, id not queued");
            return false;
        }
        self.persist(Slot::Queue);
        info!(%id, "Resolved");
        true
    }

    /// Empty both the queue and the history.
    pub fn clear_all(&mut self) {
        let (queued, today) = (self.queue.len(), self.history.len());
        self.queue.clear();
        self.history.clear();
        self.persist(Slot::Queue);
        self.persist(Slot::History);
        info!(queued, today, "Cleared all entries");
    }

    /// Drop history entries that are not from today.
    ///
    /// Returns the number of entries dropped. The queue is left alone:
    /// unresolved entries from earlier days stay queued.
    pub fn rollover(&mut self) -> usize {
        let dropped = self.sweep_history();
        if dropped > 0 {
            self.persist(Slot::History);
            info!(dropped, "Day rollover pruned history");
        }
        dropped
    }

    /// Render the history as CSV, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer fails.
    pub fn export_snapshot(&self) -> Result<CsvExport> {
        CsvExport::build(&self.history, self.clock.now())
    }

    /// Find the queued entry whose id starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] when nothing matches and
    /// [`Error::AmbiguousEntry`] when more than one entry does.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<&Entry> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::EntryNotFound {
                id: prefix.to_string(),
            });
        }
        if let Some(exact) = self.queue.iter().find(|e| e.id == prefix) {
            return Ok(exact);
        }
        let mut matches = self.queue.iter().filter(|e| e.id.starts_with(prefix));
        match (matches.next(), matches.count()) {
            (Some(entry), 0) => Ok(entry),
            (Some(_), more) => Err(Error::AmbiguousEntry {
                prefix: prefix.to_string(),
                count: more + 1,
            }),
            (None, _) => Err(Error::EntryNotFound {
                id: prefix.to_string(),
            }),
        }
    }

    /// The active queue, oldest first.
    #[must_use]
    pub fn queue(&self) -> &[Entry] {
        &self.queue
    }

    /// Today's check-ins, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Entry] {
        &self.history
    }

    /// Look up an entry by exact id in the queue or the history.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Entry> {
        self.queue
            .iter()
            .chain(self.history.iter())
            .find(|e| e.id == id)
    }

    /// Check-ins recorded today.
    #[must_use]
    pub fn today_count(&self) -> usize {
        self.history.len()
    }

    /// Entries waiting in the queue.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// Both counters.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            today: self.today_count(),
            queued: self.queued_count(),
        }
    }

    /// The clock this store reads.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The underlying repository.
    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn contains_id(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Current instant truncated to milliseconds so it survives a storage
    /// round trip unchanged.
    fn now_millis(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
    }

    fn sweep_history(&mut self) -> usize {
        let today = self.clock.today();
        let before = self.history.len();
        self.history.retain(|e| e.local_date() == today);
        let dropped = before - self.history.len();
        if dropped > 0 {
            debug!(dropped, %today, "Swept stale history entries");
        }
        dropped
    }

    fn persist(&mut self, slot: Slot) {
        let entries = match slot {
            Slot::Queue => &self.queue,
            Slot::History => &self.history,
        };
        if let Err(e) = self.repo.save_slot(slot, entries) {
            warn!(%slot, error = %e, "Failed to persist, keeping in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::clock::FixedClock;
    use crate::entry::{EmplId, Purpose, Role};
    use crate::storage::{MemoryStorage, Storage};
    use chrono::Duration;

    fn clock() -> FixedClock {
        FixedClock::at_local(2026, 3, 10, 12, 0).expect("noon exists locally")
    }

    fn payload(name: &str) -> NewEntry {
        NewEntry {
            name_or_net_id: name.to_string(),
            emplid: EmplId::not_available(),
            role: Role::Student,
            purpose: Purpose::PasswordReset,
            details: None,
        }
    }

    fn dated_entry(name: &str, at: DateTime<Utc>) -> Entry {
        Entry::from_new(payload(name), Entry::generate_id(), at)
    }

    fn create_test_store() -> Store<MemoryStorage, FixedClock> {
        Store::with_clock(MemoryStorage::new(), clock())
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = create_test_store();
        assert!(store.queue().is_empty());
        assert!(store.history().is_empty());
        assert_eq!(store.stats(), StoreStats { today: 0, queued: 0 });
    }

    #[test]
    fn test_add_entry_appends_to_both_tails() {
        let mut store = create_test_store();
        store.add_entry(payload("first"));
        let second = store.add_entry(payload("second"));

        assert_eq!(store.queue().last(), Some(&second));
        assert_eq!(store.history().last(), Some(&second));
        assert_eq!(store.queue().len(), 2);
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_add_entry_assigns_unique_ids() {
        let mut store = create_test_store();
        let mut seen = HashSet::new();
        for i in 0..50 {
            let entry = store.add_entry(payload(&format!("visitor {i}")));
            assert!(seen.insert(entry.id));
        }
    }

    #[test]
    fn test_add_entry_uses_clock() {
        let mut store = create_test_store();
        let entry = store.add_entry(payload("timed"));
        assert_eq!(entry.timestamp, store.clock().now());
    }

    #[test]
    fn test_add_entry_persists_both_slots() {
        let mut store = create_test_store();
        let writes_before = store.repository().writes();
        let entry = store.add_entry(payload("persisted"));

        assert_eq!(store.repository().writes(), writes_before + 2);
        assert_eq!(store.repository().load_slot(Slot::Queue), vec![entry.clone()]);
        assert_eq!(store.repository().load_slot(Slot::History), vec![entry]);
    }

    #[test]
    fn test_remove_entry_keeps_history() {
        let mut store = create_test_store();
        let a = store.add_entry(payload("a"));
        let b = store.add_entry(payload("b"));

        assert!(store.remove_entry(&a.id));

        assert_eq!(store.queue(), &[b.clone()]);
        assert_eq!(store.history(), &[a, b]);
        assert_eq!(store.today_count(), 2);
        assert_eq!(store.queued_count(), 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut store = create_test_store();
        store.add_entry(payload("a"));
        let writes = store.repository().writes();

        assert!(!store.remove_entry("no-such-id"));
        assert_eq!(store.queue().len(), 1);
        assert_eq!(store.repository().writes(), writes);
    }

    #[test]
    fn test_clear_all_empties_everything() {
        let mut store = create_test_store();
        store.add_entry(payload("a"));
        store.add_entry(payload("b"));

        store.clear_all();

        assert!(store.queue().is_empty());
        assert!(store.history().is_empty());
        assert_eq!(store.today_count(), 0);
        assert!(store.repository().load().queue.is_empty());
        assert!(store.repository().load().history.is_empty());
    }

    #[test]
    fn test_load_sweeps_stale_history_but_not_queue() {
        let clock = clock();
        let now = clock.now();
        let yesterday = dated_entry("yesterday", now - Duration::days(1));
        let this_morning = dated_entry("morning", now - Duration::hours(3));

        let repo = MemoryStorage::new()
            .with_entries(Slot::Queue, &[yesterday.clone(), this_morning.clone()])
            .with_entries(Slot::History, &[yesterday.clone(), this_morning.clone()]);
        let store = Store::with_clock(repo, clock);

        assert_eq!(store.history(), &[this_morning.clone()]);
        assert_eq!(store.queue(), &[yesterday, this_morning.clone()]);
        assert_eq!(
            store.repository().load_slot(Slot::History),
            vec![this_morning]
        );
    }

    #[test]
    fn test_load_sorts_queue_oldest_first() {
        let clock = clock();
        let now = clock.now();
        let older = dated_entry("older", now - Duration::minutes(30));
        let newer = dated_entry("newer", now - Duration::minutes(5));

        let repo = MemoryStorage::new().with_entries(Slot::Queue, &[newer.clone(), older.clone()]);
        let store = Store::with_clock(repo, clock);

        assert_eq!(store.queue(), &[older, newer]);
    }

    #[test]
    fn test_rollover_at_midnight() {
        let clock = clock();
        let mut store = Store::with_clock(MemoryStorage::new(), clock.clone());
        store.add_entry(payload("today"));
        assert_eq!(store.rollover(), 0);
        assert_eq!(store.today_count(), 1);

        clock.advance(Duration::days(1));

        assert_eq!(store.rollover(), 1);
        assert!(store.history().is_empty());
        assert_eq!(store.queued_count(), 1);
        assert!(store.repository().load().history.is_empty());
    }

    #[test]
    fn test_rollover_keeps_entries_from_today() {
        let clock = clock();
        let mut store = Store::with_clock(MemoryStorage::new(), clock.clone());
        store.add_entry(payload("noon"));

        clock.advance(Duration::hours(6));
        store.add_entry(payload("evening"));

        assert_eq!(store.rollover(), 0);
        assert_eq!(store.today_count(), 2);
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let repo = MemoryStorage::new()
            .with_slot(Slot::Queue, "garbage")
            .with_slot(Slot::History, "[{\"id\":1}]");
        let store = Store::with_clock(repo, clock());

        assert!(store.queue().is_empty());
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_bad_record_does_not_erase_history() {
        crate::logging::init_test_logging();
        let kept = dated_entry("kept", clock().now());
        let mut broken = serde_json::to_value(&kept).unwrap();
        broken["id"] = serde_json::Value::from("broken");
        broken["emplid"] = serde_json::Value::from("12-34");
        let raw = serde_json::to_string(&vec![broken, serde_json::to_value(&kept).unwrap()]).unwrap();
        let repo = MemoryStorage::new().with_slot(Slot::History, raw);

        let store = Store::with_clock(repo, clock());

        assert_eq!(store.history(), &[kept.clone()]);
        let persisted = store.repository().raw(Slot::History).unwrap();
        assert!(persisted.contains(&kept.id));
        assert!(!persisted.contains("broken"));
    }

    #[test]
    fn test_write_failures_keep_memory_state() {
        crate::logging::init_test_logging();
        let mut repo = MemoryStorage::new();
        repo.set_fail_writes(true);
        let mut store = Store::with_clock(repo, clock());

        let entry = store.add_entry(payload("memory only"));

        assert_eq!(store.queue(), &[entry.clone()]);
        assert_eq!(store.history(), &[entry.clone()]);
        assert!(store.remove_entry(&entry.id));
        assert!(store.queue().is_empty());
        assert!(store.repository().raw(Slot::Queue).is_none());
    }

    #[test]
    fn test_export_snapshot_covers_history() {
        let mut store = create_test_store();
        let a = store.add_entry(payload("a"));
        store.add_entry(NewEntry {
            details: Some("He said \"hi\"".to_string()),
            ..payload("b")
        });
        store.remove_entry(&a.id);

        let export = store.export_snapshot().unwrap();

        assert_eq!(export.rows, store.history().len());
        assert_eq!(export.rows, 2);
        let lines: Vec<&str> = export.contents.lines().collect();
        assert!(lines[1].contains("\"a\""));
        assert!(lines[1].ends_with(",\"\""));
        assert!(lines[2].ends_with(",\"He said \"\"hi\"\"\""));
    }

    #[test]
    fn test_resolve_prefix() {
        let mut store = create_test_store();
        let entry = store.add_entry(payload("prefix"));

        let found = store.resolve_prefix(&entry.id[..8]).unwrap();
        assert_eq!(found.id, entry.id);
        assert_eq!(store.resolve_prefix(&entry.id).unwrap().id, entry.id);
    }

    #[test]
    fn test_resolve_prefix_errors() {
        let mut store = create_test_store();
        store.add_entry(payload("a"));
        store.add_entry(payload("b"));

        assert!(matches!(
            store.resolve_prefix("zzzz-not-hex"),
            Err(Error::EntryNotFound { .. })
        ));
        assert!(matches!(
            store.resolve_prefix(""),
            Err(Error::EntryNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_prefix_ambiguous() {
        let clock = clock();
        let now = clock.now();
        let mut a = dated_entry("a", now);
        a.id = "abc-1".to_string();
        let mut b = dated_entry("b", now);
        b.id = "abc-2".to_string();
        let repo = MemoryStorage::new().with_entries(Slot::Queue, &[a, b]);
        let store = Store::with_clock(repo, clock);

        assert!(matches!(
            store.resolve_prefix("abc"),
            Err(Error::AmbiguousEntry { count: 2, .. })
        ));
        assert_eq!(store.resolve_prefix("abc-2").unwrap().name_or_net_id, "b");
    }

    #[test]
    fn test_reload_observes_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("walkin.db");

        let (kept, resolved) = {
            let mut store = Store::open(Storage::open(&db_path).unwrap());
            let resolved = store.add_entry(payload("resolved"));
            let kept = store.add_entry(NewEntry {
                details: Some("printer jam".to_string()),
                ..payload("kept")
            });
            store.remove_entry(&resolved.id);
            (kept, resolved)
        };

        let store = Store::open(Storage::open(&db_path).unwrap());
        assert_eq!(store.queue(), &[kept.clone()]);
        assert_eq!(store.history(), &[resolved, kept]);
    }
}
