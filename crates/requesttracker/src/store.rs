//! The in-memory record store.
//!
//! [`RecordStore`] owns the ordered record sequence for a session and writes
//! the whole sequence back to disk after every mutation. Position is the only
//! identity a record has, so indices stay contiguous after every operation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::query::{self, Criteria, FilteredView};
use crate::record::{RequestRecord, RequestStatus};
use crate::storage::{JsonFile, OnLoadError, SaveOptions};

/// Ordered collection of request records backed by a JSON file.
#[derive(Debug)]
pub struct RecordStore {
    file: JsonFile,
    records: Vec<RequestRecord>,
    revision: u64,
}

impl RecordStore {
    /// Open the store at `path` with default load and save behavior.
    ///
    /// # Errors
    ///
    /// Never fails under the default [`OnLoadError::TreatAsEmpty`] policy;
    /// the `Result` is kept so callers handle [`RecordStore::with_file`] the
    /// same way.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_file(JsonFile::new(path))
    }

    /// Open the store from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails under [`OnLoadError::Fail`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let file = JsonFile::new(config.data_path())
            .with_on_load_error(config.storage.on_load_error)
            .with_save_options(SaveOptions {
                atomic: config.storage.atomic_writes,
                pretty: config.storage.pretty,
            });
        Self::with_file(file)
    }

    /// Open the store through a configured file handle.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails under [`OnLoadError::Fail`].
    pub fn with_file(file: JsonFile) -> Result<Self> {
        let records = file.load()?;
        info!(
            "Opened {} with {} records",
            file.path().display(),
            records.len()
        );
        Ok(Self {
            file,
            records,
            revision: 0,
        })
    }

    /// Get the path to the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn all(&self) -> &[RequestRecord] {
        &self.records
    }

    /// The record at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RequestRecord> {
        self.records.get(index)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counter bumped by every successful mutation and reload.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a record and persist. Returns the new record's index.
    ///
    /// Dates are kept in the normalized form they are saved in.
    ///
    /// # Errors
    ///
    /// Returns a write error if persisting fails; the record is not kept.
    pub fn append(&mut self, record: RequestRecord) -> Result<usize> {
        let index = self.records.len();
        self.records.push(record.normalized());

        if let Err(err) = self.persist() {
            self.records.pop();
            return Err(err);
        }

        debug!(index, "Appended record");
        Ok(index)
    }

    /// Replace every field of the record at `index` and persist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] for an invalid index, or a write
    /// error if persisting fails; the old record is restored in that case.
    pub fn update(&mut self, index: usize, record: RequestRecord) -> Result<()> {
        let len = self.records.len();
        let slot = self
            .records
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        let previous = std::mem::replace(slot, record.normalized());

        if let Err(err) = self.persist() {
            self.records[index] = previous;
            return Err(err);
        }

        debug!(index, "Updated record");
        Ok(())
    }

    /// Remove the record at `index`, shifting later records down, and persist.
    /// Returns the removed record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] for an invalid index, or a write
    /// error if persisting fails; the record is put back in that case.
    pub fn delete(&mut self, index: usize) -> Result<RequestRecord> {
        if index >= self.records.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        let removed = self.records.remove(index);

        if let Err(err) = self.persist() {
            self.records.insert(index, removed);
            return Err(err);
        }

        debug!(index, "Deleted record");
        Ok(removed)
    }

    /// Filter the current records, stamping the view with the store revision.
    #[must_use]
    pub fn query(&self, criteria: &Criteria) -> FilteredView {
        query::filter(&self.records, criteria).with_revision(self.revision)
    }

    /// Update the record shown at `position` in `view`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleView`] if the store changed since the view was
    /// taken, [`Error::IndexOutOfRange`] if `position` is not in the view, or
    /// any error from [`RecordStore::update`].
    pub fn update_from_view(
        &mut self,
        view: &FilteredView,
        position: usize,
        record: RequestRecord,
    ) -> Result<()> {
        let index = self.resolve(view, position)?;
        self.update(index, record)
    }

    /// Delete the record shown at `position` in `view`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleView`] if the store changed since the view was
    /// taken, [`Error::IndexOutOfRange`] if `position` is not in the view, or
    /// any error from [`RecordStore::delete`].
    pub fn delete_from_view(
        &mut self,
        view: &FilteredView,
        position: usize,
    ) -> Result<RequestRecord> {
        let index = self.resolve(view, position)?;
        self.delete(index)
    }

    /// Re-read the data file, replacing the in-memory records.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails under [`OnLoadError::Fail`].
    pub fn reload(&mut self) -> Result<()> {
        self.records = self.file.load()?;
        self.revision += 1;
        debug!(records = self.records.len(), "Reloaded store");
        Ok(())
    }

    /// Summary statistics.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let mut by_status: BTreeMap<String, usize> = RequestStatus::ALL
            .iter()
            .map(|status| (status.to_string(), 0))
            .collect();
        for record in &self.records {
            *by_status.entry(record.status.to_string()).or_default() += 1;
        }

        StoreStats {
            path: self.path().to_path_buf(),
            total_records: self.records.len(),
            by_status,
            file_size_bytes: self.file.size_bytes(),
            on_load_error: self.file.on_load_error(),
        }
    }

    fn resolve(&self, view: &FilteredView, position: usize) -> Result<usize> {
        if view.revision() != self.revision {
            warn!(
                view_revision = view.revision(),
                store_revision = self.revision,
                "Rejecting mutation through stale view"
            );
            return Err(Error::StaleView {
                expected: view.revision(),
                actual: self.revision,
            });
        }

        view.store_index(position)
            .ok_or(Error::IndexOutOfRange {
                index: position,
                len: view.len(),
            })
    }

    fn persist(&mut self) -> Result<()> {
        if let Err(err) = self.file.save(&self.records) {
            warn!(error = %err, "Persisting records failed, rolling back");
            return Err(err);
        }
        self.revision += 1;
        Ok(())
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Path to the data file.
    pub path: PathBuf,
    /// Total number of records.
    pub total_records: usize,
    /// Record count per status label.
    pub by_status: BTreeMap<String, usize>,
    /// Size of the data file in bytes.
    pub file_size_bytes: u64,
    /// Load-error policy in effect.
    pub on_load_error: OnLoadError,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::storage::load_all;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(number: &str) -> RequestRecord {
        RequestRecord::new(number, date("2024-01-01"), date("2024-01-10"), RequestStatus::Open)
            .with_sub_task("A")
            .with_assigned_to("Bob")
    }

    fn create_test_store() -> (TempDir, RecordStore) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = RecordStore::open(dir.path().join("request_tracker.json"))
            .expect("failed to open test store");
        (dir, store)
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_dir, store) = create_test_store();
        assert!(store.is_empty());
        assert_eq!(store.revision(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_append_persists() {
        let (_dir, mut store) = create_test_store();

        let index = store.append(record("R1")).unwrap();

        assert_eq!(index, 0);
        assert_eq!(load_all(store.path()), vec![record("R1")]);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_memory_matches_saved_dates() {
        let (_dir, mut store) = create_test_store();
        let mut timestamped = record("R1");
        timestamped.open_date = "2024-01-01 00:00:00".to_string();

        store.append(timestamped.clone()).unwrap();
        assert_eq!(store.get(0).unwrap().open_date, "2024-01-01");
        assert_eq!(store.all(), load_all(store.path()).as_slice());

        timestamped.close_date = "2024-01-10T08:30:00".to_string();
        store.update(0, timestamped).unwrap();
        assert_eq!(store.get(0).unwrap().close_date, "2024-01-10");
        assert_eq!(store.all(), load_all(store.path()).as_slice());
    }

    #[test]
    fn test_append_ordering() {
        let (_dir, mut store) = create_test_store();
        store.append(record("R0")).unwrap();

        store.append(record("a")).unwrap();
        store.append(record("b")).unwrap();

        let numbers: Vec<&str> = store
            .all()
            .iter()
            .map(|r| r.request_number.as_str())
            .collect();
        assert_eq!(&numbers[numbers.len() - 2..], &["a", "b"]);
    }

    #[test]
    fn test_update_scenario_round_trip() {
        let (_dir, mut store) = create_test_store();
        store.append(record("R1")).unwrap();

        let mut closed = record("R1");
        closed.status = RequestStatus::Closed;
        store.update(0, closed).unwrap();

        let reopened = RecordStore::open(store.path()).unwrap();
        assert_eq!(reopened.get(0).unwrap().status, RequestStatus::Closed);
        assert_eq!(reopened.get(0).unwrap().assigned_to, "Bob");
    }

    #[test]
    fn test_update_out_of_range() {
        let (_dir, mut store) = create_test_store();
        store.append(record("R1")).unwrap();

        let err = store.update(1, record("R2")).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(store.get(0).unwrap().request_number, "R1");
    }

    #[test]
    fn test_delete_contiguity() {
        let (_dir, mut store) = create_test_store();
        for n in ["R0", "R1", "R2", "R3"] {
            store.append(record(n)).unwrap();
        }

        let removed = store.delete(1).unwrap();

        assert_eq!(removed.request_number, "R1");
        assert_eq!(store.len(), 3);
        let numbers: Vec<&str> = store
            .all()
            .iter()
            .map(|r| r.request_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["R0", "R2", "R3"]);
        assert!(store.get(3).is_none());
        assert_eq!(load_all(store.path()).len(), 3);
    }

    #[test]
    fn test_delete_out_of_range() {
        let (_dir, mut store) = create_test_store();

        let err = store.delete(0).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 0, len: 0 }));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_write_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the data path makes every save fail.
        let path = dir.path().join("occupied");
        std::fs::create_dir(&path).unwrap();
        let mut store = RecordStore::open(&path).unwrap();

        let err = store.append(record("R1")).unwrap_err();

        assert!(err.is_write_failure());
        assert!(store.is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_write_failure_rolls_back_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request_tracker.json");
        let mut store = RecordStore::open(&path).unwrap();
        store.append(record("R1")).unwrap();
        store.append(record("R2")).unwrap();

        // Swap the data file for a directory so the next rename fails.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.update(0, record("changed")).unwrap_err().is_write_failure());
        assert!(store.delete(0).unwrap_err().is_write_failure());

        let numbers: Vec<&str> = store
            .all()
            .iter()
            .map(|r| r.request_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["R1", "R2"]);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_query_maps_back_to_store() {
        let (_dir, mut store) = create_test_store();
        store.append(record("R1")).unwrap();
        store.append(record("X2").with_assigned_to("Alice")).unwrap();
        store.append(record("R3")).unwrap();

        let view = store.query(&Criteria::new().assigned_to_contains("bob"));
        assert_eq!(view.index_map(), &[0, 2]);
        assert_eq!(view.revision(), store.revision());

        let mut closed = record("R3");
        closed.status = RequestStatus::Closed;
        store.update_from_view(&view, 1, closed).unwrap();

        assert_eq!(store.get(2).unwrap().status, RequestStatus::Closed);
        assert_eq!(store.get(1).unwrap().request_number, "X2");
    }

    #[test]
    fn test_delete_from_view() {
        let (_dir, mut store) = create_test_store();
        store.append(record("R1")).unwrap();
        store.append(record("X2")).unwrap();

        let view = store.query(&Criteria::new().request_number_contains("x"));
        let removed = store.delete_from_view(&view, 0).unwrap();

        assert_eq!(removed.request_number, "X2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_view_is_rejected() {
        let (_dir, mut store) = create_test_store();
        store.append(record("R1")).unwrap();
        store.append(record("R2")).unwrap();

        let view = store.query(&Criteria::new());
        store.delete(0).unwrap();

        let err = store.delete_from_view(&view, 1).unwrap_err();
        assert!(matches!(err, Error::StaleView { .. }));
        assert!(err.is_stale_position());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_view_position_out_of_range() {
        let (_dir, mut store) = create_test_store();
        store.append(record("R1")).unwrap();

        let view = store.query(&Criteria::new());
        let err = store.update_from_view(&view, 5, record("R9")).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let (_dir, mut store) = create_test_store();
        store.append(record("R1")).unwrap();

        crate::storage::save_all(store.path(), &[record("R1"), record("R2")]).unwrap();
        store.reload().unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_fail_policy_surfaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "[{]").unwrap();

        let file = JsonFile::new(&path).with_on_load_error(OnLoadError::Fail);
        assert!(matches!(
            RecordStore::with_file(file),
            Err(Error::FileCorrupt { .. })
        ));
        assert!(RecordStore::open(&path).unwrap().is_empty());
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_path = Some(dir.path().join("configured.json"));
        config.storage.pretty = false;

        let mut store = RecordStore::from_config(&config).unwrap();
        store.append(record("R1")).unwrap();

        let text = std::fs::read_to_string(dir.path().join("configured.json")).unwrap();
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_stats() {
        let (_dir, mut store) = create_test_store();
        store.append(record("R1")).unwrap();
        let mut closed = record("R2");
        closed.status = RequestStatus::Closed;
        store.append(closed).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.by_status["Open"], 1);
        assert_eq!(stats.by_status["In Progress"], 0);
        assert_eq!(stats.by_status["Closed"], 1);
        assert!(stats.file_size_bytes > 0);
        assert_eq!(stats.on_load_error, OnLoadError::TreatAsEmpty);
    }
}
