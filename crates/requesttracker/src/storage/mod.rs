//! Storage layer for requesttracker.
//!
//! This module persists the full record sequence as a JSON array in a single
//! file. Loading is all-or-nothing: a file that fails to parse yields either
//! an empty dataset or an error, depending on [`OnLoadError`].

mod writer;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::RequestRecord;

pub use writer::replace_file;

/// What to do when the data file exists but cannot be read or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnLoadError {
    /// Log a warning and start from an empty dataset.
    #[default]
    TreatAsEmpty,
    /// Surface the failure to the caller.
    Fail,
}

/// How the data file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Write to a temp file and rename it over the target.
    pub atomic: bool,
    /// Pretty-print with four-space indentation.
    pub pretty: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            pretty: true,
        }
    }
}

/// Handle to the JSON data file.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    on_load_error: OnLoadError,
    save_options: SaveOptions,
}

impl JsonFile {
    /// Create a handle with default load policy and save options.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            on_load_error: OnLoadError::default(),
            save_options: SaveOptions::default(),
        }
    }

    /// Set the load-error policy.
    #[must_use]
    pub fn with_on_load_error(mut self, policy: OnLoadError) -> Self {
        self.on_load_error = policy;
        self
    }

    /// Set the save options.
    #[must_use]
    pub fn with_save_options(mut self, options: SaveOptions) -> Self {
        self.save_options = options;
        self
    }

    /// Get the path to the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the load-error policy.
    #[must_use]
    pub fn on_load_error(&self) -> OnLoadError {
        self.on_load_error
    }

    /// Load every record from the file.
    ///
    /// # Errors
    ///
    /// Only returns an error under [`OnLoadError::Fail`].
    pub fn load(&self) -> Result<Vec<RequestRecord>> {
        load(&self.path, self.on_load_error)
    }

    /// Overwrite the file with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, records: &[RequestRecord]) -> Result<()> {
        save_with(&self.path, records, self.save_options)
    }

    /// Size of the data file in bytes, or 0 if it does not exist.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

/// Load records, treating a missing or corrupt file as empty.
#[must_use]
pub fn load_all(path: impl AsRef<Path>) -> Vec<RequestRecord> {
    load(path.as_ref(), OnLoadError::TreatAsEmpty).unwrap_or_default()
}

/// Load records with an explicit policy for unreadable or corrupt files.
///
/// A missing file always loads as empty, since that is the state before the
/// first save. Blank content also loads as empty.
///
/// # Errors
///
/// Under [`OnLoadError::Fail`], returns [`Error::Io`] if the file cannot be
/// read and [`Error::FileCorrupt`] if it is not a valid record array.
pub fn load(path: &Path, policy: OnLoadError) -> Result<Vec<RequestRecord>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No data file at {}, starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return match policy {
                OnLoadError::TreatAsEmpty => {
                    warn!(error = %e, "Could not read {}, starting empty", path.display());
                    Ok(Vec::new())
                }
                OnLoadError::Fail => Err(Error::Io(e)),
            };
        }
    };

    if text.trim().is_empty() {
        debug!("Data file {} is blank, starting empty", path.display());
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Vec<RequestRecord>>(&text) {
        Ok(records) => {
            debug!("Loaded {} records from {}", records.len(), path.display());
            Ok(records)
        }
        Err(source) => match policy {
            OnLoadError::TreatAsEmpty => {
                warn!(error = %source, "Data file {} is corrupt, starting empty", path.display());
                Ok(Vec::new())
            }
            OnLoadError::Fail => Err(Error::FileCorrupt {
                path: path.to_path_buf(),
                source,
            }),
        },
    }
}

/// Save records atomically as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`Error::WriteFailure`] if the file cannot be written.
pub fn save_all(path: impl AsRef<Path>, records: &[RequestRecord]) -> Result<()> {
    save_with(path.as_ref(), records, SaveOptions::default())
}

/// Save records with explicit options.
///
/// Dates that parse are normalized to `YYYY-MM-DD` on the way out.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails and
/// [`Error::WriteFailure`] if the file cannot be written.
pub fn save_with(path: &Path, records: &[RequestRecord], options: SaveOptions) -> Result<()> {
    let normalized: Vec<RequestRecord> = records.iter().map(RequestRecord::normalized).collect();
    let bytes = encode(&normalized, options.pretty)?;
    replace_file(path, &bytes, options.atomic)?;
    debug!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

fn encode(records: &[RequestRecord], pretty: bool) -> Result<Vec<u8>> {
    if !pretty {
        return Ok(serde_json::to_vec(records)?);
    }

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    records.serialize(&mut serializer)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::record::RequestStatus;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_records() -> Vec<RequestRecord> {
        vec![
            RequestRecord::new("R1", date("2024-01-01"), date("2024-01-10"), RequestStatus::Open)
                .with_sub_task("A")
                .with_assigned_to("Bob"),
            RequestRecord::new(
                "R2",
                date("2024-02-01"),
                date("2024-02-15"),
                RequestStatus::InProgress,
            )
            .with_sub_task("B")
            .with_assigned_to("Alice")
            .with_status_notes("waiting on vendor\ncalled twice"),
            RequestRecord::new("R3", date("2024-03-01"), date("2024-03-02"), RequestStatus::Closed),
        ]
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request_tracker.json");
        let records = sample_records();

        save_all(&path, &records).unwrap();
        assert_eq!(load_all(&path), records);
    }

    #[test]
    fn test_round_trip_compact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request_tracker.json");
        let records = sample_records();
        let options = SaveOptions {
            atomic: false,
            pretty: false,
        };

        save_with(&path, &records, options).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains('\n'));
        assert_eq!(load_all(&path), records);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.json");

        assert!(load_all(&path).is_empty());
        assert!(load(&path, OnLoadError::Fail).unwrap().is_empty());
    }

    #[test]
    fn test_load_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.json");
        fs::write(&path, "  \n").unwrap();

        assert!(load(&path, OnLoadError::Fail).unwrap().is_empty());
    }

    #[test]
    fn test_load_corrupt_file_soft_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(load_all(&path).is_empty());
    }

    #[test]
    fn test_load_corrupt_file_fail_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load(&path, OnLoadError::Fail).unwrap_err();
        assert!(matches!(err, Error::FileCorrupt { .. }));
    }

    #[test]
    fn test_load_rejects_whole_file_on_partial_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        let mut value = serde_json::to_value(sample_records()).unwrap();
        value[1].as_object_mut().unwrap().remove("Sub Task");
        fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

        assert!(load_all(&path).is_empty());
    }

    #[test]
    fn test_load_rejects_unknown_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let mut value = serde_json::to_value(sample_records()).unwrap();
        value[0]["Request Status"] = serde_json::Value::from("Done");
        fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

        assert!(matches!(
            load(&path, OnLoadError::Fail),
            Err(Error::FileCorrupt { .. })
        ));
    }

    #[test]
    fn test_load_directory_path() {
        let dir = tempfile::tempdir().unwrap();

        assert!(load_all(dir.path()).is_empty());
        assert!(matches!(
            load(dir.path(), OnLoadError::Fail),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_save_normalizes_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.json");
        let mut records = sample_records();
        records[0].open_date = "2024-01-01 00:00:00".to_string();
        records[0].close_date = "unknown".to_string();

        save_all(&path, &records).unwrap();
        let loaded = load_all(&path);

        assert_eq!(loaded[0].open_date, "2024-01-01");
        assert_eq!(loaded[0].close_date, "unknown");
    }

    #[test]
    fn test_save_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");

        save_all(&path, &sample_records()[..1]).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("[\n    {\n        \"Request Number\": \"R1\""));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&str> = value[0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys.len(), 7);
        assert!(keys.contains(&"Status Notes"));
    }

    #[test]
    fn test_save_empty_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        save_all(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert!(load_all(&path).is_empty());
    }

    #[test]
    fn test_json_file_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handle.json");
        let file = JsonFile::new(&path).with_on_load_error(OnLoadError::Fail);

        assert_eq!(file.path(), path);
        assert_eq!(file.on_load_error(), OnLoadError::Fail);
        assert_eq!(file.size_bytes(), 0);

        file.save(&sample_records()).unwrap();
        assert!(file.size_bytes() > 0);
        assert_eq!(file.load().unwrap().len(), 3);
    }

    #[test]
    fn test_on_load_error_serde() {
        let json = serde_json::to_string(&OnLoadError::TreatAsEmpty).unwrap();
        assert_eq!(json, "\"treat_as_empty\"");
        let policy: OnLoadError = serde_json::from_str("\"fail\"").unwrap();
        assert_eq!(policy, OnLoadError::Fail);
    }
}
