//! Query filtering over request records.
//!
//! Filtering is a linear scan over a snapshot. Every active predicate must
//! match (logical AND), matching records keep their relative order, and the
//! result carries the store index of each match so a caller can act on a
//! record it picked from the filtered view.

use chrono::NaiveDate;
use tracing::trace;

use crate::record::{RequestRecord, RequestStatus};

/// Filter criteria. Unset or empty predicates are not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    /// Case-insensitive substring of the request number.
    pub request_number: Option<String>,
    /// Case-insensitive substring of the sub task.
    pub sub_task: Option<String>,
    /// Case-insensitive substring of the assignee.
    pub assigned_to: Option<String>,
    /// Exact status.
    pub status: Option<RequestStatus>,
    /// Lower bound on the open date.
    pub start: Option<NaiveDate>,
    /// Upper bound on the close date.
    pub end: Option<NaiveDate>,
}

impl Criteria {
    /// Criteria that match every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match records whose request number contains `needle`.
    #[must_use]
    pub fn request_number_contains(mut self, needle: impl Into<String>) -> Self {
        self.request_number = Some(needle.into());
        self
    }

    /// Match records whose sub task contains `needle`.
    #[must_use]
    pub fn sub_task_contains(mut self, needle: impl Into<String>) -> Self {
        self.sub_task = Some(needle.into());
        self
    }

    /// Match records whose assignee contains `needle`.
    #[must_use]
    pub fn assigned_to_contains(mut self, needle: impl Into<String>) -> Self {
        self.assigned_to = Some(needle.into());
        self
    }

    /// Match records with exactly this status.
    #[must_use]
    pub fn status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Match records opened on or after `start` and closed on or before `end`.
    ///
    /// This tests the two dates independently; it is not an overlap test. A
    /// record opened inside the range but closed after `end` does not match.
    #[must_use]
    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// The date bounds, if both are set.
    #[must_use]
    pub fn active_date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start.zip(self.end)
    }

    /// Check whether any predicate would be applied.
    #[must_use]
    pub fn is_active(&self) -> bool {
        active_needle(self.request_number.as_deref()).is_some()
            || active_needle(self.sub_task.as_deref()).is_some()
            || active_needle(self.assigned_to.as_deref()).is_some()
            || self.status.is_some()
            || self.active_date_range().is_some()
    }

    /// Check a single record against every active predicate.
    #[must_use]
    pub fn matches(&self, record: &RequestRecord) -> bool {
        if !contains_ignore_case(&record.request_number, self.request_number.as_deref()) {
            return false;
        }

        if !contains_ignore_case(&record.sub_task, self.sub_task.as_deref()) {
            return false;
        }

        if !contains_ignore_case(&record.assigned_to, self.assigned_to.as_deref()) {
            return false;
        }

        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }

        if let Some((start, end)) = self.active_date_range() {
            // Unparseable dates cannot be compared; exclude the record.
            let (Some(open), Some(close)) = (record.open_date(), record.close_date()) else {
                trace!(
                    request_number = %record.request_number,
                    "Excluding record with malformed date from date range"
                );
                return false;
            };
            if open < start || close > end {
                return false;
            }
        }

        true
    }
}

/// The result of filtering: matching records plus their store indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    records: Vec<RequestRecord>,
    index_map: Vec<usize>,
    revision: u64,
}

impl FilteredView {
    /// The matching records, in store order.
    #[must_use]
    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    /// Store index for each filtered position.
    #[must_use]
    pub fn index_map(&self) -> &[usize] {
        &self.index_map
    }

    /// Store index of the record at `position` in this view.
    #[must_use]
    pub fn store_index(&self, position: usize) -> Option<usize> {
        self.index_map.get(position).copied()
    }

    /// Record at `position` in this view.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&RequestRecord> {
        self.records.get(position)
    }

    /// Store revision the view was taken at. Zero for views built by [`filter`].
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of matching records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(store_index, record)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &RequestRecord)> {
        self.index_map.iter().copied().zip(self.records.iter())
    }

    /// Split into the records and the index map.
    #[must_use]
    pub fn into_parts(self) -> (Vec<RequestRecord>, Vec<usize>) {
        (self.records, self.index_map)
    }

    pub(crate) fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }
}

/// Filter `records` by `criteria`.
#[must_use]
pub fn filter(records: &[RequestRecord], criteria: &Criteria) -> FilteredView {
    let (index_map, records): (Vec<usize>, Vec<RequestRecord>) = records
        .iter()
        .enumerate()
        .filter(|(_, record)| criteria.matches(record))
        .map(|(index, record)| (index, record.clone()))
        .unzip();

    FilteredView {
        records,
        index_map,
        revision: 0,
    }
}

fn active_needle(needle: Option<&str>) -> Option<&str> {
    needle.filter(|n| !n.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    active_needle(needle).map_or(true, |needle| {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    })
}
