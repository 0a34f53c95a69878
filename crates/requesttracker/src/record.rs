//! Core record types for requesttracker.
//!
//! This module defines the request record, its status, and the date handling
//! shared by persistence and filtering.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Canonical on-disk date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp layouts that are accepted and reduced to their date part.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// The lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RequestStatus {
    /// The request has been logged but work has not started.
    #[default]
    Open,
    /// Work on the request is under way.
    #[serde(rename = "In Progress")]
    InProgress,
    /// The request is finished.
    Closed,
}

impl RequestStatus {
    /// Every status, in the order a form would offer them.
    pub const ALL: [Self; 3] = [Self::Open, Self::InProgress, Self::Closed];

    /// The label used on disk and in output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "open" => Ok(Self::Open),
            "inprogress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            _ => Err(Error::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A single tracked request.
///
/// Dates are kept as strings because a data file may carry values that do
/// not parse; use [`RequestRecord::open_date`] and
/// [`RequestRecord::close_date`] for the parsed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Free-text request number. Not required to be unique.
    #[serde(rename = "Request Number")]
    pub request_number: String,

    /// Date the request was opened, as `YYYY-MM-DD`.
    #[serde(rename = "Open Date")]
    pub open_date: String,

    /// Date the request was closed, as `YYYY-MM-DD`.
    #[serde(rename = "Close Date")]
    pub close_date: String,

    /// Current status.
    #[serde(rename = "Request Status")]
    pub status: RequestStatus,

    /// Free-text sub task.
    #[serde(rename = "Sub Task")]
    pub sub_task: String,

    /// Who the request is assigned to.
    #[serde(rename = "Assigned To")]
    pub assigned_to: String,

    /// Multi-line status notes.
    #[serde(rename = "Status Notes")]
    pub status_notes: String,
}

impl RequestRecord {
    /// Create a new record with empty sub task, assignee and notes.
    #[must_use]
    pub fn new(
        request_number: impl Into<String>,
        open_date: NaiveDate,
        close_date: NaiveDate,
        status: RequestStatus,
    ) -> Self {
        Self {
            request_number: request_number.into(),
            open_date: format_date(open_date),
            close_date: format_date(close_date),
            status,
            sub_task: String::new(),
            assigned_to: String::new(),
            status_notes: String::new(),
        }
    }

    /// Set the sub task.
    #[must_use]
    pub fn with_sub_task(mut self, sub_task: impl Into<String>) -> Self {
        self.sub_task = sub_task.into();
        self
    }

    /// Set the assignee.
    #[must_use]
    pub fn with_assigned_to(mut self, assigned_to: impl Into<String>) -> Self {
        self.assigned_to = assigned_to.into();
        self
    }

    /// Set the status notes.
    #[must_use]
    pub fn with_status_notes(mut self, notes: impl Into<String>) -> Self {
        self.status_notes = notes.into();
        self
    }

    /// The parsed open date, if the stored value is a date.
    #[must_use]
    pub fn open_date(&self) -> Option<NaiveDate> {
        parse_date(&self.open_date)
    }

    /// The parsed close date, if the stored value is a date.
    #[must_use]
    pub fn close_date(&self) -> Option<NaiveDate> {
        parse_date(&self.close_date)
    }

    /// Return a copy with both dates rewritten as `YYYY-MM-DD` where they parse.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            open_date: normalize_date(&self.open_date),
            close_date: normalize_date(&self.close_date),
            ..self.clone()
        }
    }
}

/// Format a date the way it is stored on disk.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored date leniently.
///
/// Accepts `YYYY-MM-DD`, a date followed by a time of day, or an RFC 3339
/// timestamp; the time part is discarded. Returns `None` for anything else.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Some(date);
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Parse a date supplied by a caller, strictly as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if the value is not a calendar date.
pub fn parse_input_date(value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| Error::invalid_date(value))
}

/// Rewrite a stored date as `YYYY-MM-DD`, leaving unparseable values alone.
#[must_use]
pub fn normalize_date(value: &str) -> String {
    parse_date(value).map_or_else(|| value.to_string(), format_date)
}
