//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and the
//! translation from arguments to records and filter criteria.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::config::DisplayFormat;
use crate::query::Criteria;
use crate::record::{parse_input_date, RequestRecord, RequestStatus};

/// Field values for `add` and `update`.
///
/// Every field is optional: `add` fills gaps with defaults, `update` keeps
/// the existing value.
#[derive(Debug, Clone, Default, Args)]
pub struct RecordArgs {
    /// Request number
    #[arg(short, long)]
    pub number: Option<String>,

    /// Open date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub open: Option<NaiveDate>,

    /// Close date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub close: Option<NaiveDate>,

    /// Request status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Sub task
    #[arg(long)]
    pub sub_task: Option<String>,

    /// Person the request is assigned to
    #[arg(short, long)]
    pub assigned_to: Option<String>,

    /// Status notes (may span several lines)
    #[arg(long)]
    pub notes: Option<String>,
}

impl RecordArgs {
    /// Build a new record; missing dates default to `today`, status to Open.
    #[must_use]
    pub fn into_record(self, today: NaiveDate) -> RequestRecord {
        RequestRecord::new(
            self.number.unwrap_or_default(),
            self.open.unwrap_or(today),
            self.close.unwrap_or(today),
            self.status.map_or(RequestStatus::Open, RequestStatus::from),
        )
        .with_sub_task(self.sub_task.unwrap_or_default())
        .with_assigned_to(self.assigned_to.unwrap_or_default())
        .with_status_notes(self.notes.unwrap_or_default())
    }

    /// Overlay the supplied fields on `existing`, producing the full record.
    #[must_use]
    pub fn apply_to(self, existing: &RequestRecord) -> RequestRecord {
        let mut record = existing.clone();
        if let Some(number) = self.number {
            record.request_number = number;
        }
        if let Some(open) = self.open {
            record.open_date = crate::record::format_date(open);
        }
        if let Some(close) = self.close {
            record.close_date = crate::record::format_date(close);
        }
        if let Some(status) = self.status {
            record.status = status.into();
        }
        if let Some(sub_task) = self.sub_task {
            record.sub_task = sub_task;
        }
        if let Some(assigned_to) = self.assigned_to {
            record.assigned_to = assigned_to;
        }
        if let Some(notes) = self.notes {
            record.status_notes = notes;
        }
        record
    }

    /// Check whether any field was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.number.is_none()
            && self.open.is_none()
            && self.close.is_none()
            && self.status.is_none()
            && self.sub_task.is_none()
            && self.assigned_to.is_none()
            && self.notes.is_none()
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Search by request number (case-insensitive substring)
    #[arg(short, long)]
    pub number: Option<String>,

    /// Search by sub task (case-insensitive substring)
    #[arg(long)]
    pub sub_task: Option<String>,

    /// Search by assignee (case-insensitive substring)
    #[arg(short, long)]
    pub assigned_to: Option<String>,

    /// Filter by status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Only requests opened on or after this date (needs --to)
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Only requests closed on or before this date (needs --from)
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl ListCommand {
    /// The filter criteria these arguments describe.
    #[must_use]
    pub fn criteria(&self) -> Criteria {
        Criteria {
            request_number: self.number.clone(),
            sub_task: self.sub_task.clone(),
            assigned_to: self.assigned_to.clone(),
            status: self.status.map(RequestStatus::from),
            start: self.from,
            end: self.to,
        }
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Store index of the request (as printed by `list`)
    pub index: usize,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Update command arguments.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Store index of the request (as printed by `list`)
    pub index: usize,

    /// New field values; fields not given keep their current value
    #[command(flatten)]
    pub fields: RecordArgs,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Store index of the request (as printed by `list`)
    pub index: usize,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
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

/// Status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Open
    Open,
    /// In Progress
    InProgress,
    /// Closed
    Closed,
}

impl From<StatusArg> for RequestStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => Self::Open,
            StatusArg::InProgress => Self::InProgress,
            StatusArg::Closed => Self::Closed,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}

impl From<DisplayFormat> for OutputFormat {
    fn from(format: DisplayFormat) -> Self {
        match format {
            DisplayFormat::Plain => Self::Plain,
            DisplayFormat::Table => Self::Table,
            DisplayFormat::Json => Self::Json,
        }
    }
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_input_date(value).map_err(|e| e.to_string())
}
