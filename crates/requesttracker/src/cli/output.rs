//! Rendering of records for terminal output.

use std::fmt;

use serde::Serialize;

use crate::record::RequestRecord;

const HEADERS: [&str; 8] = [
    "#",
    "Request Number",
    "Open Date",
    "Close Date",
    "Request Status",
    "Sub Task",
    "Assigned To",
    "Status Notes",
];

/// A record paired with its store index, as shown to the user.
#[derive(Debug, Serialize)]
pub struct Row<'a> {
    /// Store index.
    pub index: usize,
    /// The record.
    #[serde(flatten)]
    pub record: &'a RequestRecord,
}

/// Render rows as an aligned table. Notes are flattened to one line and cut
/// to `notes_width` characters.
#[must_use]
pub fn render_table(rows: &[Row<'_>], notes_width: usize) -> String {
    let cells: Vec<[String; 8]> = rows
        .iter()
        .map(|row| {
            [
                row.index.to_string(),
                row.record.request_number.clone(),
                row.record.open_date.clone(),
                row.record.close_date.clone(),
                row.record.status.to_string(),
                row.record.sub_task.clone(),
                row.record.assigned_to.clone(),
                truncate(&one_line(&row.record.status_notes), notes_width),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    let rule = widths.map(|w| "-".repeat(w));
    push_line(&mut out, &rule, &widths);
    for line in &cells {
        push_line(&mut out, line, &widths);
    }
    out
}

/// Render rows as `key: value` blocks separated by blank lines.
#[must_use]
pub fn render_plain(rows: &[Row<'_>]) -> String {
    Plain(rows).to_string()
}

struct Plain<'a>(&'a [Row<'a>]);

impl fmt::Display for Plain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let record = row.record;
            writeln!(f, "[{}] {}", row.index, record.request_number)?;
            writeln!(f, "  Open Date:      {}", record.open_date)?;
            writeln!(f, "  Close Date:     {}", record.close_date)?;
            writeln!(f, "  Request Status: {}", record.status)?;
            writeln!(f, "  Sub Task:       {}", record.sub_task)?;
            writeln!(f, "  Assigned To:    {}", record.assigned_to)?;
            if !record.status_notes.is_empty() {
                writeln!(f, "  Status Notes:")?;
                for line in record.status_notes.lines() {
                    writeln!(f, "    {line}")?;
                }
            }
        }
        Ok(())
    }
}

/// Render rows as a pretty JSON array, each object carrying its `index`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(rows: &[Row<'_>]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rows)
}

fn push_line(out: &mut String, cells: &[String; 8], widths: &[usize; 8]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
