// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{format_states, last_run_text, HistoryColumn, HistoryMap, HistoryRecord};
use crate::classify::StabilityLabel;
use serde::Serialize;
use std::{borrow::Cow, num::NonZeroUsize};
use unicode_width::UnicodeWidthStr;

/// One row of the history table, with its computed columns.
#[derive(Clone, Debug, Serialize)]
pub struct HistoryRow<'a> {
    /// The test's identity.
    pub test_id: &'a str,

    /// The test's display name.
    pub name: &'a str,

    /// A markdown link to the test's source.
    pub url: &'a str,

    /// Whether the test passed, most recent run first.
    pub states: &'a [bool],

    /// The outcome of the most recent run.
    pub last_run: Option<bool>,

    /// The test's stability over the history window.
    pub status: StabilityLabel,

    /// The free-form comment.
    pub comment: &'a str,
}

impl<'a> HistoryRow<'a> {
    fn new(record: &'a HistoryRecord, num_runs: NonZeroUsize) -> Self {
        Self {
            test_id: &record.test_id,
            name: &record.name,
            url: &record.url,
            states: &record.states,
            last_run: record.last_run(),
            status: record.stability(num_runs),
            comment: &record.comment,
        }
    }

    fn cell(&self, column: HistoryColumn) -> Cow<'a, str> {
        match column {
            HistoryColumn::Test => Cow::Borrowed(self.url),
            HistoryColumn::LastRun => Cow::Borrowed(last_run_text(self.last_run)),
            HistoryColumn::LastRuns => Cow::Owned(format_states(self.states)),
            HistoryColumn::Status => Cow::Borrowed(self.status.as_str()),
            HistoryColumn::Comment => Cow::Borrowed(self.comment),
        }
    }
}

/// Returns the rows of the history table, in test ID order.
pub fn history_rows(records: &HistoryMap, num_runs: NonZeroUsize) -> Vec<HistoryRow<'_>> {
    records
        .values()
        .map(|record| HistoryRow::new(record, num_runs))
        .collect()
}

/// Renders the history as a GitHub-flavored markdown table.
///
/// Every column is left-aligned and at least two characters wider than its header. The output
/// has no trailing newline. An empty history still renders the header and divider.
pub fn render_table(records: &HistoryMap, num_runs: NonZeroUsize) -> String {
    let headers: Vec<Cow<'static, str>> = HistoryColumn::ALL
        .iter()
        .map(|column| column.header(num_runs))
        .collect();
    let rows: Vec<Vec<Cow<'_, str>>> = history_rows(records, num_runs)
        .iter()
        .map(|row| {
            HistoryColumn::ALL
                .iter()
                .map(|&column| match row.cell(column) {
                    Cow::Borrowed(cell) => Cow::Borrowed(cell.trim()),
                    Cow::Owned(cell) => Cow::Owned(cell.trim().to_owned()),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].width())
                .fold(header.width() + 2, usize::max)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(table_line(&headers, &widths));
    let mut divider = String::from("|");
    for width in &widths {
        divider.extend(std::iter::repeat_n('-', width + 2));
        divider.push('|');
    }
    lines.push(divider);
    lines.extend(rows.iter().map(|row| table_line(row, &widths)));

    lines.join("\n")
}

fn table_line(cells: &[Cow<'_, str>], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, &width) in cells.iter().zip(widths) {
        line.push(' ');
        line.push_str(cell);
        line.extend(std::iter::repeat_n(' ', width.saturating_sub(cell.width())));
        line.push_str(" |");
    }
    line
}
