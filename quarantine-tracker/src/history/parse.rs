// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{parse_states, HistoryColumn, HistoryMap, HistoryRecord};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

// The label may itself contain brackets, so it runs up to the last `](`. Link targets are
// percent-encoded and never contain parentheses or whitespace.
static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(.*)\]\(([^()\s]*)\)$").expect("markdown link regex is valid")
});

/// Extracts the history table from an issue body.
///
/// The body can hold arbitrary text around the table. Capturing starts after the first line
/// beginning with `|-` and stops at the first line after it that doesn't begin with `|`. Rows
/// that can't be understood are skipped; a state cell that can't be understood is read as an
/// empty history. If two rows share a test ID, the later one wins.
pub fn parse_history(body: &str) -> HistoryMap {
    let mut records = HistoryMap::new();
    let mut capturing = false;

    for line in body.lines() {
        if !capturing {
            capturing = line.starts_with("|-");
            continue;
        }
        if !line.starts_with('|') {
            break;
        }
        if let Some(record) = parse_row(line) {
            records.insert(record.test_id.clone(), record);
        }
    }

    records
}

fn parse_row(line: &str) -> Option<HistoryRecord> {
    let fields = split_cells(line);
    let field = |column: HistoryColumn| fields.get(column.field_index()).copied();

    let test_cell = field(HistoryColumn::Test).unwrap_or_default().trim();
    let Some(captures) = LINK_REGEX.captures(test_cell) else {
        debug!("skipping history row without a test link: {line}");
        return None;
    };
    let url = &captures[0];
    let name = captures[1].replace("\\|", "|");
    let Some(test_id) = test_id_from_href(&captures[2]) else {
        debug!("skipping history row without a test ID: {line}");
        return None;
    };

    let states = match field(HistoryColumn::LastRuns).map(parse_states) {
        Some(Ok(states)) => states,
        Some(Err(err)) => {
            debug!("{test_id}: {err}, treating history as empty");
            Vec::new()
        }
        None => Vec::new(),
    };
    let comment = field(HistoryColumn::Comment).unwrap_or_default().trim();

    Some(HistoryRecord {
        test_id,
        name,
        url: url.to_owned(),
        states,
        comment: comment.to_owned(),
    })
}

/// Splits a table row on the pipes that aren't preceded by a backslash.
fn split_cells(line: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut start = 0;
    let mut prev = None;
    for (i, c) in line.char_indices() {
        if c == '|' && prev != Some('\\') {
            cells.push(&line[start..i]);
            start = i + 1;
        }
        prev = Some(c);
    }
    cells.push(&line[start..]);
    cells
}

/// Returns the decoded `test_id` query parameter of a link, or failing that, the value of its
/// first query parameter.
fn test_id_from_href(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    let mut pairs = url.query_pairs();
    let (first_key, first_value) = pairs.next()?;
    let value = if first_key == "test_id" {
        first_value
    } else {
        match pairs.find(|(key, _)| key == "test_id") {
            Some((_, value)) => value,
            None => first_value,
        }
    };
    (!value.is_empty()).then(|| value.into_owned())
}
