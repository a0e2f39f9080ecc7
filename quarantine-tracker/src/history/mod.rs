// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test history, and the markdown table it is stored in.
//!
//! The history lives in the tracking issue's body as a table with one row per test. The column
//! layout is described once, by [`HistoryColumn`] and [`StateGlyph`]; [`parse_history`] and
//! [`render_table`] are inverses of each other over that layout.

mod parse;
mod render;

pub use parse::parse_history;
pub use render::{history_rows, render_table, HistoryRow};

use crate::classify::{classify, StabilityLabel};
use serde::Serialize;
use std::{borrow::Cow, collections::BTreeMap, fmt, num::NonZeroUsize, str::FromStr};
use thiserror::Error;

/// History records keyed by test ID, in test ID order.
pub type HistoryMap = BTreeMap<String, HistoryRecord>;

/// The recorded history of one quarantined test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    /// The test's identity, `classname::name`.
    pub test_id: String,

    /// The test's display name.
    pub name: String,

    /// A markdown link to the test's source, labeled with `name`.
    pub url: String,

    /// Whether the test passed, most recent run first.
    pub states: Vec<bool>,

    /// A free-form annotation, maintained by hand in the issue.
    pub comment: String,
}

impl HistoryRecord {
    /// The outcome of the most recent run, if any run was recorded.
    pub fn last_run(&self) -> Option<bool> {
        self.states.first().copied()
    }

    /// Classifies this test's stability over a window of `num_runs`.
    pub fn stability(&self, num_runs: NonZeroUsize) -> StabilityLabel {
        classify(&self.states, num_runs)
    }
}

/// The columns of the history table, in order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HistoryColumn {
    /// A link to the test's source. Carries the test's name and ID.
    Test,

    /// Whether the most recent run succeeded.
    LastRun,

    /// The recorded states, most recent first, as [`StateGlyph`]s.
    LastRuns,

    /// The [`StabilityLabel`].
    Status,

    /// The free-form comment.
    Comment,
}

impl HistoryColumn {
    /// All columns, in table order.
    pub const ALL: [HistoryColumn; 5] = [
        HistoryColumn::Test,
        HistoryColumn::LastRun,
        HistoryColumn::LastRuns,
        HistoryColumn::Status,
        HistoryColumn::Comment,
    ];

    /// The column's header.
    pub fn header(self, num_runs: NonZeroUsize) -> Cow<'static, str> {
        match self {
            HistoryColumn::Test => Cow::Borrowed("Test"),
            HistoryColumn::LastRun => Cow::Borrowed("Last run"),
            HistoryColumn::LastRuns => Cow::Owned(format!("Last {num_runs} runs")),
            HistoryColumn::Status => Cow::Borrowed("Status"),
            HistoryColumn::Comment => Cow::Borrowed("Comment"),
        }
    }

    /// The index of this column's cell within a row split on `|`.
    ///
    /// A row starts with a `|`, so the first cell is at index 1.
    pub(crate) fn field_index(self) -> usize {
        match self {
            HistoryColumn::Test => 1,
            HistoryColumn::LastRun => 2,
            HistoryColumn::LastRuns => 3,
            HistoryColumn::Status => 4,
            HistoryColumn::Comment => 5,
        }
    }
}

/// The text shown in the "Last run" column.
pub fn last_run_text(last_run: Option<bool>) -> &'static str {
    match last_run {
        Some(true) => "Succeeded",
        Some(false) => "Failed",
        None => "",
    }
}

/// How a single recorded state is written in the table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StateGlyph {
    /// The run passed.
    Passed,

    /// The run failed.
    Failed,
}

impl StateGlyph {
    /// Returns the glyph for a state.
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            StateGlyph::Passed
        } else {
            StateGlyph::Failed
        }
    }

    /// Returns true if this glyph represents a passing run.
    pub fn passed(self) -> bool {
        matches!(self, StateGlyph::Passed)
    }

    /// Returns the emoji shortcode for this glyph.
    pub fn as_str(self) -> &'static str {
        match self {
            StateGlyph::Passed => ":heavy_check_mark:",
            StateGlyph::Failed => ":x:",
        }
    }
}

impl fmt::Display for StateGlyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateGlyph {
    type Err = UnknownGlyph;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ":heavy_check_mark:" => Ok(StateGlyph::Passed),
            ":x:" => Ok(StateGlyph::Failed),
            other => Err(UnknownGlyph(other.to_owned())),
        }
    }
}

/// A state glyph that isn't one of the [`StateGlyph`] shortcodes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown state glyph `{0}`")]
pub struct UnknownGlyph(pub String);

/// Writes states as space-separated glyphs.
pub fn format_states(states: &[bool]) -> String {
    states
        .iter()
        .map(|&passed| StateGlyph::from_passed(passed).as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads space-separated glyphs back into states. Empty entries are ignored.
pub fn parse_states(cell: &str) -> Result<Vec<bool>, UnknownGlyph> {
    cell.split(' ')
        .filter(|glyph| !glyph.is_empty())
        .map(|glyph| glyph.parse::<StateGlyph>().map(StateGlyph::passed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", Ok(vec![]) ; "empty")]
    #[test_case(" :heavy_check_mark: :x:  ", Ok(vec![true, false]) ; "padded")]
    #[test_case(":x: :x: :heavy_check_mark:", Ok(vec![false, false, true]) ; "several")]
    #[test_case(":heavy_check_mark: :warning:", Err(UnknownGlyph(":warning:".to_owned())) ; "unknown glyph")]
    #[test_case("✔️", Err(UnknownGlyph("✔️".to_owned())) ; "rendered emoji")]
    fn parse_states_cell(cell: &str, expected: Result<Vec<bool>, UnknownGlyph>) {
        assert_eq!(parse_states(cell), expected);
    }

    #[test]
    fn format_states_uses_shortcodes() {
        assert_eq!(
            format_states(&[true, false, true]),
            ":heavy_check_mark: :x: :heavy_check_mark:"
        );
        assert_eq!(format_states(&[]), "");
    }

    #[test]
    fn headers() {
        let num_runs = NonZeroUsize::new(7).expect("7 is non-zero");
        let headers: Vec<_> = HistoryColumn::ALL
            .iter()
            .map(|column| column.header(num_runs))
            .collect();
        assert_eq!(
            headers,
            vec!["Test", "Last run", "Last 7 runs", "Status", "Comment"]
        );
    }
}
