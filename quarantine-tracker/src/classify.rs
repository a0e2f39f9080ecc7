// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stability classification.

use serde::Serialize;
use std::{fmt, num::NonZeroUsize};

/// How stable a quarantined test has been over its recent history.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum StabilityLabel {
    /// The history window isn't full yet, and every recorded run passed.
    SoFarSoGood,

    /// The test has failed recently.
    Flaky,

    /// Every run in the window passed.
    Stable,

    /// Every run in the window passed, except possibly the oldest one.
    JustOneMore,

    /// The more recent half of the window passed.
    AlmostThere,
}

impl StabilityLabel {
    /// Returns the label as shown in the history table.
    pub fn as_str(self) -> &'static str {
        match self {
            StabilityLabel::SoFarSoGood => "So far, so good",
            StabilityLabel::Flaky => "Flaky",
            StabilityLabel::Stable => "Stable",
            StabilityLabel::JustOneMore => "Just one more",
            StabilityLabel::AlmostThere => "Almost there",
        }
    }
}

impl From<StabilityLabel> for &'static str {
    fn from(label: StabilityLabel) -> Self {
        label.as_str()
    }
}

impl fmt::Display for StabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a history of states, most recent first, over a window of `num_runs`.
///
/// The first matching rule wins:
///
/// 1. with fewer than `num_runs` states, [`SoFarSoGood`](StabilityLabel::SoFarSoGood) if every
///    run passed and [`Flaky`](StabilityLabel::Flaky) otherwise;
/// 2. [`Stable`](StabilityLabel::Stable) if the `num_runs` most recent runs passed;
/// 3. [`JustOneMore`](StabilityLabel::JustOneMore) if the `num_runs - 1` most recent runs passed;
/// 4. [`AlmostThere`](StabilityLabel::AlmostThere) if the `num_runs / 2` most recent runs passed;
/// 5. [`Flaky`](StabilityLabel::Flaky).
///
/// An empty history is vacuously passing.
pub fn classify(states: &[bool], num_runs: NonZeroUsize) -> StabilityLabel {
    let num_runs = num_runs.get();
    let recent_pass = |n: usize| states.iter().take(n).all(|&passed| passed);

    if states.len() < num_runs {
        if recent_pass(states.len()) {
            StabilityLabel::SoFarSoGood
        } else {
            StabilityLabel::Flaky
        }
    } else if recent_pass(num_runs) {
        StabilityLabel::Stable
    } else if recent_pass(num_runs - 1) {
        StabilityLabel::JustOneMore
    } else if recent_pass(num_runs / 2) {
        StabilityLabel::AlmostThere
    } else {
        StabilityLabel::Flaky
    }
}
