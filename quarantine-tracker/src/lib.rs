// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core logic for tracking quarantined tests across CI runs.
//!
//! A run of the tracker:
//!
//! 1. reads a JUnit report into [`Outcome`](outcome::Outcome)s,
//! 2. parses the history table out of the tracking issue's body
//!    ([`parse_history`](history::parse_history)),
//! 3. merges the outcomes into that history ([`merge_outcomes`](merge::merge_outcomes)),
//! 4. renders the table again ([`render_table`](history::render_table)) below a
//!    [`HeaderTemplate`](template::HeaderTemplate),
//! 5. and writes the result back through an [`IssueTracker`](issue::IssueTracker).
//!
//! [`QuarantineSync`](sync::QuarantineSync) ties these steps together.

#![warn(missing_docs)]

pub mod classify;
pub mod config;
pub mod errors;
pub mod exit_codes;
pub mod history;
pub mod issue;
pub mod merge;
pub mod outcome;
pub mod sync;
pub mod template;
