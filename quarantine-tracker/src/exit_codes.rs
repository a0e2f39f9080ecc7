// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process exit codes.

/// Documented exit codes for quarantine tracker failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum QuarantineExitCode {}

impl QuarantineExitCode {
    /// No errors occurred and the tracking issue was updated (or would have been, for a dry run).
    pub const OK: i32 = 0;

    /// The invocation could not be set up: a missing or invalid command-line argument, an
    /// unreadable or malformed test report, or invalid configuration.
    pub const SETUP_ERROR: i32 = 1;

    /// Reading or updating the tracking issue failed.
    pub const ISSUE_SYNC_FAILED: i32 = 2;

    /// The issue header template could not be loaded or rendered.
    pub const TEMPLATE_ERROR: i32 = 3;

    /// Writing data to stdout produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 4;
}
