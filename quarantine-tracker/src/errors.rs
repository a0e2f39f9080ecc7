// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the quarantine tracker.

use camino::Utf8PathBuf;
use quarantine_junit::DeserializeError;
use thiserror::Error;

/// An error that occurred while reading a JUnit report into outcomes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportReadError {
    /// The report file could not be read.
    #[error("failed to read test report at `{path}`")]
    Read {
        /// The path to the report.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The report is not a valid JUnit document.
    #[error("failed to parse test report at `{path}`")]
    Parse {
        /// The path to the report.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: DeserializeError,
    },

    /// The report has no `<testsuites>` container.
    #[error("no testsuites found in the test report")]
    NoTestsuites,

    /// The report's container holds no `<testsuite>`.
    #[error("no testsuite found in the test report")]
    NoTestsuite,

    /// A test case lacks an attribute needed to track it.
    #[error("test case `{test}` is missing the `{attribute}` attribute")]
    MissingTestcaseAttribute {
        /// The test case, as far as it can be identified.
        test: String,

        /// The missing attribute.
        attribute: &'static str,
    },
}

/// An error that occurred while building a [`TrackerConfig`](crate::config::TrackerConfig).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// No repository was given.
    #[error("the GitHub repository must be defined (set GITHUB_REPOSITORY to `owner/name`)")]
    MissingRepository,

    /// The repository is not in `owner/name` form.
    #[error("invalid GitHub repository `{input}`: expected `owner/name`")]
    InvalidRepository {
        /// The value that was provided.
        input: String,
    },

    /// No issue number was given, or it was zero.
    #[error("the tracking issue must be defined (set ISSUE_ID to a non-zero issue number)")]
    MissingIssueNumber,

    /// The history window is empty.
    #[error("the number of tracked runs must be at least 1 (NUM_RUNS is 0)")]
    InvalidNumRuns,

    /// The server URL used in permalinks could not be parsed.
    #[error("invalid server URL `{input}`")]
    InvalidServerUrl {
        /// The value that was provided.
        input: String,

        /// The underlying error.
        #[source]
        err: url::ParseError,
    },

    /// The server URL used in permalinks can't have paths appended to it.
    #[error("server URL `{input}` cannot be used as a base for permalinks")]
    ServerUrlNotBase {
        /// The value that was provided.
        input: String,
    },
}

/// An error that occurred while loading or rendering the issue header template.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateError {
    /// The template file could not be read.
    #[error("failed to read header template at `{path}`")]
    Read {
        /// The path to the template.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The template is not valid Jinja.
    #[error("failed to parse header template")]
    Syntax {
        /// The underlying error.
        #[source]
        err: minijinja::Error,
    },

    /// The template references a variable that was not supplied.
    #[error("header template references undefined variable `{name}` on line {line}")]
    UndefinedVariable {
        /// The name of the variable, as written in the template.
        name: String,

        /// The 1-based line number the reference appears on.
        line: usize,
    },

    /// The template failed while rendering, e.g. a filter was given a value it can't handle.
    #[error("failed to render header template")]
    Render {
        /// The underlying error.
        #[source]
        err: minijinja::Error,
    },
}

/// An error that occurred while talking to the issue tracker.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IssueSyncError {
    /// An HTTP request failed, either in transport or with an error status.
    #[error("{method} {url} failed")]
    Request {
        /// The HTTP method.
        method: &'static str,

        /// The request URL.
        url: String,

        /// The underlying error.
        #[source]
        err: Box<ureq::Error>,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response from {url}")]
    Decode {
        /// The request URL.
        url: String,

        /// The underlying error.
        #[source]
        err: Box<ureq::Error>,
    },

    /// The issue does not exist.
    #[error("issue {issue} not found")]
    NotFound {
        /// The issue, formatted as `owner/name#number`.
        issue: String,
    },
}

/// An error that occurred while syncing the tracking issue.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading or writing the issue failed.
    #[error(transparent)]
    Issue(#[from] IssueSyncError),

    /// The header could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),
}
