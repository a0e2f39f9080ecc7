// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{StderrStyles, NO_HEADING};
use owo_colors::OwoColorize;
use quarantine_tracker::{
    errors::{ConfigError, IssueSyncError, ReportReadError, SyncError, TemplateError},
    exit_codes::QuarantineExitCode,
};
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that the tracker knows how to report.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("missing JUnit report argument")]
    MissingReport,
    #[error("failed to read test report")]
    ReportReadError {
        #[from]
        err: ReportReadError,
    },
    #[error("invalid configuration")]
    ConfigError {
        #[from]
        err: ConfigError,
    },
    #[error("failed to render the issue header")]
    TemplateError {
        #[from]
        err: TemplateError,
    },
    #[error("failed to sync the tracking issue")]
    IssueSyncError {
        #[from]
        err: IssueSyncError,
    },
    #[error("error writing to output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl From<SyncError> for ExpectedError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Issue(err) => Self::IssueSyncError { err },
            SyncError::Template(err) => Self::TemplateError { err },
        }
    }
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::MissingReport | Self::ReportReadError { .. } | Self::ConfigError { .. } => {
                QuarantineExitCode::SETUP_ERROR
            }
            Self::TemplateError { .. } => QuarantineExitCode::TEMPLATE_ERROR,
            Self::IssueSyncError { .. } => QuarantineExitCode::ISSUE_SYNC_FAILED,
            Self::WriteOutputError { .. } => QuarantineExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::MissingReport => {
                tracing::error!("provide the JUnit XML report as the first argument");
                tracing::info!(
                    target: NO_HEADING,
                    "(usage: {} <JUNIT_XML>)",
                    env!("CARGO_PKG_NAME").style(styles.bold),
                );
                None
            }
            Self::ReportReadError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::ConfigError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::TemplateError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::IssueSyncError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::WriteOutputError { err } => {
                tracing::error!("error writing to output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
