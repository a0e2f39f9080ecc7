// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line options and the top-level run.

use crate::{
    errors::{ExpectedError, Result},
    output::{clap_styles, OutputContext, OutputOpts, OutputWriter},
};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, ValueEnum};
use quarantine_tracker::{
    config::TrackerConfig,
    exit_codes::QuarantineExitCode,
    issue::{GitHubIssueTracker, IssueTracker},
    outcome::{read_outcomes, Outcome},
    sync::{QuarantineSync, SyncPlan},
};
use std::io::Write;
use tracing::info;

/// Update the issue that tracks quarantined tests with the results of a test run.
///
/// Reads a JUnit XML report, merges its results into the history table kept in the tracking
/// issue, and writes the issue back.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = clap_styles(),
    max_term_width = 100,
)]
pub struct QuarantineApp {
    /// Path to the JUnit XML report of the quarantined tests
    #[arg(value_name = "JUNIT_XML")]
    report: Option<Utf8PathBuf>,

    #[clap(flatten)]
    tracker: TrackerOpts,

    #[clap(flatten)]
    output: OutputOpts,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Tracker options")]
struct TrackerOpts {
    /// GitHub token used to read and update the issue
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    token: Option<String>,

    /// Repository that holds the tracking issue
    #[arg(long, env = "GITHUB_REPOSITORY", value_name = "OWNER/NAME")]
    repository: Option<String>,

    /// Number of the tracking issue
    #[arg(long = "issue", env = "ISSUE_ID", value_name = "NUMBER")]
    issue_number: Option<u64>,

    /// Number of runs kept in each test's history [default: 10]
    #[arg(long, env = "NUM_RUNS", value_name = "N")]
    num_runs: Option<usize>,

    /// GitHub REST API endpoint [default: https://api.github.com]
    #[arg(long, env = "GITHUB_API_URL", value_name = "URL")]
    api_url: Option<String>,

    /// GitHub web endpoint used in links to tests [default: https://github.com]
    #[arg(long, env = "GITHUB_SERVER_URL", value_name = "URL")]
    server_url: Option<String>,

    /// Branch used in links to tests [default: main]
    #[arg(long, env = "QUARANTINE_BRANCH", value_name = "BRANCH")]
    branch: Option<String>,

    /// Template for the text above the history table
    #[arg(long, env = "QUARANTINE_HEADER_TEMPLATE", value_name = "PATH")]
    header_template: Option<Utf8PathBuf>,

    /// New title for the tracking issue (the title is left alone by default)
    #[arg(long, env = "QUARANTINE_ISSUE_TITLE", value_name = "TITLE")]
    issue_title: Option<String>,

    /// Compute and print the new history, but don't update the issue
    #[arg(long)]
    dry_run: bool,

    /// Output format for the new history
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT")]
    message_format: MessageFormat,
}

impl TrackerOpts {
    fn to_config(&self) -> Result<TrackerConfig> {
        let config = TrackerConfig::builder()
            .repository(self.repository.clone())
            .issue_number(self.issue_number)
            .num_runs(self.num_runs)
            .token(self.token.clone())
            .api_url(self.api_url.clone())
            .server_url(self.server_url.clone())
            .branch(self.branch.clone())
            .header_template(self.header_template.clone())
            .issue_title(self.issue_title.clone())
            .build()?;
        Ok(config)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// The history table, as markdown
    #[default]
    Human,

    /// The history rows, as JSON
    Json,
}

impl QuarantineApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let report = self.report.as_deref().ok_or(ExpectedError::MissingReport)?;
        let outcomes = read_outcomes(report)?;
        info!("read {} test outcomes from {report}", outcomes.len());

        let config = self.tracker.to_config()?;
        let tracker = GitHubIssueTracker::new(config.api_url(), config.token().cloned());

        self.exec_with(&config, &outcomes, &tracker, Utc::now(), output_writer)
    }

    fn exec_with(
        &self,
        config: &TrackerConfig,
        outcomes: &[Outcome],
        tracker: &dyn IssueTracker,
        now: DateTime<Utc>,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let sync = QuarantineSync::new(config)?;
        let plan = sync.run(tracker, outcomes, now, self.tracker.dry_run)?;

        let mut writer = output_writer.stdout();
        write_plan(&plan, self.tracker.message_format, &mut writer)
            .and_then(|()| writer.flush())
            .map_err(|err| ExpectedError::WriteOutputError { err })?;

        Ok(QuarantineExitCode::OK)
    }
}

fn write_plan(
    plan: &SyncPlan,
    message_format: MessageFormat,
    mut writer: impl Write,
) -> std::io::Result<()> {
    match message_format {
        MessageFormat::Human => writeln!(writer, "{}", plan.table),
        MessageFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &plan.rows())?;
            writeln!(writer)
        }
    }
}
