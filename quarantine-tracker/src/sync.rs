// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Updating the tracking issue with the outcomes of a run.

use crate::{
    config::TrackerConfig,
    errors::{SyncError, TemplateError},
    history::{history_rows, parse_history, render_table, HistoryMap, HistoryRow},
    issue::{IssueRef, IssueState, IssueTracker, IssueUpdate},
    merge::merge_outcomes,
    outcome::Outcome,
    template::{HeaderContext, HeaderTemplate},
};
use chrono::{DateTime, Utc};
use std::num::NonZeroUsize;
use tracing::info;

/// Computes and applies updates to the tracking issue.
#[derive(Clone, Debug)]
pub struct QuarantineSync<'cfg> {
    config: &'cfg TrackerConfig,
    header: HeaderTemplate,
}

impl<'cfg> QuarantineSync<'cfg> {
    /// Creates a new `QuarantineSync`, loading the header template the config points to.
    pub fn new(config: &'cfg TrackerConfig) -> Result<Self, TemplateError> {
        let header = HeaderTemplate::load(config.header_template().map(|path| path.as_path()))?;
        Ok(Self::with_header(config, header))
    }

    /// Creates a new `QuarantineSync` with the given header template.
    pub fn with_header(config: &'cfg TrackerConfig, header: HeaderTemplate) -> Self {
        Self { config, header }
    }

    /// The tracking issue.
    pub fn issue(&self) -> IssueRef {
        IssueRef::new(
            self.config.repository().clone(),
            self.config.issue_number(),
        )
    }

    /// Computes the update for the tracking issue, given the issue's current body.
    pub fn plan(
        &self,
        outcomes: &[Outcome],
        previous_body: &str,
        now: DateTime<Utc>,
    ) -> Result<SyncPlan, TemplateError> {
        let prior = parse_history(previous_body);
        info!(
            "found {} tests in the history of {}",
            prior.len(),
            self.issue()
        );

        let num_runs = self.config.num_runs();
        let history = merge_outcomes(outcomes, &prior, self.config);
        let table = render_table(&history, num_runs);
        let header = self.header.render(&HeaderContext::new(now))?;

        let state = if outcomes.is_empty() {
            IssueState::Closed
        } else {
            IssueState::Open
        };
        let update = IssueUpdate {
            title: self.config.issue_title().map(str::to_owned),
            body: format!("{header}\n\n{table}"),
            state,
        };

        Ok(SyncPlan {
            issue: self.issue(),
            num_runs,
            history,
            table,
            update,
        })
    }

    /// Reads the tracking issue, merges `outcomes` into its history, and writes it back.
    ///
    /// With `dry_run`, the update is computed but not applied.
    pub fn run(
        &self,
        tracker: &dyn IssueTracker,
        outcomes: &[Outcome],
        now: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<SyncPlan, SyncError> {
        let issue = self.issue();
        let previous_body = tracker.fetch_body(&issue)?;
        let plan = self.plan(outcomes, &previous_body, now)?;

        if dry_run {
            info!(
                "dry run: not updating {issue} (would be {}, {} tests)",
                plan.update.state,
                plan.history.len()
            );
        } else {
            tracker.update(&issue, &plan.update)?;
            info!(
                "updated {issue} ({}, {} tests)",
                plan.update.state,
                plan.history.len()
            );
        }

        Ok(plan)
    }
}

/// The computed update for the tracking issue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncPlan {
    /// The tracking issue.
    pub issue: IssueRef,

    /// The number of runs kept in each test's history.
    pub num_runs: NonZeroUsize,

    /// The merged history.
    pub history: HistoryMap,

    /// The history, rendered as a markdown table.
    pub table: String,

    /// The update to apply to the issue.
    pub update: IssueUpdate,
}

impl SyncPlan {
    /// Returns the rows of the history table, with their computed columns.
    pub fn rows(&self) -> Vec<HistoryRow<'_>> {
        history_rows(&self.history, self.num_runs)
    }
}
