// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading and writing the tracking issue.
//!
//! The tracker only needs two operations from an issue tracker, described by [`IssueTracker`].
//! [`GitHubIssueTracker`] talks to the GitHub REST API, and [`InMemoryIssueTracker`] keeps
//! issues in memory.

mod github;
mod memory;

pub use github::GitHubIssueTracker;
pub use memory::InMemoryIssueTracker;

use crate::{config::RepositoryName, errors::IssueSyncError};
use serde::Serialize;
use std::fmt;

/// Identifies an issue.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssueRef {
    /// The repository the issue belongs to.
    pub repository: RepositoryName,

    /// The issue number.
    pub number: u64,
}

impl IssueRef {
    /// Creates a new `IssueRef`.
    pub fn new(repository: RepositoryName, number: u64) -> Self {
        Self { repository, number }
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repository, self.number)
    }
}

/// Whether an issue is open or closed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// The issue is open.
    Open,

    /// The issue is closed.
    Closed,
}

impl IssueState {
    /// Returns the state as the GitHub API spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change to an issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IssueUpdate {
    /// The new title. The title is left unchanged if this is `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The new body.
    pub body: String,

    /// The new state.
    pub state: IssueState,
}

/// An issue tracker that holds the tracking issue.
pub trait IssueTracker {
    /// Returns the body of an issue. An issue without a body has an empty one.
    fn fetch_body(&self, issue: &IssueRef) -> Result<String, IssueSyncError>;

    /// Applies an update to an issue.
    fn update(&self, issue: &IssueRef, update: &IssueUpdate) -> Result<(), IssueSyncError>;
}
