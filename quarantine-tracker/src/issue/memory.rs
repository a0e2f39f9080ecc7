// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{IssueRef, IssueTracker, IssueUpdate};
use crate::errors::IssueSyncError;
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// An [`IssueTracker`] that keeps issues in memory and records every update.
#[derive(Debug, Default)]
pub struct InMemoryIssueTracker {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    bodies: BTreeMap<IssueRef, Option<String>>,
    updates: Vec<(IssueRef, IssueUpdate)>,
}

impl InMemoryIssueTracker {
    /// Creates a tracker with no issues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an issue. A `None` body stands for an issue without a body.
    pub fn with_issue(self, issue: IssueRef, body: Option<String>) -> Self {
        self.lock().bodies.insert(issue, body);
        self
    }

    /// Returns the current body of an issue, if the issue exists.
    pub fn body(&self, issue: &IssueRef) -> Option<String> {
        self.lock()
            .bodies
            .get(issue)
            .map(|body| body.clone().unwrap_or_default())
    }

    /// Returns every update applied so far, oldest first.
    pub fn updates(&self) -> Vec<(IssueRef, IssueUpdate)> {
        self.lock().updates.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IssueTracker for InMemoryIssueTracker {
    fn fetch_body(&self, issue: &IssueRef) -> Result<String, IssueSyncError> {
        self.body(issue).ok_or_else(|| IssueSyncError::NotFound {
            issue: issue.to_string(),
        })
    }

    fn update(&self, issue: &IssueRef, update: &IssueUpdate) -> Result<(), IssueSyncError> {
        let mut inner = self.lock();
        let Some(body) = inner.bodies.get_mut(issue) else {
            return Err(IssueSyncError::NotFound {
                issue: issue.to_string(),
            });
        };
        *body = Some(update.body.clone());
        inner.updates.push((issue.clone(), update.clone()));
        Ok(())
    }
}
