// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{IssueRef, IssueTracker, IssueUpdate};
use crate::{config::ApiToken, errors::IssueSyncError};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

const USER_AGENT: &str = concat!("quarantine-tracker/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// An [`IssueTracker`] backed by the GitHub REST API.
pub struct GitHubIssueTracker {
    agent: Agent,
    api_url: String,
    token: Option<ApiToken>,
}

impl GitHubIssueTracker {
    /// Creates a new tracker talking to the API at `api_url`.
    ///
    /// Without a token, requests are unauthenticated: reading a public issue works, but updating
    /// it won't.
    pub fn new(api_url: impl Into<String>, token: Option<ApiToken>) -> Self {
        if token.is_none() {
            warn!("no GitHub token provided, requests will be unauthenticated");
        }
        Self {
            agent: Agent::new_with_defaults(),
            api_url: api_url.into(),
            token,
        }
    }

    fn issue_url(&self, issue: &IssueRef) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}",
            self.api_url.trim_end_matches('/'),
            issue.repository.owner(),
            issue.repository.name(),
            issue.number,
        )
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        let request = request
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token.expose())),
            None => request,
        }
    }
}

impl fmt::Debug for GitHubIssueTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubIssueTracker")
            .field("api_url", &self.api_url)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct IssueResponse {
    body: Option<String>,
}

fn request_error(
    method: &'static str,
    url: &str,
    issue: &IssueRef,
    err: ureq::Error,
) -> IssueSyncError {
    match err {
        ureq::Error::StatusCode(404) => IssueSyncError::NotFound {
            issue: issue.to_string(),
        },
        err => IssueSyncError::Request {
            method,
            url: url.to_owned(),
            err: Box::new(err),
        },
    }
}

impl IssueTracker for GitHubIssueTracker {
    fn fetch_body(&self, issue: &IssueRef) -> Result<String, IssueSyncError> {
        let url = self.issue_url(issue);
        debug!("fetching issue {issue} from {url}");

        let mut response = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(|err| request_error("GET", &url, issue, err))?;
        let issue_response: IssueResponse = response
            .body_mut()
            .read_json()
            .map_err(|err| IssueSyncError::Decode {
                url: url.clone(),
                err: Box::new(err),
            })?;

        Ok(issue_response.body.unwrap_or_default())
    }

    fn update(&self, issue: &IssueRef, update: &IssueUpdate) -> Result<(), IssueSyncError> {
        let url = self.issue_url(issue);
        debug!("updating issue {issue} at {url} (state: {})", update.state);

        self.authorize(self.agent.patch(&url))
            .send_json(update)
            .map_err(|err| request_error("PATCH", &url, issue, err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueState;

    fn issue() -> IssueRef {
        IssueRef::new("apache/airflow".parse().expect("valid repository"), 10118)
    }

    #[test]
    fn issue_url() {
        let tracker = GitHubIssueTracker::new("https://api.github.com/", None);
        assert_eq!(
            tracker.issue_url(&issue()),
            "https://api.github.com/repos/apache/airflow/issues/10118"
        );

        let tracker = GitHubIssueTracker::new(
            "https://ghe.example.com/api/v3",
            Some(ApiToken::new("ghp_secret")),
        );
        assert_eq!(
            tracker.issue_url(&issue()),
            "https://ghe.example.com/api/v3/repos/apache/airflow/issues/10118"
        );
        assert!(!format!("{tracker:?}").contains("ghp_secret"));
    }

    #[test]
    fn update_payload() {
        let update = IssueUpdate {
            title: None,
            body: "header\n\n| Test |".to_owned(),
            state: IssueState::Closed,
        };
        assert_eq!(
            serde_json::to_string(&update).expect("serializes"),
            r#"{"body":"header\n\n| Test |","state":"closed"}"#
        );

        let update = IssueUpdate {
            title: Some("Quarantined tests".to_owned()),
            state: IssueState::Open,
            ..update
        };
        assert_eq!(
            serde_json::to_string(&update).expect("serializes"),
            r#"{"title":"Quarantined tests","body":"header\n\n| Test |","state":"open"}"#
        );
    }

    #[test]
    fn null_body_is_empty() {
        let response: IssueResponse =
            serde_json::from_str(r#"{"number": 10118, "body": null}"#).expect("deserializes");
        assert_eq!(response.body.unwrap_or_default(), "");
    }
}
