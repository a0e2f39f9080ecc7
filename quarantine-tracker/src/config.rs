// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracker configuration.
//!
//! All settings are collected once, at startup, into an immutable [`TrackerConfig`] which is then
//! passed to every component that needs it.

use crate::errors::ConfigError;
use camino::Utf8PathBuf;
use std::{fmt, num::NonZeroUsize, str::FromStr};
use url::Url;

/// The default number of runs kept in each test's history.
pub const DEFAULT_NUM_RUNS: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

/// The default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// The default GitHub web endpoint, used to build permalinks.
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// The default branch permalinks point at.
pub const DEFAULT_BRANCH: &str = "main";

/// A repository in `owner/name` form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepositoryName {
    owner: String,
    name: String,
}

impl RepositoryName {
    /// Returns the owner (user or organization).
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepositoryName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRepository {
            input: s.to_owned(),
        };
        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A credential for the issue tracker API.
///
/// The `Debug` implementation never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Creates a new token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token itself, for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// Builds links to a test's source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermalinkBase {
    server_url: Url,
    repository: RepositoryName,
    branch: String,
}

impl PermalinkBase {
    /// Creates a new `PermalinkBase` pointing at `branch` of `repository` on `server_url`.
    pub fn new(
        server_url: &str,
        repository: RepositoryName,
        branch: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let parsed = Url::parse(server_url).map_err(|err| ConfigError::InvalidServerUrl {
            input: server_url.to_owned(),
            err,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::ServerUrlNotBase {
                input: server_url.to_owned(),
            });
        }
        Ok(Self {
            server_url: parsed,
            repository,
            branch: branch.into(),
        })
    }

    /// Returns a markdown link to the given source location, labeled with `name`.
    ///
    /// The test ID is embedded, percent-encoded, as the `test_id` query parameter so that it can
    /// be recovered from the link later. The link target never contains parentheses, pipes or
    /// whitespace, and pipes in the label are escaped, so the link survives inside a table cell.
    pub fn markdown_link(&self, name: &str, file: &str, line: Option<u32>, test_id: &str) -> String {
        let mut url = self.server_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([
                    self.repository.owner(),
                    self.repository.name(),
                    "blob",
                    self.branch.as_str(),
                ])
                .extend(file.split('/'));
        }
        url.query_pairs_mut().append_pair("test_id", test_id);
        if let Some(line) = line {
            url.set_fragment(Some(&format!("L{line}")));
        }

        let mut link = String::with_capacity(name.len() + url.as_str().len() + 4);
        link.push('[');
        link.push_str(&name.replace('|', "\\|"));
        link.push_str("](");
        for c in url.as_str().chars() {
            match c {
                '(' => link.push_str("%28"),
                ')' => link.push_str("%29"),
                '|' => link.push_str("%7C"),
                c => link.push(c),
            }
        }
        link.push(')');
        link
    }
}

/// The immutable configuration for a tracker run.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    repository: RepositoryName,
    issue_number: u64,
    num_runs: NonZeroUsize,
    token: Option<ApiToken>,
    api_url: String,
    permalink: PermalinkBase,
    header_template: Option<Utf8PathBuf>,
    issue_title: Option<String>,
}

impl TrackerConfig {
    /// Returns a builder for a `TrackerConfig`.
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }

    /// The repository that holds the tracking issue.
    pub fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// The tracking issue's number.
    pub fn issue_number(&self) -> u64 {
        self.issue_number
    }

    /// The number of runs kept in each test's history.
    pub fn num_runs(&self) -> NonZeroUsize {
        self.num_runs
    }

    /// The API credential, if one was provided.
    pub fn token(&self) -> Option<&ApiToken> {
        self.token.as_ref()
    }

    /// The issue tracker's API endpoint.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// How to link to a test's source.
    pub fn permalink(&self) -> &PermalinkBase {
        &self.permalink
    }

    /// A custom header template, if any. The built-in template is used otherwise.
    pub fn header_template(&self) -> Option<&Utf8PathBuf> {
        self.header_template.as_ref()
    }

    /// A new title for the tracking issue, if any. The title is left alone otherwise.
    pub fn issue_title(&self) -> Option<&str> {
        self.issue_title.as_deref()
    }
}

/// A builder for [`TrackerConfig`].
///
/// Every setter accepts an `Option` so that values coming straight from the command line or the
/// environment can be passed through; validation happens in [`build`](Self::build).
#[derive(Clone, Debug, Default)]
pub struct TrackerConfigBuilder {
    repository: Option<String>,
    issue_number: Option<u64>,
    num_runs: Option<usize>,
    token: Option<String>,
    api_url: Option<String>,
    server_url: Option<String>,
    branch: Option<String>,
    header_template: Option<Utf8PathBuf>,
    issue_title: Option<String>,
}

impl TrackerConfigBuilder {
    /// Sets the repository, in `owner/name` form.
    pub fn repository(mut self, repository: impl Into<Option<String>>) -> Self {
        self.repository = repository.into();
        self
    }

    /// Sets the tracking issue's number.
    pub fn issue_number(mut self, issue_number: impl Into<Option<u64>>) -> Self {
        self.issue_number = issue_number.into();
        self
    }

    /// Sets the number of runs to keep. Defaults to [`DEFAULT_NUM_RUNS`].
    pub fn num_runs(mut self, num_runs: impl Into<Option<usize>>) -> Self {
        self.num_runs = num_runs.into();
        self
    }

    /// Sets the API credential.
    pub fn token(mut self, token: impl Into<Option<String>>) -> Self {
        self.token = token.into();
        self
    }

    /// Sets the API endpoint. Defaults to [`DEFAULT_API_URL`].
    pub fn api_url(mut self, api_url: impl Into<Option<String>>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the web endpoint used in permalinks. Defaults to [`DEFAULT_SERVER_URL`].
    pub fn server_url(mut self, server_url: impl Into<Option<String>>) -> Self {
        self.server_url = server_url.into();
        self
    }

    /// Sets the branch used in permalinks. Defaults to [`DEFAULT_BRANCH`].
    pub fn branch(mut self, branch: impl Into<Option<String>>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Sets the path to a custom header template.
    pub fn header_template(mut self, path: impl Into<Option<Utf8PathBuf>>) -> Self {
        self.header_template = path.into();
        self
    }

    /// Sets a new title for the tracking issue.
    pub fn issue_title(mut self, title: impl Into<Option<String>>) -> Self {
        self.issue_title = title.into();
        self
    }

    /// Validates the settings and builds the config.
    pub fn build(self) -> Result<TrackerConfig, ConfigError> {
        let repository: RepositoryName = match self.repository.as_deref().map(str::trim) {
            None | Some("") => return Err(ConfigError::MissingRepository),
            Some(repository) => repository.parse()?,
        };
        let issue_number = match self.issue_number {
            None | Some(0) => return Err(ConfigError::MissingIssueNumber),
            Some(issue_number) => issue_number,
        };
        let num_runs = match self.num_runs {
            None => DEFAULT_NUM_RUNS,
            Some(num_runs) => NonZeroUsize::new(num_runs).ok_or(ConfigError::InvalidNumRuns)?,
        };
        // An empty token (e.g. `GITHUB_TOKEN=`) is the same as no token.
        let token = self
            .token
            .filter(|token| !token.is_empty())
            .map(ApiToken::new);
        let permalink = PermalinkBase::new(
            self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL),
            repository.clone(),
            self.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_owned()),
        )?;

        Ok(TrackerConfig {
            repository,
            issue_number,
            num_runs,
            token,
            api_url: self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            permalink,
            header_template: self.header_template,
            issue_title: self.issue_title.filter(|title| !title.is_empty()),
        })
    }
}
