// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The header written above the history table.
//!
//! Templates use Jinja syntax, rendered with `minijinja`. Rendering is strict: referencing a
//! variable that isn't defined is an error. Values are HTML-escaped when substituted.

use crate::errors::TemplateError;
use camino::Utf8Path;
use chrono::{DateTime, SecondsFormat, Utc};
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// The variable holding the time of the run.
pub const DATE_UTC_NOW: &str = "DATE_UTC_NOW";

static DEFAULT_TEMPLATE: &str = include_str!("../templates/quarantine_issue_header.md");

/// A header template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderTemplate {
    source: String,
}

impl HeaderTemplate {
    /// Creates a template from its source text.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Returns the built-in template.
    pub fn default_template() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }

    /// Reads a template from disk.
    pub fn from_path(path: &Utf8Path) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|err| TemplateError::Read {
            path: path.to_owned(),
            err,
        })?;
        Ok(Self::new(source))
    }

    /// Reads the template at `path`, or returns the built-in template if there's no path.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, TemplateError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default_template()),
        }
    }

    /// Returns the template's source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the names of the variables the template reads from its context.
    pub fn references(&self) -> Result<BTreeSet<String>, TemplateError> {
        let env = environment();
        let template = env
            .template_from_str(&self.source)
            .map_err(|err| TemplateError::Syntax { err })?;
        Ok(template.undeclared_variables(false).into_iter().collect())
    }

    /// Renders the template.
    ///
    /// A single trailing newline is dropped from the output.
    pub fn render(&self, context: &HeaderContext) -> Result<String, TemplateError> {
        let env = environment();
        let template = env
            .template_from_str(&self.source)
            .map_err(|err| TemplateError::Syntax { err })?;
        let references = template.undeclared_variables(false);
        if !references.contains(DATE_UTC_NOW) {
            warn!("header template doesn't reference {DATE_UTC_NOW}");
        }

        template.render(&context.vars).map_err(|err| {
            let line = err.line().unwrap_or_default();
            if matches!(err.kind(), ErrorKind::UndefinedError) {
                if let Some(name) = self.missing_variable(&references, context, line) {
                    return TemplateError::UndefinedVariable { name, line };
                }
            }
            TemplateError::Render { err }
        })
    }

    /// Picks the variable missing from `context` that most likely caused an undefined error on
    /// `line`.
    fn missing_variable<'a>(
        &self,
        references: impl IntoIterator<Item = &'a String>,
        context: &HeaderContext,
        line: usize,
    ) -> Option<String> {
        let source_line = self.source.lines().nth(line.saturating_sub(1)).unwrap_or_default();
        let missing: BTreeSet<&str> = references
            .into_iter()
            .map(String::as_str)
            .filter(|name| context.get(name).is_none())
            .collect();
        missing
            .iter()
            .find(|name| source_line.contains(**name))
            .or_else(|| missing.first())
            .map(|name| (*name).to_owned())
    }
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env
}

/// The variables available to a [`HeaderTemplate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderContext {
    vars: BTreeMap<String, String>,
}

impl HeaderContext {
    /// Creates a context for a run happening at `now`.
    ///
    /// The time is available as [`DATE_UTC_NOW`], in RFC 3339 format with second precision.
    pub fn new(now: DateTime<Utc>) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(
            DATE_UTC_NOW.to_owned(),
            now.to_rfc3339_opts(SecondsFormat::Secs, false),
        );
        Self { vars }
    }

    /// Defines an additional variable.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Returns the value of a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}
