// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{deserialize::deserialize_report, DeserializeError};
use indexmap::map::IndexMap;
use std::time::Duration;

/// The `<testsuites>` element of a JUnit report, and everything below it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    /// The `name` attribute, if present.
    pub name: Option<String>,

    /// Total time taken by the run, read from a number of seconds.
    pub time: Option<Duration>,

    /// Totals as written in the document. They are not checked against the testcases.
    pub counts: DeclaredCounts,

    /// Test suites, in document order.
    pub testsuites: Vec<TestSuite>,
}

impl Report {
    /// Reads a report from a JUnit XML document.
    ///
    /// The document must contain a `<testsuites>` element, which may be nested inside another
    /// root. Elements the data model doesn't cover are skipped.
    pub fn deserialize_str(input: &str) -> Result<Self, DeserializeError> {
        deserialize_report(input)
    }

    /// Iterates over the testcases of every suite, in document order.
    pub fn testcases(&self) -> impl Iterator<Item = &TestCase> + '_ {
        self.testsuites
            .iter()
            .flat_map(|testsuite| testsuite.testcases.iter())
    }
}

/// Test counts declared by `tests`, `failures`, `errors` and `skipped` attributes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclaredCounts {
    /// Number of tests.
    pub tests: Option<usize>,

    /// Number of tests that failed an assertion.
    pub failures: Option<usize>,

    /// Number of tests that errored out.
    pub errors: Option<usize>,

    /// Number of tests that were not run.
    pub skipped: Option<usize>,
}

/// A `<testsuite>` element.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct TestSuite {
    /// The suite's name.
    pub name: String,

    /// Time taken by the suite. A malformed value is kept in [`extra`](Self::extra) instead.
    pub time: Option<Duration>,

    /// Totals as written in the document.
    pub counts: DeclaredCounts,

    /// Testcases, in document order.
    pub testcases: Vec<TestCase>,

    /// Entries of the `<properties>` element.
    pub properties: Vec<Property>,

    /// The suite's `<system-out>`.
    pub system_out: Option<CapturedOutput>,

    /// The suite's `<system-err>`.
    pub system_err: Option<CapturedOutput>,

    /// Remaining attributes, such as `hostname` or `timestamp`, in document order.
    pub extra: IndexMap<String, String>,
}

impl TestSuite {
    /// Creates an empty `TestSuite`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A `<testcase>` element.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct TestCase {
    /// The test's name.
    pub name: String,

    /// The `classname` attribute: for pytest, the dotted module path plus any enclosing class.
    pub classname: Option<String>,

    /// The `file` attribute, relative to the repository root.
    ///
    /// This is not part of the JUnit schema, but pytest and several other tools emit it.
    pub file: Option<String>,

    /// The `line` attribute.
    ///
    /// This is not part of the JUnit schema, but pytest and several other tools emit it. A value
    /// that isn't a line number is kept in [`extra`](Self::extra) instead.
    pub line: Option<u32>,

    /// Time taken by the test. A value that isn't a number of seconds is kept in
    /// [`extra`](Self::extra) instead.
    pub time: Option<Duration>,

    /// How the test ended.
    pub status: TestCaseStatus,

    /// The test's `<system-out>`.
    pub system_out: Option<CapturedOutput>,

    /// The test's `<system-err>`.
    pub system_err: Option<CapturedOutput>,

    /// Remaining attributes, in document order.
    pub extra: IndexMap<String, String>,
}

impl TestCase {
    /// Creates a testcase with only a name and a status.
    pub fn new(name: impl Into<String>, status: TestCaseStatus) -> Self {
        Self {
            name: name.into(),
            classname: None,
            file: None,
            line: None,
            time: None,
            status,
            system_out: None,
            system_err: None,
            extra: IndexMap::new(),
        }
    }
}

/// How a testcase ended.
///
/// A testcase without `<failure>`, `<error>` or `<skipped>` children passed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TestCaseStatus {
    /// The test passed.
    #[default]
    Passed,

    /// The test had a `<failure>` or `<error>` child.
    Failed {
        /// Which of the two elements was present.
        kind: FailureKind,

        /// What the element said.
        detail: StatusDetail,
    },

    /// The test had a `<skipped>` child.
    Skipped(StatusDetail),
}

impl TestCaseStatus {
    /// A failed status with no detail.
    pub fn failed(kind: FailureKind) -> Self {
        Self::Failed {
            kind,
            detail: StatusDetail::default(),
        }
    }

    /// A skipped status with no detail.
    pub fn skipped() -> Self {
        Self::Skipped(StatusDetail::default())
    }

    /// Returns true if the test was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Returns true if the test ran and passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Returns the failure or skip detail, if any.
    pub fn detail(&self) -> Option<&StatusDetail> {
        match self {
            Self::Passed => None,
            Self::Failed { detail, .. } | Self::Skipped(detail) => Some(detail),
        }
    }

    pub(crate) fn detail_mut(&mut self) -> Option<&mut StatusDetail> {
        match self {
            Self::Passed => None,
            Self::Failed { detail, .. } | Self::Skipped(detail) => Some(detail),
        }
    }
}

/// The element a failed test was reported with.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// `<failure>`: an assertion did not hold.
    Failure,

    /// `<error>`: the test could not run to completion, e.g. an exception during setup.
    Error,
}

/// The attributes and text of a `<failure>`, `<error>` or `<skipped>` element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusDetail {
    /// The `message` attribute.
    pub message: Option<String>,

    /// The `type` attribute.
    pub ty: Option<String>,

    /// The element's text, usually a traceback.
    pub description: Option<String>,
}

/// A `<property>` of a test suite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// The property's name.
    pub name: String,

    /// The property's value. Missing values are empty.
    pub value: String,
}

impl Property {
    /// Creates a new `Property`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Text captured from a test's stdout or stderr.
///
/// Control characters other than tabs and newlines are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedOutput(Box<str>);

impl CapturedOutput {
    /// Creates a new `CapturedOutput`.
    pub fn new(text: impl AsRef<str>) -> Self {
        let text: String = text
            .as_ref()
            .chars()
            .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
            .collect();
        Self(text.into_boxed_str())
    }

    /// Returns the captured text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CapturedOutput {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
