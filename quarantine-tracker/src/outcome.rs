// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flattening a JUnit report into per-test outcomes.

use crate::errors::ReportReadError;
use camino::Utf8Path;
use quarantine_junit::{DeserializeError, Report, TestCase};
use serde::Serialize;

/// The result of one test in the current run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// The test's identity, `classname::name`.
    pub test_id: String,

    /// The test's display name.
    pub name: String,

    /// The source file the test is defined in.
    pub file: String,

    /// The line the test is defined on, if known.
    pub line: Option<u32>,

    /// Whether the test passed.
    pub passed: bool,
}

/// Forms a test ID out of a classname and a test name.
///
/// History records are keyed by this, so it must stay stable across runs.
pub fn test_id(classname: &str, name: &str) -> String {
    format!("{classname}::{name}")
}

/// Reads the report at `path` and flattens it into outcomes.
pub fn read_outcomes(path: &Utf8Path) -> Result<Vec<Outcome>, ReportReadError> {
    let input = std::fs::read_to_string(path).map_err(|err| ReportReadError::Read {
        path: path.to_owned(),
        err,
    })?;
    let report = Report::deserialize_str(&input).map_err(|err| match err {
        DeserializeError::MissingTestsuites => ReportReadError::NoTestsuites,
        err => ReportReadError::Parse {
            path: path.to_owned(),
            err,
        },
    })?;
    outcomes_from_report(&report)
}

/// Flattens a report into outcomes, in document order.
///
/// Skipped tests don't produce an outcome. A report whose container holds no testsuite is an
/// error.
pub fn outcomes_from_report(report: &Report) -> Result<Vec<Outcome>, ReportReadError> {
    if report.testsuites.is_empty() {
        return Err(ReportReadError::NoTestsuite);
    }

    let mut outcomes = Vec::new();
    for testcase in report.testcases() {
        if let Some(outcome) = outcome_for(testcase)? {
            outcomes.push(outcome);
        }
    }
    Ok(outcomes)
}

fn outcome_for(testcase: &TestCase) -> Result<Option<Outcome>, ReportReadError> {
    let classname = testcase.classname.as_deref().unwrap_or_default();
    tracing::debug!("parsing: {}::{}", classname, testcase.name);

    if testcase.status.is_skipped() {
        tracing::debug!("skipping {}", testcase.name);
        return Ok(None);
    }

    let Some(classname) = testcase.classname.as_deref() else {
        return Err(ReportReadError::MissingTestcaseAttribute {
            test: testcase.name.clone(),
            attribute: "classname",
        });
    };
    let test_id = test_id(classname, &testcase.name);
    let Some(file) = testcase.file.clone() else {
        return Err(ReportReadError::MissingTestcaseAttribute {
            test: test_id,
            attribute: "file",
        });
    };

    Ok(Some(Outcome {
        test_id,
        name: testcase.name.clone(),
        file,
        line: testcase.line,
        passed: testcase.status.is_passed(),
    }))
}
