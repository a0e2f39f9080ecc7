// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deserialize a `Report`.

use crate::{
    CapturedOutput, DeclaredCounts, DeserializeError, FailureKind, Property, Report, TestCase,
    TestCaseStatus, TestSuite,
};
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use std::{str::FromStr, time::Duration};

static TESTSUITES_TAG: &str = "testsuites";
static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static PROPERTIES_TAG: &str = "properties";
static PROPERTY_TAG: &str = "property";
static FAILURE_TAG: &str = "failure";
static ERROR_TAG: &str = "error";
static SKIPPED_TAG: &str = "skipped";
static SYSTEM_OUT_TAG: &str = "system-out";
static SYSTEM_ERR_TAG: &str = "system-err";

pub(crate) fn deserialize_report(input: &str) -> Result<Report, DeserializeError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);
    let mut deserializer = Deserializer { reader };
    deserializer.report()
}

struct Deserializer<'a> {
    reader: Reader<&'a [u8]>,
}

/// Whether an element was written as `<tag/>` or `<tag>...</tag>`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ElementShape {
    Empty,
    Open,
}

impl<'a> Deserializer<'a> {
    fn report(&mut self) -> Result<Report, DeserializeError> {
        // The container may be nested inside some other root element, so keep descending until
        // it shows up.
        loop {
            match self.next_event()? {
                Event::Start(start) if is_tag(&start, TESTSUITES_TAG) => {
                    return self.testsuites(&start, ElementShape::Open);
                }
                Event::Empty(start) if is_tag(&start, TESTSUITES_TAG) => {
                    return self.testsuites(&start, ElementShape::Empty);
                }
                Event::Eof => return Err(DeserializeError::MissingTestsuites),
                _ => {}
            }
        }
    }

    fn testsuites(
        &mut self,
        start: &BytesStart<'a>,
        shape: ElementShape,
    ) -> Result<Report, DeserializeError> {
        let mut report = Report::default();
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "name" => report.name = Some(value),
                // There's nowhere to keep a malformed run time, so it's dropped.
                "time" => report.time = parse_time(&value),
                _ => {
                    read_count(&mut report.counts, TESTSUITES_TAG, &key, &value)?;
                }
            }
        }

        if shape == ElementShape::Empty {
            return Ok(report);
        }

        loop {
            match self.next_event()? {
                Event::Start(start) if is_tag(&start, TESTSUITE_TAG) => {
                    let testsuite = self.testsuite(&start, ElementShape::Open)?;
                    report.testsuites.push(testsuite);
                }
                Event::Empty(start) if is_tag(&start, TESTSUITE_TAG) => {
                    let testsuite = self.testsuite(&start, ElementShape::Empty)?;
                    report.testsuites.push(testsuite);
                }
                Event::Start(start) => self.skip(&start)?,
                Event::End(_) => return Ok(report),
                Event::Eof => {
                    return Err(DeserializeError::UnexpectedEof {
                        element: TESTSUITES_TAG,
                    })
                }
                _ => {}
            }
        }
    }

    fn testsuite(
        &mut self,
        start: &BytesStart<'a>,
        shape: ElementShape,
    ) -> Result<TestSuite, DeserializeError> {
        let mut testsuite = TestSuite::new("");
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "name" => testsuite.name = value,
                "time" => match parse_time(&value) {
                    Some(time) => testsuite.time = Some(time),
                    None => {
                        testsuite.extra.insert(key, value);
                    }
                },
                _ => {
                    if !read_count(&mut testsuite.counts, TESTSUITE_TAG, &key, &value)? {
                        testsuite.extra.insert(key, value);
                    }
                }
            }
        }

        if shape == ElementShape::Empty {
            return Ok(testsuite);
        }

        loop {
            match self.next_event()? {
                Event::Start(start) if is_tag(&start, TESTCASE_TAG) => {
                    let testcase = self.testcase(&start, ElementShape::Open)?;
                    testsuite.testcases.push(testcase);
                }
                Event::Empty(start) if is_tag(&start, TESTCASE_TAG) => {
                    let testcase = self.testcase(&start, ElementShape::Empty)?;
                    testsuite.testcases.push(testcase);
                }
                Event::Start(start) if is_tag(&start, PROPERTIES_TAG) => {
                    let properties = self.properties()?;
                    testsuite.properties.extend(properties);
                }
                Event::Start(start) if is_tag(&start, SYSTEM_OUT_TAG) => {
                    testsuite.system_out = self.text(SYSTEM_OUT_TAG)?.map(CapturedOutput::new);
                }
                Event::Start(start) if is_tag(&start, SYSTEM_ERR_TAG) => {
                    testsuite.system_err = self.text(SYSTEM_ERR_TAG)?.map(CapturedOutput::new);
                }
                Event::Start(start) => self.skip(&start)?,
                Event::End(_) => return Ok(testsuite),
                Event::Eof => {
                    return Err(DeserializeError::UnexpectedEof {
                        element: TESTSUITE_TAG,
                    })
                }
                _ => {}
            }
        }
    }

    fn properties(&mut self) -> Result<Vec<Property>, DeserializeError> {
        let mut properties = vec![];
        loop {
            match self.next_event()? {
                Event::Empty(start) if is_tag(&start, PROPERTY_TAG) => {
                    properties.push(self.property(&start)?);
                }
                Event::Start(start) if is_tag(&start, PROPERTY_TAG) => {
                    properties.push(self.property(&start)?);
                    self.skip(&start)?;
                }
                Event::Start(start) => self.skip(&start)?,
                Event::End(_) => return Ok(properties),
                Event::Eof => {
                    return Err(DeserializeError::UnexpectedEof {
                        element: PROPERTIES_TAG,
                    })
                }
                _ => {}
            }
        }
    }

    fn property(&mut self, start: &BytesStart<'a>) -> Result<Property, DeserializeError> {
        let mut name = None;
        let mut value = None;
        for (key, attr_value) in self.attributes(start)? {
            match key.as_str() {
                "name" => name = Some(attr_value),
                "value" => value = Some(attr_value),
                _ => {}
            }
        }
        let name = name.ok_or(DeserializeError::MissingAttribute {
            element: PROPERTY_TAG,
            attribute: "name",
        })?;
        Ok(Property::new(name, value.unwrap_or_default()))
    }

    fn testcase(
        &mut self,
        start: &BytesStart<'a>,
        shape: ElementShape,
    ) -> Result<TestCase, DeserializeError> {
        let mut name = None;
        let mut testcase = TestCase::new("", TestCaseStatus::Passed);
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "name" => name = Some(value),
                "classname" => testcase.classname = Some(value),
                "file" => testcase.file = Some(value),
                "line" => match value.trim().parse() {
                    Ok(line) => testcase.line = Some(line),
                    Err(_) => {
                        testcase.extra.insert(key, value);
                    }
                },
                "time" => match parse_time(&value) {
                    Some(time) => testcase.time = Some(time),
                    None => {
                        testcase.extra.insert(key, value);
                    }
                },
                _ => {
                    testcase.extra.insert(key, value);
                }
            }
        }
        testcase.name = name.ok_or(DeserializeError::MissingAttribute {
            element: TESTCASE_TAG,
            attribute: "name",
        })?;

        if shape == ElementShape::Empty {
            return Ok(testcase);
        }

        // A skip marker wins over any failure, and the first failure or error wins over later
        // ones.
        let mut skipped = None;
        let mut non_success = None;
        loop {
            match self.next_event()? {
                Event::Start(start) => {
                    if let Some(status) = self.status(&start, ElementShape::Open)? {
                        record_status(status, &mut skipped, &mut non_success);
                    } else if is_tag(&start, SYSTEM_OUT_TAG) {
                        testcase.system_out = self.text(SYSTEM_OUT_TAG)?.map(CapturedOutput::new);
                    } else if is_tag(&start, SYSTEM_ERR_TAG) {
                        testcase.system_err = self.text(SYSTEM_ERR_TAG)?.map(CapturedOutput::new);
                    } else {
                        self.skip(&start)?;
                    }
                }
                Event::Empty(start) => {
                    if let Some(status) = self.status(&start, ElementShape::Empty)? {
                        record_status(status, &mut skipped, &mut non_success);
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(DeserializeError::UnexpectedEof {
                        element: TESTCASE_TAG,
                    })
                }
                _ => {}
            }
        }

        if let Some(status) = skipped.or(non_success) {
            testcase.status = status;
        }
        Ok(testcase)
    }

    /// Reads a `<failure>`, `<error>` or `<skipped>` element. Returns `None` for any other
    /// element, without consuming anything.
    fn status(
        &mut self,
        start: &BytesStart<'a>,
        shape: ElementShape,
    ) -> Result<Option<TestCaseStatus>, DeserializeError> {
        let (mut status, tag) = if is_tag(start, FAILURE_TAG) {
            (TestCaseStatus::failed(FailureKind::Failure), FAILURE_TAG)
        } else if is_tag(start, ERROR_TAG) {
            (TestCaseStatus::failed(FailureKind::Error), ERROR_TAG)
        } else if is_tag(start, SKIPPED_TAG) {
            (TestCaseStatus::skipped(), SKIPPED_TAG)
        } else {
            return Ok(None);
        };

        let attributes = self.attributes(start)?;
        let description = match shape {
            ElementShape::Open => self.text(tag)?,
            ElementShape::Empty => None,
        };
        if let Some(detail) = status.detail_mut() {
            for (key, value) in attributes {
                match key.as_str() {
                    "message" => detail.message = Some(value),
                    "type" => detail.ty = Some(value),
                    _ => {}
                }
            }
            detail.description = description;
        }

        Ok(Some(status))
    }

    /// Collects the text and CDATA content of the current element up to its end tag. Nested
    /// elements are skipped.
    fn text(&mut self, element: &'static str) -> Result<Option<String>, DeserializeError> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Text(t) => {
                    let unescaped = t
                        .unescape()
                        .map_err(|err| DeserializeError::xml(self.reader.buffer_position(), err))?;
                    text.push_str(&unescaped);
                }
                Event::CData(cdata) => {
                    text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
                Event::Start(start) => self.skip(&start)?,
                Event::End(_) => break,
                Event::Eof => return Err(DeserializeError::UnexpectedEof { element }),
                _ => {}
            }
        }
        Ok((!text.is_empty()).then_some(text))
    }

    fn attributes(
        &self,
        start: &BytesStart<'a>,
    ) -> Result<Vec<(String, String)>, DeserializeError> {
        start
            .attributes()
            .map(|attr| {
                let attr =
                    attr.map_err(|err| DeserializeError::xml(self.reader.buffer_position(), err))?;
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map_err(|err| DeserializeError::xml(self.reader.buffer_position(), err))?;
                Ok((key, value.into_owned()))
            })
            .collect()
    }

    fn skip(&mut self, start: &BytesStart<'a>) -> Result<(), DeserializeError> {
        self.reader
            .read_to_end(start.name())
            .map_err(|err| DeserializeError::xml(self.reader.buffer_position(), err))?;
        Ok(())
    }

    fn next_event(&mut self) -> Result<Event<'a>, DeserializeError> {
        self.reader
            .read_event()
            .map_err(|err| DeserializeError::xml(self.reader.buffer_position(), err))
    }
}

fn record_status(
    status: TestCaseStatus,
    skipped: &mut Option<TestCaseStatus>,
    non_success: &mut Option<TestCaseStatus>,
) {
    let slot = if status.is_skipped() {
        skipped
    } else {
        non_success
    };
    if slot.is_none() {
        *slot = Some(status);
    }
}

/// Stores a `tests`, `failures`, `errors` or `skipped` attribute. Returns false for any other
/// attribute.
fn read_count(
    counts: &mut DeclaredCounts,
    element: &'static str,
    key: &str,
    value: &str,
) -> Result<bool, DeserializeError> {
    let (slot, attribute) = match key {
        "tests" => (&mut counts.tests, "tests"),
        "failures" => (&mut counts.failures, "failures"),
        "errors" => (&mut counts.errors, "errors"),
        "skipped" => (&mut counts.skipped, "skipped"),
        _ => return Ok(false),
    };
    *slot = Some(parse_attr(element, attribute, value)?);
    Ok(true)
}

fn is_tag(start: &BytesStart<'_>, tag: &str) -> bool {
    start.name().as_ref() == tag.as_bytes()
}

fn parse_attr<T: FromStr>(
    element: &'static str,
    attribute: &'static str,
    value: &str,
) -> Result<T, DeserializeError> {
    value
        .trim()
        .parse()
        .map_err(|_| DeserializeError::InvalidAttribute {
            element,
            attribute,
            value: value.to_owned(),
        })
}

// Time is written as a (possibly fractional) number of seconds. Anything else, including
// negative or non-finite values, isn't a time.
fn parse_time(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusDetail;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_statuses() {
        let input = indoc! {r#"
            <?xml version="1.0" encoding="utf-8"?>
            <testsuites>
              <testsuite name="pytest" errors="0" failures="1" skipped="1" tests="4" time="1.5">
                <testcase classname="tests.a" name="t_pass" file="tests/a.py" line="10" time="0.1"/>
                <testcase classname="tests.a" name="t_fail" file="tests/a.py" line="20" time="0.2">
                  <failure message="assert 1 == 2">AssertionError &amp; more</failure>
                </testcase>
                <testcase classname="tests.a" name="t_error" file="tests/a.py" line="30">
                  <error message="boom" type="RuntimeError"/>
                </testcase>
                <testcase classname="tests.a" name="t_skip" file="tests/a.py" line="40">
                  <skipped type="pytest.skip" message="not today">skip reason</skipped>
                </testcase>
              </testsuite>
            </testsuites>
        "#};

        let report = deserialize_report(input).expect("report is valid");
        assert_eq!(report.testsuites.len(), 1);
        let testsuite = &report.testsuites[0];
        assert_eq!(testsuite.name, "pytest");
        assert_eq!(
            testsuite.counts,
            DeclaredCounts {
                tests: Some(4),
                failures: Some(1),
                errors: Some(0),
                skipped: Some(1),
            }
        );
        assert_eq!(testsuite.time, Some(Duration::from_millis(1500)));

        let statuses: Vec<_> = testsuite
            .testcases
            .iter()
            .map(|testcase| (testcase.name.as_str(), &testcase.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("t_pass", &TestCaseStatus::Passed),
                (
                    "t_fail",
                    &TestCaseStatus::Failed {
                        kind: FailureKind::Failure,
                        detail: StatusDetail {
                            message: Some("assert 1 == 2".to_owned()),
                            ty: None,
                            description: Some("AssertionError & more".to_owned()),
                        },
                    }
                ),
                (
                    "t_error",
                    &TestCaseStatus::Failed {
                        kind: FailureKind::Error,
                        detail: StatusDetail {
                            message: Some("boom".to_owned()),
                            ty: Some("RuntimeError".to_owned()),
                            description: None,
                        },
                    }
                ),
                (
                    "t_skip",
                    &TestCaseStatus::Skipped(StatusDetail {
                        message: Some("not today".to_owned()),
                        ty: Some("pytest.skip".to_owned()),
                        description: Some("skip reason".to_owned()),
                    })
                ),
            ]
        );

        let first = &testsuite.testcases[0];
        assert_eq!(first.classname.as_deref(), Some("tests.a"));
        assert_eq!(first.file.as_deref(), Some("tests/a.py"));
        assert_eq!(first.line, Some(10));
    }

    #[test]
    fn skipped_wins_over_failure() {
        let input = indoc! {r#"
            <testsuites>
              <testsuite name="s">
                <testcase classname="c" name="n">
                  <failure message="first"/>
                  <skipped/>
                </testcase>
              </testsuite>
            </testsuites>
        "#};

        let report = deserialize_report(input).expect("report is valid");
        assert!(report.testsuites[0].testcases[0].status.is_skipped());
    }

    #[test]
    fn output_and_unknown_elements() {
        let input = indoc! {r#"
            <root>
              <testsuites name="run">
                <testsuite name="s" hostname="ci-1">
                  <properties>
                    <property name="python" value="3.12"/>
                  </properties>
                  <testcase classname="c" name="n" custom="x">
                    <system-out><![CDATA[hello <world>]]></system-out>
                    <unknown><nested>ignored</nested></unknown>
                  </testcase>
                </testsuite>
              </testsuites>
            </root>
        "#};

        let report = deserialize_report(input).expect("report is valid");
        assert_eq!(report.name.as_deref(), Some("run"));
        let testsuite = &report.testsuites[0];
        assert_eq!(testsuite.extra.get("hostname").map(String::as_str), Some("ci-1"));
        assert_eq!(testsuite.properties, vec![Property::new("python", "3.12")]);

        let testcase = &testsuite.testcases[0];
        assert!(testcase.status.is_passed());
        assert_eq!(
            testcase.system_out.as_ref().map(CapturedOutput::as_str),
            Some("hello <world>")
        );
        assert_eq!(testcase.extra.get("custom").map(String::as_str), Some("x"));
    }

    #[test]
    fn malformed_time_and_line_are_kept_as_extra() {
        let input = indoc! {r#"
            <testsuites time="soon">
              <testsuite name="s" time="-1" hostname="ci-1">
                <testcase classname="c" name="n" line="ten" time="1.5s"/>
                <testcase classname="c" name="m" line=" 42 " time="0.25"/>
              </testsuite>
            </testsuites>
        "#};

        let report = deserialize_report(input).expect("report is valid");
        assert_eq!(report.time, None);

        let testsuite = &report.testsuites[0];
        assert_eq!(testsuite.time, None);
        let extra: Vec<_> = testsuite
            .extra
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        assert_eq!(extra, vec![("time", "-1"), ("hostname", "ci-1")]);

        let malformed = &testsuite.testcases[0];
        assert_eq!(malformed.line, None);
        assert_eq!(malformed.time, None);
        assert_eq!(malformed.extra.get("line").map(String::as_str), Some("ten"));
        assert_eq!(malformed.extra.get("time").map(String::as_str), Some("1.5s"));

        let valid = &testsuite.testcases[1];
        assert_eq!(valid.line, Some(42));
        assert_eq!(valid.time, Some(Duration::from_millis(250)));
        assert!(valid.extra.is_empty());
    }

    #[test]
    fn missing_container() {
        let input = r#"<testsuite name="s"><testcase classname="c" name="n"/></testsuite>"#;
        let err = deserialize_report(input).expect_err("no container");
        assert!(
            matches!(err, DeserializeError::MissingTestsuites),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn empty_container() {
        let report = deserialize_report("<testsuites/>").expect("report is valid");
        assert!(report.testsuites.is_empty());
    }

    #[test]
    fn invalid_documents() {
        let err = deserialize_report(r#"<testsuites><testsuite name="s">"#)
            .expect_err("unterminated document");
        assert!(
            matches!(
                err,
                DeserializeError::UnexpectedEof {
                    element: "testsuite"
                }
            ),
            "unexpected error: {err:?}"
        );

        let err = deserialize_report(
            r#"<testsuites><testsuite name="s"><testcase classname="c"/></testsuite></testsuites>"#,
        )
        .expect_err("testcase without a name");
        assert!(
            matches!(
                err,
                DeserializeError::MissingAttribute {
                    element: "testcase",
                    attribute: "name"
                }
            ),
            "unexpected error: {err:?}"
        );

        let err = deserialize_report(
            r#"<testsuites><testsuite name="s" tests="many"/></testsuites>"#,
        )
        .expect_err("non-numeric count");
        assert!(
            matches!(
                err,
                DeserializeError::InvalidAttribute {
                    attribute: "tests",
                    ..
                }
            ),
            "unexpected error: {err:?}"
        );

        let err = deserialize_report("<testsuites><testsuite></testcase></testsuites>")
            .expect_err("mismatched end tag");
        assert!(
            matches!(err, DeserializeError::Xml { .. }),
            "unexpected error: {err:?}"
        );
    }
}
