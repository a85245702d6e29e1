//! JUnit-compatible test report
//!
//! CI pipelines pick the file up from the results directory; its name is
//! `<prefix>add-device-to-adu-group-test.xml`.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::scenario::ScenarioError;

pub const REPORT_FILE_NAME: &str = "add-device-to-adu-group-test.xml";
pub const DEFAULT_RESULTS_DIR: &str = "./testresults";
pub const TEST_CLASS_NAME: &str = "AddDeviceToGroupTest";
pub const TEST_CASE_NAME: &str = "test_AddDeviceToGroup";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to render report XML: {0}")]
    Xml(String),

    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pass/fail result of one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    /// An assertion did not hold
    Failed(String),
    /// A remote call failed and aborted the case
    Errored(String),
}

impl TestOutcome {
    pub fn from_result<T>(result: &Result<T, ScenarioError>) -> Self {
        match result {
            Ok(_) => TestOutcome::Passed,
            Err(ScenarioError::Assertion(failure)) => TestOutcome::Failed(failure.to_string()),
            Err(e @ (ScenarioError::Service(_) | ScenarioError::Config(_))) => {
                TestOutcome::Errored(e.to_string())
            }
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

#[derive(Debug, Clone)]
pub struct TestCaseReport {
    pub class_name: String,
    pub name: String,
    pub outcome: TestOutcome,
    pub elapsed: Duration,
}

impl TestCaseReport {
    pub fn new(class_name: &str, name: &str, outcome: TestOutcome, elapsed: Duration) -> Self {
        Self {
            class_name: class_name.to_string(),
            name: name.to_string(),
            outcome,
            elapsed,
        }
    }
}

/// One test suite's worth of results
#[derive(Debug, Clone)]
pub struct TestReport {
    pub suite_name: String,
    pub timestamp: DateTime<Utc>,
    pub cases: Vec<TestCaseReport>,
}

impl TestReport {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            timestamp: Utc::now(),
            cases: Vec::new(),
        }
    }

    pub fn push(&mut self, case: TestCaseReport) {
        self.cases.push(case);
    }

    pub fn failures(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Failed(_)))
    }

    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Errored(_)))
    }

    pub fn is_passed(&self) -> bool {
        self.cases.iter().all(|c| c.outcome.is_passed())
    }

    fn count(&self, pred: impl Fn(&TestOutcome) -> bool) -> usize {
        self.cases.iter().filter(|c| pred(&c.outcome)).count()
    }

    fn total_seconds(&self) -> f64 {
        self.cases.iter().map(|c| c.elapsed.as_secs_f64()).sum()
    }

    /// Render as a JUnit `<testsuite>` document
    pub fn to_junit_xml(&self) -> Result<String, ReportError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        let tests = self.cases.len().to_string();
        let failures = self.failures().to_string();
        let errors = self.errors().to_string();
        let time = format!("{:.3}", self.total_seconds());
        let timestamp = self.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string();

        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write(
            &mut writer,
            Event::Start(BytesStart::new("testsuite").with_attributes([
                ("name", self.suite_name.as_str()),
                ("tests", tests.as_str()),
                ("failures", failures.as_str()),
                ("errors", errors.as_str()),
                ("skipped", "0"),
                ("time", time.as_str()),
                ("timestamp", timestamp.as_str()),
            ])),
        )?;

        for case in &self.cases {
            let case_time = format!("{:.3}", case.elapsed.as_secs_f64());
            let start = BytesStart::new("testcase").with_attributes([
                ("classname", case.class_name.as_str()),
                ("name", case.name.as_str()),
                ("time", case_time.as_str()),
            ]);

            let (tag, kind, message) = match &case.outcome {
                TestOutcome::Passed => {
                    write(&mut writer, Event::Empty(start))?;
                    continue;
                }
                TestOutcome::Failed(message) => ("failure", "AssertionError", message),
                TestOutcome::Errored(message) => ("error", "ServiceError", message),
            };

            write(&mut writer, Event::Start(start))?;
            write(
                &mut writer,
                Event::Start(BytesStart::new(tag).with_attributes([
                    ("type", kind),
                    ("message", message.as_str()),
                ])),
            )?;
            write(&mut writer, Event::Text(BytesText::new(message)))?;
            write(&mut writer, Event::End(BytesEnd::new(tag)))?;
            write(&mut writer, Event::End(BytesEnd::new("testcase")))?;
        }

        write(&mut writer, Event::End(BytesEnd::new("testsuite")))?;

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| ReportError::Xml(e.to_string()))
    }
}

fn write(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), ReportError> {
    writer
        .write_event(event)
        .map_err(|e| ReportError::Xml(e.to_string()))
}

/// Where the report ends up; the prefix is carried here rather than in global state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSink {
    results_dir: PathBuf,
    prefix: String,
}

impl ReportSink {
    pub fn new(results_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            results_dir: results_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Sink from `DU_TEST_RESULTS_DIR` and `DU_TEST_RESULT_FILE_PREFIX` alone
    ///
    /// Used when the full configuration cannot be parsed, so a report can
    /// still be written where CI expects it.
    pub fn from_env() -> Self {
        let results_dir = std::env::var_os("DU_TEST_RESULTS_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR));
        let prefix = std::env::var("DU_TEST_RESULT_FILE_PREFIX").unwrap_or_default();
        Self::new(results_dir, prefix)
    }

    pub fn file_path(&self) -> PathBuf {
        self.results_dir
            .join(format!("{}{}", self.prefix, REPORT_FILE_NAME))
    }

    /// Render and write the report, creating the results directory if needed
    pub fn write(&self, report: &TestReport) -> Result<PathBuf, ReportError> {
        let xml = report.to_junit_xml()?;
        let path = self.file_path();

        std::fs::create_dir_all(&self.results_dir).map_err(|source| ReportError::Io {
            path: self.results_dir.clone(),
            source,
        })?;
        std::fs::write(&path, xml).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::AssertionFailure;
    use du_client::ClientError;

    fn single(outcome: TestOutcome) -> TestReport {
        let mut report = TestReport::new(TEST_CLASS_NAME);
        report.push(TestCaseReport::new(
            TEST_CLASS_NAME,
            TEST_CASE_NAME,
            outcome,
            Duration::from_millis(1500),
        ));
        report
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Result<(), ScenarioError> = Ok(());
        assert_eq!(TestOutcome::from_result(&ok), TestOutcome::Passed);

        let failed: Result<(), ScenarioError> = Err(AssertionFailure::new("count mismatch").into());
        assert_eq!(
            TestOutcome::from_result(&failed),
            TestOutcome::Failed("count mismatch".to_string())
        );

        let errored: Result<(), ScenarioError> =
            Err(ClientError::Network("connection refused".to_string()).into());
        assert!(matches!(
            TestOutcome::from_result(&errored),
            TestOutcome::Errored(m) if m.contains("connection refused")
        ));

        let misconfigured: Result<(), ScenarioError> =
            Err(ScenarioError::Config("max_attempts must be at least 1".to_string()));
        assert_eq!(
            TestOutcome::from_result(&misconfigured),
            TestOutcome::Errored(
                "Invalid scenario configuration: max_attempts must be at least 1".to_string()
            )
        );
    }

    #[test]
    fn test_passing_report_xml() {
        let xml = single(TestOutcome::Passed).to_junit_xml().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("tests=\"1\""));
        assert!(xml.contains("failures=\"0\""));
        assert!(xml.contains("errors=\"0\""));
        assert!(xml.contains(concat!(
            "<testcase classname=\"AddDeviceToGroupTest\" ",
            "name=\"test_AddDeviceToGroup\" time=\"1.500\"/>"
        )));
    }

    #[test]
    fn test_failure_report_xml_escapes_message() {
        let message = "group id: expected \"g1\", got \"<g2>\"";
        let report = single(TestOutcome::Failed(message.to_string()));
        let xml = report.to_junit_xml().unwrap();

        assert_eq!(report.failures(), 1);
        assert!(!report.is_passed());
        assert!(xml.contains("failures=\"1\""));
        assert!(xml.contains("<failure type=\"AssertionError\""));
        assert!(xml.contains("&lt;g2&gt;"));
        assert!(!xml.contains("<g2>"));
    }

    #[test]
    fn test_error_report_xml() {
        let message = "Service call failed: HTTP 503: busy";
        let report = single(TestOutcome::Errored(message.to_string()));
        let xml = report.to_junit_xml().unwrap();

        assert_eq!(report.errors(), 1);
        assert!(xml.contains("errors=\"1\""));
        assert!(xml.contains("<error type=\"ServiceError\""));
        assert!(xml.contains("</testcase>"));
    }

    #[test]
    fn test_sink_file_name_uses_prefix() {
        let sink = ReportSink::new("out", "arm64-");
        assert_eq!(
            sink.file_path(),
            PathBuf::from("out/arm64-add-device-to-adu-group-test.xml")
        );
    }

    #[test]
    fn test_sink_writes_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ReportSink::new(dir.path().join("testresults"), "x86-");

        let path = sink.write(&single(TestOutcome::Passed)).unwrap();

        assert_eq!(path, dir.path().join("testresults/x86-add-device-to-adu-group-test.xml"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("<testsuite"));
    }
}
