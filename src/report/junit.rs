use std::fmt::Write as _;
use std::io::{self, Write};

use crate::report::util::xml_escape;
use crate::report::{Reporter, ReporterConfig};
use crate::runner::result::{GroupInfo, RunStats, TestCaseStats, TestStatus};

struct CaseRecord {
    name: String,
    class_name: String,
    seconds: f64,
    status: TestStatus,
    failure: Option<String>,
    fault: Option<String>,
    skip_reason: Option<String>,
}

struct SuiteRecord {
    name: String,
    cases: Vec<CaseRecord>,
}

impl SuiteRecord {
    fn count(&self, status: TestStatus) -> usize {
        self.cases.iter().filter(|c| c.status == status).count()
    }

    /// Failed cases that did not fault; faults are counted as errors.
    fn failures(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.status == TestStatus::Failed && c.fault.is_none())
            .count()
    }

    fn errors(&self) -> usize {
        self.cases.iter().filter(|c| c.fault.is_some()).count()
    }

    fn seconds(&self) -> f64 {
        self.cases.iter().map(|c| c.seconds).sum()
    }
}

/// JUnit XML reporter.
///
/// Buffers every result and writes the document when the run ends, one
/// `<testsuite>` per filter group.
pub struct JunitReporter {
    config: ReporterConfig,
    out: Box<dyn Write>,
    suites: Vec<SuiteRecord>,
}

impl JunitReporter {
    pub fn new(config: ReporterConfig, out: Box<dyn Write>) -> Self {
        Self {
            config,
            out,
            suites: Vec::new(),
        }
    }

    fn suite_name(&self, group: &str) -> String {
        if group.is_empty() {
            self.config.run_name.clone()
        } else {
            group.to_owned()
        }
    }

    fn render(&self, stats: &RunStats) -> String {
        let mut out = String::new();
        let name = xml_escape(&self.config.run_name);
        let tests: usize = self.suites.iter().map(|s| s.cases.len()).sum();
        let failures: usize = self.suites.iter().map(SuiteRecord::failures).sum();
        let errors: usize = self.suites.iter().map(SuiteRecord::errors).sum();
        let skipped: usize = self.suites.iter().map(|s| s.count(TestStatus::Skipped)).sum();
        let time_secs = stats.duration.as_secs_f64();

        // Writing to a String cannot fail.
        let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            out,
            r#"<testsuites name="{name}" tests="{tests}" failures="{failures}" errors="{errors}" skipped="{skipped}" time="{time_secs:.3}">"#
        );

        for suite in &self.suites {
            let suite_name = xml_escape(&suite.name);
            let _ = writeln!(
                out,
                r#"  <testsuite name="{suite_name}" tests="{}" failures="{}" errors="{}" skipped="{}" time="{:.3}">"#,
                suite.cases.len(),
                suite.failures(),
                suite.errors(),
                suite.count(TestStatus::Skipped),
                suite.seconds()
            );

            for case in &suite.cases {
                let class_name = if case.class_name.is_empty() {
                    suite_name.clone()
                } else {
                    xml_escape(&case.class_name)
                };
                let _ = writeln!(
                    out,
                    r#"    <testcase name="{}" classname="{class_name}" time="{:.3}">"#,
                    xml_escape(&case.name),
                    case.seconds
                );

                if let Some(fault) = &case.fault {
                    let _ = writeln!(
                        out,
                        r#"      <error message="{}" type="fatal error"/>"#,
                        xml_escape(fault)
                    );
                } else if let Some(failure) = &case.failure {
                    let _ = writeln!(
                        out,
                        r#"      <failure message="{}" type="assertion failed"/>"#,
                        xml_escape(failure)
                    );
                }

                if case.status == TestStatus::Skipped {
                    match &case.skip_reason {
                        Some(reason) => {
                            let _ = writeln!(out, r#"      <skipped message="{}"/>"#, xml_escape(reason));
                        }
                        None => {
                            let _ = writeln!(out, "      <skipped/>");
                        }
                    }
                }

                let _ = writeln!(out, "    </testcase>");
            }

            let _ = writeln!(out, "  </testsuite>");
        }

        let _ = writeln!(out, "</testsuites>");
        out
    }
}

impl Reporter for JunitReporter {
    fn test_group_starting(&mut self, group: &GroupInfo) -> io::Result<()> {
        let name = self.suite_name(&group.name);
        self.suites.push(SuiteRecord {
            name,
            cases: Vec::new(),
        });
        Ok(())
    }

    fn test_case_ended(&mut self, stats: &TestCaseStats) -> io::Result<()> {
        let failure = stats
            .failures
            .iter()
            .find(|f| !f.is_fault)
            .map(|f| match &f.message {
                Some(message) => format!("{}: {} ({message})", f.location, f.expression),
                None => format!("{}: {}", f.location, f.expression),
            });
        let record = CaseRecord {
            name: stats.info.name().to_owned(),
            class_name: stats.info.class_name().to_owned(),
            seconds: stats.duration.as_secs_f64(),
            status: stats.status(),
            failure,
            fault: stats.fault.clone(),
            skip_reason: stats.skip_reason.clone(),
        };
        match self.suites.last_mut() {
            Some(suite) => suite.cases.push(record),
            None => self.suites.push(SuiteRecord {
                name: self.config.run_name.clone(),
                cases: vec![record],
            }),
        }
        Ok(())
    }

    fn test_run_ended(&mut self, stats: &RunStats) -> io::Result<()> {
        let document = self.render(stats);
        self.out.write_all(document.as_bytes())?;
        self.out.flush()
    }
}
