use std::io::{self, Write};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::report::{Reporter, ReporterConfig};
use crate::runner::result::{Counts, GroupInfo, RunStats, TestCaseStats};

/// Output encoding of a [`SerializedReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

/// Serializable report of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run: RunMetadata,
    pub groups: Vec<GroupReport>,
    pub summary: SummaryReport,
}

/// Metadata about the run execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub name: String,
    pub duration_ms: u64,
    pub aborted: bool,
}

/// One filter group and the tests it ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub name: String,
    pub tests: Vec<TestReport>,
}

/// A single test's result in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub location: String,
    pub status: String,
    pub duration_ms: u64,
    pub assertions: Counts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// A failed assertion in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub expression: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Summary statistics in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub tests: Counts,
    pub assertions: Counts,
    pub success: bool,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn to_test_report(stats: &TestCaseStats) -> TestReport {
    let failures = stats
        .failures
        .iter()
        .filter(|f| !f.is_fault)
        .map(|f| FailureReport {
            expression: f.expression.clone(),
            location: f.location.to_string(),
            message: f.message.clone(),
        })
        .collect();

    TestReport {
        name: stats.info.name().to_owned(),
        class: stats.info.class_name().to_owned(),
        tags: stats.info.tags().iter().cloned().collect(),
        location: stats.info.location().to_string(),
        status: stats.status().to_string(),
        duration_ms: millis(stats.duration),
        assertions: stats.totals.assertions,
        failures,
        skip_reason: stats.skip_reason.clone(),
        fault: stats.fault.clone(),
    }
}

/// Reporter that collects the run and writes it as one JSON or YAML
/// document when the run ends.
pub struct SerializedReporter {
    format: Format,
    config: ReporterConfig,
    out: Box<dyn Write>,
    groups: Vec<GroupReport>,
}

impl SerializedReporter {
    pub fn new(format: Format, config: ReporterConfig, out: Box<dyn Write>) -> Self {
        Self {
            format,
            config,
            out,
            groups: Vec::new(),
        }
    }

    fn report(&mut self, stats: &RunStats) -> RunReport {
        RunReport {
            run: RunMetadata {
                name: self.config.run_name.clone(),
                duration_ms: millis(stats.duration),
                aborted: stats.aborting,
            },
            groups: std::mem::take(&mut self.groups),
            summary: SummaryReport {
                tests: stats.totals.test_cases,
                assertions: stats.totals.assertions,
                success: stats.totals.assertions.all_passed(),
            },
        }
    }

    fn encode(&self, report: &RunReport) -> io::Result<String> {
        match self.format {
            Format::Json => serde_json::to_string_pretty(report)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(io::Error::other),
            Format::Yaml => serde_yaml::to_string(report).map_err(io::Error::other),
        }
    }
}

impl Reporter for SerializedReporter {
    fn test_group_starting(&mut self, group: &GroupInfo) -> io::Result<()> {
        self.groups.push(GroupReport {
            name: group.name.clone(),
            tests: Vec::new(),
        });
        Ok(())
    }

    fn test_case_ended(&mut self, stats: &TestCaseStats) -> io::Result<()> {
        if self.groups.is_empty() {
            self.groups.push(GroupReport {
                name: String::new(),
                tests: Vec::new(),
            });
        }
        if let Some(group) = self.groups.last_mut() {
            group.tests.push(to_test_report(stats));
        }
        Ok(())
    }

    fn test_run_ended(&mut self, stats: &RunStats) -> io::Result<()> {
        let report = self.report(stats);
        let text = self.encode(&report)?;
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}
