use std::io::{self, Write};

use crate::report::util::pluralize;
use crate::report::{Reporter, ReporterConfig};
use crate::runner::result::{GroupInfo, GroupStats, RunStats, TestCaseStats, TestStatus, Totals};
use crate::testcase::TestCaseInfo;

/// Human-readable streaming reporter.
///
/// Failing and skipped tests are always printed; passing tests only with
/// `show_successful`.
pub struct ConsoleReporter {
    config: ReporterConfig,
    out: Box<dyn Write>,
}

impl ConsoleReporter {
    pub fn new(config: ReporterConfig, out: Box<dyn Write>) -> Self {
        Self { config, out }
    }

    fn wants(&self, status: TestStatus) -> bool {
        status != TestStatus::Passed || self.config.show_successful
    }
}

/// Label a group is shown under; the anonymous group has no name of its own.
fn group_label(name: &str) -> &str {
    if name.is_empty() { "all tests" } else { name }
}

fn shows_groups(group: &GroupInfo) -> bool {
    group.count > 1 || !group.name.is_empty()
}

fn status_label(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "PASSED",
        TestStatus::Failed => "FAILED",
        TestStatus::Skipped => "SKIPPED",
    }
}

/// Format the run header line.
pub fn format_run_header(run_name: &str) -> String {
    format!("Running {run_name}...\n")
}

/// Format the line opening a filter group.
pub fn format_group_start(group: &GroupInfo) -> String {
    format!(
        "\nGroup {}/{}: {}",
        group.index + 1,
        group.count,
        group_label(&group.name)
    )
}

/// Format a finished test.
pub fn format_test_result(stats: &TestCaseStats, show_durations: bool) -> String {
    let status = stats.status();
    let mut line = format!("  [{}] {}", status_label(status), stats.info.name());
    if show_durations {
        line.push_str(&format!(" ({:.3}s)", stats.duration.as_secs_f64()));
    }

    for failure in stats.failures.iter().filter(|f| !f.is_fault) {
        line.push_str(&format!(
            "\n         → {}: {}",
            failure.location, failure.expression
        ));
        if let Some(message) = &failure.message {
            line.push_str(&format!(" ({message})"));
        }
    }

    if let Some(fault) = &stats.fault {
        line.push_str(&format!("\n         → fatal error: {fault}"));
    }

    if status == TestStatus::Skipped
        && let Some(reason) = &stats.skip_reason
    {
        line.push_str(&format!("\n         → {reason}"));
    }

    line
}

/// Format a fatal error as it happens.
pub fn format_fatal_error(info: &TestCaseInfo, message: &str) -> String {
    format!("  [FATAL] {} at {}: {message}", info.name(), info.location())
}

/// Format the counters of a totals value.
pub fn format_totals(totals: &Totals) -> String {
    let tests = &totals.test_cases;
    let mut parts = Vec::new();

    if tests.passed > 0 {
        parts.push(format!("{} passed", tests.passed));
    }
    if tests.failed > 0 {
        parts.push(format!("{} failed", tests.failed));
    }
    if tests.skipped > 0 {
        parts.push(format!("{} skipped", tests.skipped));
    }
    if parts.is_empty() {
        parts.push("0 tests".into());
    }

    let assertions = &totals.assertions;
    let mut line = format!(
        "{} ({}",
        parts.join(", "),
        pluralize(assertions.total(), "assertion")
    );
    if assertions.failed > 0 {
        line.push_str(&format!(", {} failed", assertions.failed));
    }
    line.push(')');
    line
}

/// Format the end of a filter group. Totals are cumulative for the session.
pub fn format_group_end(stats: &GroupStats) -> String {
    format!(
        "Group {}/{} done, running total: {}",
        stats.group.index + 1,
        stats.group.count,
        format_totals(&stats.totals)
    )
}

/// Format the final summary after all groups complete.
pub fn format_summary(stats: &RunStats) -> String {
    let mut line = format!(
        "\nResults: {} ({:.1}s)",
        format_totals(&stats.totals),
        stats.duration.as_secs_f64()
    );
    if stats.aborting {
        line.push_str("\nRun aborted after reaching the failure threshold");
    }
    line
}

impl Reporter for ConsoleReporter {
    fn test_run_starting(&mut self, run_name: &str) -> io::Result<()> {
        write!(self.out, "{}", format_run_header(run_name))
    }

    fn test_group_starting(&mut self, group: &GroupInfo) -> io::Result<()> {
        if shows_groups(group) {
            writeln!(self.out, "{}", format_group_start(group))?;
        }
        Ok(())
    }

    fn fatal_error(&mut self, info: &TestCaseInfo, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", format_fatal_error(info, message))
    }

    fn test_case_ended(&mut self, stats: &TestCaseStats) -> io::Result<()> {
        if self.wants(stats.status()) {
            writeln!(
                self.out,
                "{}",
                format_test_result(stats, self.config.show_durations)
            )?;
        }
        Ok(())
    }

    fn no_matching_test_cases(&mut self, group_name: &str) -> io::Result<()> {
        writeln!(self.out, "  No test cases matched '{group_name}'")
    }

    fn test_group_ended(&mut self, stats: &GroupStats) -> io::Result<()> {
        if shows_groups(&stats.group) {
            writeln!(self.out, "{}", format_group_end(stats))?;
        }
        Ok(())
    }

    fn test_run_ended(&mut self, stats: &RunStats) -> io::Result<()> {
        writeln!(self.out, "{}", format_summary(stats))?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::runner::capture::AssertionFailure;
    use crate::runner::result::Counts;
    use crate::util::buffer::SharedBuffer;
    use crate::util::location::SourceLocation;

    fn stats(name: &str, totals: Totals) -> TestCaseStats {
        TestCaseStats {
            info: TestCaseInfo::new(name, "", "", SourceLocation::new("t.rs", 3)),
            totals,
            duration: Duration::from_millis(1200),
            failures: vec![],
            skip_reason: None,
            fault: None,
        }
    }

    fn passed(name: &str) -> TestCaseStats {
        stats(
            name,
            Totals::for_test(
                Counts {
                    passed: 2,
                    ..Counts::default()
                },
                false,
            ),
        )
    }

    fn failed(name: &str) -> TestCaseStats {
        let mut s = stats(
            name,
            Totals::for_test(
                Counts {
                    passed: 1,
                    failed: 1,
                    skipped: 0,
                },
                false,
            ),
        );
        s.failures.push(AssertionFailure {
            expression: "x == 3".into(),
            message: Some("2 != 3".into()),
            location: SourceLocation::new("t.rs", 7),
            is_fault: false,
        });
        s
    }

    fn group(name: &str, index: usize, count: usize) -> GroupInfo {
        GroupInfo {
            name: name.into(),
            index,
            count,
        }
    }

    #[test]
    fn display_passed_format() {
        let output = format_test_result(&passed("adds"), true);
        assert_eq!(output, "  [PASSED] adds (1.200s)");
    }

    #[test]
    fn display_failed_format() {
        let output = format_test_result(&failed("adds"), false);
        assert!(output.starts_with("  [FAILED] adds\n"));
        assert!(output.contains("→ t.rs:7: x == 3 (2 != 3)"));
    }

    #[test]
    fn display_fault_format() {
        let mut s = failed("boom");
        s.failures[0].is_fault = true;
        s.fault = Some("index out of bounds".into());
        let output = format_test_result(&s, false);
        assert!(!output.contains("x == 3"));
        assert!(output.contains("→ fatal error: index out of bounds"));
    }

    #[test]
    fn display_skipped_format() {
        let mut s = stats("net", Totals::for_test(Counts::default(), true));
        s.skip_reason = Some("needs network".into());
        let output = format_test_result(&s, false);
        assert!(output.contains("[SKIPPED] net"));
        assert!(output.contains("→ needs network"));
    }

    #[test]
    fn display_totals_format() {
        let totals = passed("a").totals + failed("b").totals;
        assert_eq!(
            format_totals(&totals),
            "1 passed, 1 failed (4 assertions, 1 failed)"
        );
        assert_eq!(format_totals(&Totals::default()), "0 tests (0 assertions)");
    }

    #[test]
    fn display_summary_aborted() {
        let run = RunStats {
            name: "suite".into(),
            totals: failed("a").totals,
            duration: Duration::from_millis(3500),
            aborting: true,
        };
        let output = format_summary(&run);
        assert!(output.contains("3.5s"));
        assert!(output.contains("aborted"));
    }

    #[test]
    fn display_group_start_anonymous() {
        assert_eq!(format_group_start(&group("", 0, 1)), "\nGroup 1/1: all tests");
        assert_eq!(format_group_start(&group("[unit]", 1, 2)), "\nGroup 2/2: [unit]");
    }

    #[test]
    fn reporter_hides_passing_by_default() {
        let buf = SharedBuffer::new();
        let mut reporter = ConsoleReporter::new(ReporterConfig::default(), buf.boxed());
        reporter.test_case_ended(&passed("quiet")).unwrap();
        reporter.test_case_ended(&failed("loud")).unwrap();
        let out = buf.contents();
        assert!(!out.contains("quiet"));
        assert!(out.contains("[FAILED] loud"));
    }

    #[test]
    fn reporter_shows_passing_with_success_flag() {
        let buf = SharedBuffer::new();
        let config = ReporterConfig {
            show_successful: true,
            ..ReporterConfig::default()
        };
        let mut reporter = ConsoleReporter::new(config, buf.boxed());
        reporter.test_case_ended(&passed("quiet")).unwrap();
        assert!(buf.contents().contains("[PASSED] quiet"));
    }

    #[test]
    fn reporter_skips_anonymous_single_group_banner() {
        let buf = SharedBuffer::new();
        let mut reporter = ConsoleReporter::new(ReporterConfig::default(), buf.boxed());
        reporter.test_group_starting(&group("", 0, 1)).unwrap();
        assert!(buf.is_empty());
        reporter.test_group_starting(&group("unit", 0, 1)).unwrap();
        assert!(buf.contents().contains("Group 1/1: unit"));
    }

    #[test]
    fn reporter_no_matches_line() {
        let buf = SharedBuffer::new();
        let mut reporter = ConsoleReporter::new(ReporterConfig::default(), buf.boxed());
        reporter.no_matching_test_cases("[nothing]").unwrap();
        assert_eq!(buf.contents(), "  No test cases matched '[nothing]'\n");
    }
}
