use std::io;
use std::time::{Duration, Instant};

use crate::report::Reporter;
use crate::runner::capture::AssertionRecorder;
use crate::runner::fault;
use crate::runner::result::{Counts, GroupInfo, GroupStats, RunStats, TestCaseStats, Totals};
use crate::testcase::TestCase;

/// Mutable run-scoped state threaded through test execution.
///
/// Owns the running session total and the abort threshold, and is the only
/// thing that talks to the reporter while a run is in progress.
pub struct RunContext<'r> {
    reporter: &'r mut dyn Reporter,
    /// Stop after this many failed assertions. `None` never aborts.
    abort_after: Option<usize>,
    totals: Totals,
}

impl<'r> RunContext<'r> {
    pub fn new(reporter: &'r mut dyn Reporter, abort_after: Option<usize>) -> Self {
        Self {
            reporter,
            abort_after,
            totals: Totals::default(),
        }
    }

    /// Running total of everything executed so far.
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Whether the failure threshold has been reached. Once true, stays true.
    pub fn aborting(&self) -> bool {
        self.abort_after
            .is_some_and(|limit| self.totals.assertions.failed >= limit)
    }

    pub fn test_run_starting(&mut self, run_name: &str) -> io::Result<()> {
        log::info!("starting run '{run_name}'");
        self.reporter.test_run_starting(run_name)
    }

    pub fn test_group_starting(&mut self, group: &GroupInfo) -> io::Result<()> {
        log::debug!(
            "group {}/{} '{}' starting",
            group.index + 1,
            group.count,
            group.name
        );
        self.reporter.test_group_starting(group)
    }

    pub fn no_matching_test_cases(&mut self, group_name: &str) -> io::Result<()> {
        log::warn!("no test cases matched '{group_name}'");
        self.reporter.no_matching_test_cases(group_name)
    }

    /// Close a group. The reporter receives the session total, not the group's own.
    pub fn test_group_ended(&mut self, group: GroupInfo) -> io::Result<()> {
        let stats = GroupStats {
            group,
            totals: self.totals,
            aborting: self.aborting(),
        };
        self.reporter.test_group_ended(&stats)
    }

    pub fn test_run_ended(&mut self, run_name: &str, duration: Duration) -> io::Result<()> {
        let stats = RunStats {
            name: run_name.to_owned(),
            totals: self.totals,
            duration,
            aborting: self.aborting(),
        };
        log::info!(
            "run '{run_name}' finished: {} test(s) failed, {} assertion(s) failed",
            self.totals.test_cases.failed,
            self.totals.assertions.failed
        );
        self.reporter.test_run_ended(&stats)
    }

    /// Execute one test and return what it added to the session total.
    ///
    /// A panic in the body is recorded as a failed assertion and reported
    /// through `fatal_error`; it never propagates out of this call. Only
    /// reporter I/O errors do.
    pub fn run_test(&mut self, test: &TestCase) -> io::Result<Totals> {
        let info = test.info();
        log::debug!("running '{}'", info.name());
        self.reporter.test_case_starting(info)?;

        let mut recorder = AssertionRecorder::new();
        let started = Instant::now();
        let outcome = fault::catch(|| test.invoke(&mut recorder));
        let duration = started.elapsed();

        let fault_message = match outcome {
            Ok(()) => None,
            Err(fault) => {
                log::debug!("'{}' panicked: {}", info.name(), fault.message);
                let location = fault.location.unwrap_or_else(|| info.location().clone());
                recorder.record_fault(fault.message.clone(), location);
                self.reporter.fatal_error(info, &fault.message)?;
                Some(fault.message)
            }
        };

        let (passed, failures, skip_reason) = recorder.into_parts();
        let assertions = Counts {
            passed,
            failed: failures.len(),
            skipped: 0,
        };
        let delta = Totals::for_test(assertions, skip_reason.is_some());

        let was_aborting = self.aborting();
        self.totals += delta;
        if !was_aborting && self.aborting() {
            log::warn!(
                "abort threshold reached after '{}' ({} failed assertion(s))",
                info.name(),
                self.totals.assertions.failed
            );
        }

        let stats = TestCaseStats {
            info: info.clone(),
            totals: delta,
            duration,
            failures,
            skip_reason,
            fault: fault_message,
        };
        self.reporter.test_case_ended(&stats)?;
        Ok(delta)
    }
}
