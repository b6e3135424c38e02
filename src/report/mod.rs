pub mod console;
pub mod junit;
pub mod registry;
pub mod serialized;
pub(crate) mod util;

use std::io;

use crate::runner::result::{GroupInfo, GroupStats, RunStats, TestCaseStats};
use crate::testcase::TestCaseInfo;

/// Options every reporter is built with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReporterConfig {
    /// Name of the run, used as the top-level suite name.
    pub run_name: String,
    /// Report passing tests as well as failing ones.
    pub show_successful: bool,
    /// Print per-test durations.
    pub show_durations: bool,
}

/// Receives lifecycle events from a run.
///
/// Events arrive in a fixed shape:
///
/// ```text
/// test_run_starting
///   ( test_group_starting
///       ( test_case_starting [fatal_error] test_case_ended )*
///       [no_matching_test_cases]
///     test_group_ended )+
/// test_run_ended
/// ```
///
/// Reporters only receive data; nothing they return feeds back into the run
/// except I/O failures, which end it.
pub trait Reporter {
    fn test_run_starting(&mut self, _run_name: &str) -> io::Result<()> {
        Ok(())
    }

    fn test_group_starting(&mut self, _group: &GroupInfo) -> io::Result<()> {
        Ok(())
    }

    fn test_case_starting(&mut self, _info: &TestCaseInfo) -> io::Result<()> {
        Ok(())
    }

    /// A test body panicked. Followed by `test_case_ended` for the same test.
    fn fatal_error(&mut self, _info: &TestCaseInfo, _message: &str) -> io::Result<()> {
        Ok(())
    }

    fn test_case_ended(&mut self, stats: &TestCaseStats) -> io::Result<()>;

    /// A named filter group selected no tests.
    fn no_matching_test_cases(&mut self, _group_name: &str) -> io::Result<()> {
        Ok(())
    }

    fn test_group_ended(&mut self, _stats: &GroupStats) -> io::Result<()> {
        Ok(())
    }

    fn test_run_ended(&mut self, stats: &RunStats) -> io::Result<()>;
}
