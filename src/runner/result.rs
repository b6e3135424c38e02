use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runner::capture::AssertionFailure;
use crate::testcase::TestCaseInfo;

/// Pass/fail/skip counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub passed: usize,
    pub failed: usize,
    #[serde(default)]
    pub skipped: usize,
}

impl Counts {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl Add for Counts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            passed: self.passed + rhs.passed,
            failed: self.failed + rhs.failed,
            skipped: self.skipped + rhs.skipped,
        }
    }
}

impl Sub for Counts {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            passed: self.passed.saturating_sub(rhs.passed),
            failed: self.failed.saturating_sub(rhs.failed),
            skipped: self.skipped.saturating_sub(rhs.skipped),
        }
    }
}

/// Assertion and test-case counts for a test, a group or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub assertions: Counts,
    pub test_cases: Counts,
}

impl Totals {
    /// Totals for a single finished test, classified from its assertion counts.
    pub fn for_test(assertions: Counts, skipped: bool) -> Self {
        let mut test_cases = Counts::default();
        if assertions.failed > 0 {
            test_cases.failed = 1;
        } else if skipped {
            test_cases.skipped = 1;
        } else {
            test_cases.passed = 1;
        }
        Self {
            assertions,
            test_cases,
        }
    }

    pub fn status(&self) -> TestStatus {
        if self.test_cases.failed > 0 {
            TestStatus::Failed
        } else if self.test_cases.skipped > 0 && self.test_cases.passed == 0 {
            TestStatus::Skipped
        } else {
            TestStatus::Passed
        }
    }
}

impl Add for Totals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            assertions: self.assertions + rhs.assertions,
            test_cases: self.test_cases + rhs.test_cases,
        }
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Totals {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            assertions: self.assertions - rhs.assertions,
            test_cases: self.test_cases - rhs.test_cases,
        }
    }
}

impl std::iter::Sum for Totals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// The outcome of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Everything a reporter learns about a finished test.
#[derive(Debug, Clone)]
pub struct TestCaseStats {
    pub info: TestCaseInfo,
    pub totals: Totals,
    pub duration: Duration,
    pub failures: Vec<AssertionFailure>,
    pub skip_reason: Option<String>,
    /// Panic message if the body did not return normally.
    pub fault: Option<String>,
}

impl TestCaseStats {
    pub fn status(&self) -> TestStatus {
        self.totals.status()
    }
}

/// Position of a filter group in the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub name: String,
    pub index: usize,
    pub count: usize,
}

/// Sent when a filter group finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStats {
    pub group: GroupInfo,
    /// Running session total including this group, not this group alone.
    pub totals: Totals,
    pub aborting: bool,
}

/// Sent once when the run finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub name: String,
    pub totals: Totals,
    pub duration: Duration,
    pub aborting: bool,
}
