use std::fmt::Debug;
use std::panic::Location;

use crate::util::location::SourceLocation;

/// A failed check inside a test body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    /// The checked expression, or the panic message for a fault.
    pub expression: String,
    pub message: Option<String>,
    pub location: SourceLocation,
    /// Set when the failure stands in for a panic that escaped the test body.
    pub is_fault: bool,
}

/// Collects the outcome of each check made by one test body.
///
/// A fresh recorder is handed to every invocation; its counts become the
/// assertion part of that test's totals.
#[derive(Debug, Default)]
pub struct AssertionRecorder {
    passed: usize,
    failures: Vec<AssertionFailure>,
    skip_reason: Option<String>,
}

impl AssertionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a boolean check. Returns the condition so callers can bail out early.
    #[track_caller]
    pub fn check(&mut self, condition: bool, expression: &str) -> bool {
        if condition {
            self.passed += 1;
        } else {
            self.push_failure(expression.to_owned(), None, Location::caller());
        }
        condition
    }

    /// Record an equality check, keeping both sides in the failure message.
    #[track_caller]
    pub fn check_eq<T: PartialEq + Debug>(&mut self, left: T, right: T, expression: &str) -> bool {
        let equal = left == right;
        if equal {
            self.passed += 1;
        } else {
            self.push_failure(
                expression.to_owned(),
                Some(format!("{left:?} != {right:?}")),
                Location::caller(),
            );
        }
        equal
    }

    /// Record an unconditional failure.
    #[track_caller]
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.push_failure(message, None, Location::caller());
    }

    /// Mark the test as skipped. Checks made so far still count.
    pub fn skip(&mut self, reason: impl Into<String>) {
        self.skip_reason = Some(reason.into());
    }

    pub(crate) fn record_fault(&mut self, message: String, location: SourceLocation) {
        self.failures.push(AssertionFailure {
            expression: message,
            message: None,
            location,
            is_fault: true,
        });
    }

    fn push_failure(&mut self, expression: String, message: Option<String>, at: &Location<'_>) {
        self.failures.push(AssertionFailure {
            expression,
            message,
            location: SourceLocation::new(at.file(), at.line()),
            is_fault: false,
        });
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }

    pub(crate) fn into_parts(self) -> (usize, Vec<AssertionFailure>, Option<String>) {
        (self.passed, self.failures, self.skip_reason)
    }
}
