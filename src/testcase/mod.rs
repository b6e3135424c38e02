pub mod expr;
pub mod info;
pub mod registry;
pub mod tags;

use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::runner::capture::AssertionRecorder;

pub use info::TestCaseInfo;

/// A test body.
///
/// Anything callable with an [`AssertionRecorder`] is a test body.
pub trait TestFn: Send + Sync {
    fn invoke(&self, recorder: &mut AssertionRecorder);
}

impl<F> TestFn for F
where
    F: Fn(&mut AssertionRecorder) + Send + Sync,
{
    fn invoke(&self, recorder: &mut AssertionRecorder) {
        (self)(recorder)
    }
}

/// A registered test: its description plus the body to invoke.
///
/// Two test cases are equal when they share the same body allocation, name and
/// class name. Renamed copies made with [`TestCase::with_name`] keep the body,
/// so they stay distinguishable only by name.
#[derive(Clone)]
pub struct TestCase {
    info: TestCaseInfo,
    test: Arc<dyn TestFn>,
}

/// Identity of a test case, used to deduplicate execution across filter groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestKey {
    invocable: usize,
    name: String,
    class_name: String,
}

impl TestCase {
    pub fn new(info: TestCaseInfo, test: Arc<dyn TestFn>) -> Self {
        Self { info, test }
    }

    /// Build a test case from a closure.
    pub fn from_fn<F>(info: TestCaseInfo, f: F) -> Self
    where
        F: Fn(&mut AssertionRecorder) + Send + Sync + 'static,
    {
        Self::new(info, Arc::new(f))
    }

    pub fn info(&self) -> &TestCaseInfo {
        &self.info
    }

    /// Copy of this test under a different name, sharing the same body.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        let mut other = self.clone();
        other.info.set_name(name.into());
        other
    }

    pub fn invoke(&self, recorder: &mut AssertionRecorder) {
        self.test.invoke(recorder);
    }

    /// Address of the shared body; stable for the life of the registration.
    fn invocable_id(&self) -> usize {
        Arc::as_ptr(&self.test) as *const () as usize
    }

    pub fn key(&self) -> TestKey {
        TestKey {
            invocable: self.invocable_id(),
            name: self.info.name().to_owned(),
            class_name: self.info.class_name().to_owned(),
        }
    }

    /// Lexicographic order by name only.
    ///
    /// Deliberately not an `Ord` impl: two tests with the same name can still be
    /// unequal, which `Ord` would not allow.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.info.name().cmp(other.info.name())
    }
}

impl Deref for TestCase {
    type Target = TestCaseInfo;

    fn deref(&self) -> &Self::Target {
        &self.info
    }
}

impl PartialEq for TestCase {
    fn eq(&self, other: &Self) -> bool {
        self.invocable_id() == other.invocable_id()
            && self.info.name() == other.info.name()
            && self.info.class_name() == other.info.class_name()
    }
}

impl Eq for TestCase {}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("info", &self.info)
            .field("invocable", &format_args!("{:#x}", self.invocable_id()))
            .finish()
    }
}
