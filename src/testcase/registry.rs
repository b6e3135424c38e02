use crate::error::ConfigError;
use crate::runner::capture::AssertionRecorder;
use crate::testcase::{TestCase, TestCaseInfo};
use crate::util::location::SourceLocation;

/// Every discovered test, in registration order.
///
/// Populated before a session starts and only read while it runs.
#[derive(Debug, Default)]
pub struct TestRegistry {
    tests: Vec<TestCase>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self { tests: Vec::new() }
    }

    /// Register a test case.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateTest`] if a test with the same name and
    /// class name is already registered.
    pub fn register(&mut self, test: TestCase) -> Result<(), ConfigError> {
        if let Some(existing) = self
            .tests
            .iter()
            .find(|t| t.name() == test.name() && t.class_name() == test.class_name())
        {
            return Err(ConfigError::DuplicateTest {
                name: test.name().to_owned(),
                first: existing.location().to_string(),
            });
        }
        log::trace!("registered test '{}' {}", test.name(), test.tags_as_string());
        self.tests.push(test);
        Ok(())
    }

    /// Register a free-function test with no class name.
    ///
    /// # Errors
    ///
    /// See [`TestRegistry::register`].
    pub fn add<F>(
        &mut self,
        name: &str,
        description: &str,
        location: SourceLocation,
        f: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&mut AssertionRecorder) + Send + Sync + 'static,
    {
        let info = TestCaseInfo::new(name, "", description, location);
        self.register(TestCase::from_fn(info, f))
    }

    /// All tests in registration order.
    pub fn all(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
