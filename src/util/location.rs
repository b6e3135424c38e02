use std::fmt;

use serde::{Deserialize, Serialize};

/// Source location of a test registration.
///
/// Carried on every [`TestCaseInfo`](crate::testcase::TestCaseInfo) so
/// reporters can point at the code that declared a failing test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path of the file that registered the test.
    pub file: String,
    /// 1-based line of the registration.
    pub line: u32,
}

impl SourceLocation {
    /// Creates a location for the given file and line.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Whether this location carries no file information.
    pub fn is_unknown(&self) -> bool {
        self.file.is_empty()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "<unknown>")
        } else {
            write!(f, "{}:{}", self.file, self.line)
        }
    }
}

/// Captures the caller's file and line as a [`SourceLocation`].
#[macro_export]
macro_rules! here {
    () => {
        $crate::util::location::SourceLocation::new(file!(), line!())
    };
}
