use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A problem with the configuration of a run.
///
/// Always fatal, always raised before the first test body executes.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to open file: '{}'", path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No reporter registered with name: '{0}'")]
    UnknownReporter(String),

    #[error("invalid tag expression '{expression}' at offset {offset}: {message}")]
    TagExpression {
        expression: String,
        offset: usize,
        message: String,
    },

    #[error("Only one instance of Session can ever be used")]
    SessionAlreadyStarted,

    #[error("test case '{name}' is already registered (first declared at {first})")]
    DuplicateTest { name: String, first: String },

    #[error("failed to read config file '{}'", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{0}")]
    CommandLine(String),

    #[error("abort threshold must be at least 1")]
    ZeroAbortThreshold,

    #[error("session can no longer be configured once it has run or failed to configure")]
    ConfigurationLocked,
}

/// Failure of a whole run, as seen from the session.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write report: {0}")]
    Report(#[from] io::Error),

    #[error("session has already run; create a new process to run again")]
    AlreadyRan,
}

impl RunError {
    /// Whether this failure happened while configuring rather than while running.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_reporter_message_names_reporter() {
        let err = ConfigError::UnknownReporter("bogus".into());
        assert_eq!(
            err.to_string(),
            "No reporter registered with name: 'bogus'"
        );
    }

    #[test]
    fn open_output_message_names_path() {
        let err = ConfigError::OpenOutput {
            path: PathBuf::from("/no/such/dir/out.xml"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(
            err.to_string(),
            "Unable to open file: '/no/such/dir/out.xml'"
        );
    }

    #[test]
    fn tag_expression_message_includes_offset() {
        let err = ConfigError::TagExpression {
            expression: "[unit".into(),
            offset: 5,
            message: "unterminated tag".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid tag expression '[unit' at offset 5: unterminated tag"
        );
    }

    #[test]
    fn run_error_wraps_config_error() {
        let err: RunError = ConfigError::SessionAlreadyStarted.into();
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "Only one instance of Session can ever be used"
        );
    }

    #[test]
    fn run_error_report_is_not_config() {
        let err: RunError = io::Error::other("pipe closed").into();
        assert!(!err.is_config());
        assert!(err.to_string().contains("pipe closed"));
    }
}
