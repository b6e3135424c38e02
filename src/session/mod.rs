pub mod args;
pub mod config;
pub mod list;

use std::ffi::OsString;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::error::{ConfigError, RunError};
use crate::report::registry::ReporterRegistry;
use crate::runner::executor::Runner;
use crate::runner::output::open_output;
use crate::testcase::registry::TestRegistry;

use self::args::Cli;
use self::config::{Config, ConfigData};

/// Exit code for configuration and runtime failures.
pub const SENTINEL_EXIT_CODE: i32 = 255;

/// Largest exit code a failure count maps to, so it never collides with
/// [`SENTINEL_EXIT_CODE`].
pub const MAX_FAILURE_EXIT_CODE: i32 = 254;

/// Map a count of failures (or listed items) to a process exit code.
pub fn exit_code(count: usize) -> i32 {
    i32::try_from(count).map_or(MAX_FAILURE_EXIT_CODE, |n| n.min(MAX_FAILURE_EXIT_CODE))
}

/// Guards against more than one [`Session`] per process.
///
/// The entry point owns one, usually in a `static`, and hands it to
/// [`Session::new`]. Tests can create their own.
#[derive(Debug, Default)]
pub struct InstanceFlag(AtomicBool);

impl InstanceFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Returns `true` only for the first caller.
    fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_claimed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where a session is in its lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconfigured,
    Configured,
    Running,
    Completed,
    ConfigError,
    RuntimeError,
}

impl SessionState {
    /// Whether configuration may still be applied or replaced.
    pub fn accepts_configuration(self) -> bool {
        matches!(self, Self::Unconfigured | Self::Configured)
    }
}

/// Process entry point: command line in, exit code out.
pub struct Session<'t> {
    tests: &'t TestRegistry,
    reporters: ReporterRegistry,
    data: ConfigData,
    config: Option<Config>,
    state: SessionState,
    out: Option<Box<dyn Write>>,
    err: Box<dyn Write>,
}

impl<'t> Session<'t> {
    /// Start the one session this process may have.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SessionAlreadyStarted`] if `flag` was already
    /// claimed by another session.
    pub fn new(flag: &InstanceFlag, tests: &'t TestRegistry) -> Result<Self, ConfigError> {
        if !flag.claim() {
            return Err(ConfigError::SessionAlreadyStarted);
        }
        Ok(Self {
            tests,
            reporters: ReporterRegistry::builtin(),
            data: ConfigData::default(),
            config: None,
            state: SessionState::Unconfigured,
            out: None,
            err: Box::new(io::stderr()),
        })
    }

    pub fn with_reporters(mut self, reporters: ReporterRegistry) -> Self {
        self.reporters = reporters;
        self
    }

    /// Stream used when no output file is configured. Defaults to stdout.
    pub fn with_output(mut self, out: Box<dyn Write>) -> Self {
        self.out = Some(out);
        self
    }

    /// Stream for configuration and runtime errors. Defaults to stderr.
    pub fn with_error_output(mut self, err: Box<dyn Write>) -> Self {
        self.err = err;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config_data(&self) -> &ConfigData {
        &self.data
    }

    /// The validated configuration, once there is one.
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn show_help(&self) -> bool {
        self.data.show_help
    }

    /// Configure from command-line arguments, the first being the program name.
    ///
    /// Returns 0 on success. On bad input the problem and a usage line go to
    /// the error stream and the sentinel exit code is returned. A session
    /// that has run, or failed to configure, is left as it is.
    pub fn apply_command_line<I, T>(&mut self, args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        if !self.state.accepts_configuration() {
            self.report_error(&RunError::from(ConfigError::ConfigurationLocked));
            return SENTINEL_EXIT_CODE;
        }

        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                let mut data = self.data.clone();
                data.show_help = true;
                let _ = write!(self.output(), "{e}");
                return self.configure(data);
            }
            Err(e) => {
                let error = ConfigError::CommandLine(clap_message(&e.to_string()));
                self.input_error(&error.to_string());
                return SENTINEL_EXIT_CODE;
            }
        };

        let mut data = match &cli.config {
            Some(path) => match ConfigData::from_file(path) {
                Ok(data) => data,
                Err(e) => {
                    self.input_error(&e.to_string());
                    return SENTINEL_EXIT_CODE;
                }
            },
            None => self.data.clone(),
        };
        cli.apply(&mut data);
        self.configure(data)
    }

    /// Configure programmatically.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; the session is then in
    /// [`SessionState::ConfigError`]. Returns
    /// [`ConfigError::ConfigurationLocked`] without touching the session once
    /// it has left the configurable states.
    pub fn use_config_data(&mut self, data: ConfigData) -> Result<(), ConfigError> {
        if !self.state.accepts_configuration() {
            return Err(ConfigError::ConfigurationLocked);
        }
        match Config::new(data.clone()) {
            Ok(config) => {
                self.data = data;
                self.config = Some(config);
                self.state = SessionState::Configured;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::ConfigError;
                Err(e)
            }
        }
    }

    fn configure(&mut self, data: ConfigData) -> i32 {
        match self.use_config_data(data) {
            Ok(()) => 0,
            Err(e) => {
                self.input_error(&e.to_string());
                SENTINEL_EXIT_CODE
            }
        }
    }

    /// Run the configured tests.
    ///
    /// Returns the number of failed assertions (or listed items), capped at
    /// [`MAX_FAILURE_EXIT_CODE`], 0 when only help was requested, and
    /// [`SENTINEL_EXIT_CODE`] on any configuration or runtime failure.
    pub fn run(&mut self) -> i32 {
        match self.state {
            SessionState::Unconfigured => {
                let data = self.data.clone();
                if let Err(e) = self.use_config_data(data) {
                    self.report_error(&RunError::from(e));
                    return SENTINEL_EXIT_CODE;
                }
            }
            SessionState::Configured => {}
            // Already reported when configuration failed.
            SessionState::ConfigError => return SENTINEL_EXIT_CODE,
            SessionState::Running | SessionState::Completed | SessionState::RuntimeError => {
                self.report_error(&RunError::AlreadyRan);
                return SENTINEL_EXIT_CODE;
            }
        }

        if self.data.show_help {
            self.state = SessionState::Completed;
            return 0;
        }

        self.state = SessionState::Running;
        match self.execute() {
            Ok(code) => {
                self.state = SessionState::Completed;
                code
            }
            Err(e) => {
                self.state = if e.is_config() {
                    SessionState::ConfigError
                } else {
                    SessionState::RuntimeError
                };
                self.report_error(&e);
                SENTINEL_EXIT_CODE
            }
        }
    }

    /// [`apply_command_line`](Self::apply_command_line) followed by [`run`](Self::run).
    pub fn run_with_args<I, T>(&mut self, args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let code = self.apply_command_line(args);
        if code != 0 {
            return code;
        }
        self.run()
    }

    fn execute(&mut self) -> Result<i32, RunError> {
        let default_out = self.take_output();
        let config = self.config.as_ref().ok_or(RunError::AlreadyRan)?;

        let reporter = config.reporter_name();
        if self.reporters.get(reporter).is_none() {
            return Err(ConfigError::UnknownReporter(reporter.to_owned()).into());
        }

        if self.data.is_listing() {
            let mut out = open_output(config.output_filename(), default_out)?;
            let tests = self.tests.all();
            let mut listed = 0;
            if self.data.list_tests {
                listed += list::list_tests(config, tests, out.as_mut())?;
            }
            if self.data.list_tags {
                listed += list::list_tags(config, tests, out.as_mut())?;
            }
            if self.data.list_reporters {
                listed += list::list_reporters(&self.reporters, out.as_mut())?;
            }
            out.flush()?;
            return Ok(exit_code(listed));
        }

        let mut runner = Runner::new(config, &self.reporters, default_out)?;
        let totals = runner.run_tests(self.tests.all())?;
        Ok(exit_code(totals.assertions.failed))
    }

    fn output(&mut self) -> &mut dyn Write {
        self.out.get_or_insert_with(|| Box::new(io::stdout())).as_mut()
    }

    fn take_output(&mut self) -> Box<dyn Write> {
        self.out.take().unwrap_or_else(|| Box::new(io::stdout()))
    }

    fn input_error(&mut self, message: &str) {
        self.state = SessionState::ConfigError;
        let usage = Cli::command().render_usage();
        let _ = write!(self.err, "{}\n{usage}\n", format_input_error(message));
        let _ = self.err.flush();
    }

    fn report_error(&mut self, error: &RunError) {
        log::error!("{error}");
        let _ = writeln!(self.err, "error: {error}");
        let _ = self.err.flush();
    }
}

/// The part of a clap error above the usage section, without the `error:` prefix.
fn clap_message(rendered: &str) -> String {
    rendered
        .lines()
        .take_while(|line| !line.trim_start().starts_with("Usage:"))
        .map(|line| line.strip_prefix("error: ").unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `\nError in input:\n` then the message, first line indented by two
/// spaces and continuation lines by four.
pub fn format_input_error(message: &str) -> String {
    let mut text = String::from("\nError in input:\n");
    for (i, line) in message.lines().enumerate() {
        let indent = if i == 0 { "  " } else { "    " };
        let _ = writeln!(text, "{indent}{line}");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use crate::runner::capture::AssertionRecorder;
    use crate::util::buffer::SharedBuffer;
    use crate::util::location::SourceLocation;

    fn registry() -> TestRegistry {
        let mut reg = TestRegistry::new();
        reg.add("passes", "[unit]", SourceLocation::new("s.rs", 1), |r: &mut AssertionRecorder| {
            r.check(true, "true");
        })
        .unwrap();
        reg.add("fails", "[unit]", SourceLocation::new("s.rs", 2), |r: &mut AssertionRecorder| {
            r.check(false, "false");
            r.check(false, "false again");
        })
        .unwrap();
        reg.add("other", "[integration]", SourceLocation::new("s.rs", 3), |r: &mut AssertionRecorder| {
            r.check(true, "true");
        })
        .unwrap();
        reg
    }

    struct Harness {
        out: SharedBuffer,
        err: SharedBuffer,
    }

    fn session<'t>(flag: &InstanceFlag, tests: &'t TestRegistry) -> (Session<'t>, Harness) {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let session = Session::new(flag, tests)
            .unwrap()
            .with_output(out.boxed())
            .with_error_output(err.boxed());
        (session, Harness { out, err })
    }

    #[test]
    fn exit_code_saturates() {
        assert_eq!(exit_code(0), 0);
        assert_eq!(exit_code(7), 7);
        assert_eq!(exit_code(254), 254);
        assert_eq!(exit_code(255), 254);
        assert_eq!(exit_code(usize::MAX), 254);
    }

    #[test]
    fn second_session_rejected() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let _first = Session::new(&flag, &tests).unwrap();
        assert!(flag.is_claimed());
        assert!(matches!(
            Session::new(&flag, &tests),
            Err(ConfigError::SessionAlreadyStarted)
        ));
    }

    #[test]
    fn run_returns_failed_assertion_count() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.run_with_args(["tagrun"]), 2);
        assert_eq!(s.state(), SessionState::Completed);
        assert!(h.out.contents().contains("[FAILED] fails"));
        assert!(h.err.is_empty());
    }

    #[test]
    fn run_without_command_line_uses_defaults() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, _h) = session(&flag, &tests);
        assert_eq!(s.state(), SessionState::Unconfigured);
        assert_eq!(s.run(), 2);
    }

    #[test]
    fn filters_from_command_line() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, _h) = session(&flag, &tests);
        assert_eq!(s.run_with_args(["tagrun", "[integration]"]), 0);
    }

    #[test]
    fn unknown_reporter_returns_sentinel() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.run_with_args(["tagrun", "-r", "bogus"]), SENTINEL_EXIT_CODE);
        assert_eq!(s.state(), SessionState::ConfigError);
        assert!(h.err.contents().contains("No reporter registered with name: 'bogus'"));
        assert!(h.out.is_empty());
    }

    #[test]
    fn bad_argument_prints_error_in_input() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.run_with_args(["tagrun", "--bogus-flag"]), SENTINEL_EXIT_CODE);
        let err = h.err.contents();
        assert!(err.starts_with("\nError in input:\n  "));
        assert!(err.contains("--bogus-flag"));
        assert!(err.contains("Usage:"));
        assert_eq!(s.state(), SessionState::ConfigError);
    }

    #[test]
    fn malformed_tag_expression_is_input_error() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.run_with_args(["tagrun", "[unit"]), SENTINEL_EXIT_CODE);
        assert!(h.err.contents().contains("Error in input"));
    }

    #[test]
    fn help_returns_zero_without_running() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.run_with_args(["tagrun", "--help"]), 0);
        assert!(s.show_help());
        let out = h.out.contents();
        assert!(out.contains("Usage:"));
        assert!(!out.contains("[FAILED]"));
    }

    #[test]
    fn listing_returns_item_count() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.run_with_args(["tagrun", "--list-tests", "[unit]"]), 2);
        assert!(h.out.contents().contains("Matching test cases:"));
    }

    #[test]
    fn second_run_is_rejected() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.run(), 2);
        assert_eq!(s.run(), SENTINEL_EXIT_CODE);
        assert!(h.err.contents().contains("already run"));
    }

    #[test]
    fn reconfigure_after_run_is_rejected() {
        let flag = InstanceFlag::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let mut tests = TestRegistry::new();
        let counter = Arc::clone(&runs);
        tests
            .add("counted", "", SourceLocation::new("s.rs", 9), move |r: &mut AssertionRecorder| {
                counter.fetch_add(1, Ordering::SeqCst);
                r.check(false, "false");
            })
            .unwrap();
        let (mut s, _h) = session(&flag, &tests);

        assert_eq!(s.run(), 1);
        assert!(matches!(
            s.use_config_data(ConfigData::default()),
            Err(ConfigError::ConfigurationLocked)
        ));
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.apply_command_line(["tagrun"]), SENTINEL_EXIT_CODE);
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.run(), SENTINEL_EXIT_CODE);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn config_error_is_terminal() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.apply_command_line(["tagrun", "[unit"]), SENTINEL_EXIT_CODE);
        assert_eq!(s.state(), SessionState::ConfigError);

        assert!(s.use_config_data(ConfigData::default()).is_err());
        assert_eq!(s.state(), SessionState::ConfigError);
        assert_eq!(s.run(), SENTINEL_EXIT_CODE);
        assert!(!h.out.contents().contains("[FAILED]"));
    }

    #[test]
    fn listing_with_unknown_reporter_is_config_error() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.run_with_args(["tagrun", "-l", "-r", "bogus"]), SENTINEL_EXIT_CODE);
        assert_eq!(s.state(), SessionState::ConfigError);
        assert!(h.err.contents().contains("No reporter registered with name: 'bogus'"));
        assert!(!h.out.contents().contains("Matching test cases"));
    }

    #[test]
    fn zero_abortx_is_input_error() {
        let flag = InstanceFlag::new();
        let tests = registry();
        let (mut s, h) = session(&flag, &tests);
        assert_eq!(s.run_with_args(["tagrun", "-x", "0"]), SENTINEL_EXIT_CODE);
        assert!(h.err.contents().contains("abort threshold"));
    }

    #[test]
    fn input_error_indentation() {
        assert_eq!(
            format_input_error("first\nsecond"),
            "\nError in input:\n  first\n    second\n"
        );
    }

    #[test]
    fn clap_message_strips_prefix_and_usage() {
        let rendered = "error: unexpected argument '--x' found\n\nUsage: tagrun [OPTIONS]\n\nFor more information, try '--help'.\n";
        assert_eq!(clap_message(rendered), "unexpected argument '--x' found");
    }
}
