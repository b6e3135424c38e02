use std::collections::HashSet;
use std::io::{self, Write};
use std::slice;
use std::time::Instant;

use crate::error::ConfigError;
use crate::filter::FilterGroup;
use crate::report::Reporter;
use crate::report::registry::ReporterRegistry;
use crate::runner::context::RunContext;
use crate::runner::output::open_output;
use crate::runner::result::{GroupInfo, Totals};
use crate::session::config::Config;
use crate::testcase::{TestCase, TestKey};

/// Executes the registry against the configured filter groups.
///
/// Each test runs at most once per runner, however many groups select it.
pub struct Runner<'c> {
    config: &'c Config,
    reporter: Box<dyn Reporter>,
    already_run: HashSet<TestKey>,
}

impl<'c> Runner<'c> {
    /// Resolve the reporter and open its output stream.
    ///
    /// The reporter name is checked before the output file is created, so an
    /// unknown reporter never leaves an empty file behind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownReporter`] or [`ConfigError::OpenOutput`].
    pub fn new(
        config: &'c Config,
        reporters: &ReporterRegistry,
        default_out: Box<dyn Write>,
    ) -> Result<Self, ConfigError> {
        let name = config.reporter_name();
        let factory = reporters
            .get(name)
            .ok_or_else(|| ConfigError::UnknownReporter(name.to_owned()))?;
        let out = open_output(config.output_filename(), default_out)?;
        log::debug!("using reporter '{name}'");
        Ok(Self {
            config,
            reporter: factory(config.reporter_config(), out),
            already_run: HashSet::new(),
        })
    }

    /// Whether this runner has already executed `test`.
    #[cfg(test)]
    fn has_run(&self, test: &TestCase) -> bool {
        self.already_run.contains(&test.key())
    }

    /// Number of distinct tests executed so far.
    pub fn run_count(&self) -> usize {
        self.already_run.len()
    }

    /// Run every filter group in declared order and return the session total.
    ///
    /// With no groups configured a single anonymous group selects every
    /// non-hidden test. Once the abort threshold is hit no further test
    /// starts, but every remaining group is still opened and closed.
    ///
    /// # Errors
    ///
    /// Only reporter I/O failures are returned; test failures are counted.
    pub fn run_tests(&mut self, tests: &[TestCase]) -> io::Result<Totals> {
        let started = Instant::now();
        let implicit = FilterGroup::match_all("");
        let groups = match self.config.filter_groups() {
            [] => slice::from_ref(&implicit),
            groups => groups,
        };
        let run_name = self.config.run_name();

        let mut context = RunContext::new(self.reporter.as_mut(), self.config.abort_after());
        context.test_run_starting(run_name)?;

        let count = groups.len();
        for (index, group) in groups.iter().enumerate() {
            let info = GroupInfo {
                name: group.name().to_owned(),
                index,
                count,
            };
            context.test_group_starting(&info)?;
            let ran = Self::run_group(&mut context, &mut self.already_run, group, tests)?;
            log::debug!("group '{}' ran {ran} test(s)", group.name());
            context.test_group_ended(info)?;
        }

        let totals = context.totals();
        context.test_run_ended(run_name, started.elapsed())?;
        log::debug!("{} distinct test(s) executed", self.run_count());
        Ok(totals)
    }

    /// Run the tests `group` selects that have not run yet. Returns how many
    /// were executed.
    fn run_group(
        context: &mut RunContext<'_>,
        already_run: &mut HashSet<TestKey>,
        group: &FilterGroup,
        tests: &[TestCase],
    ) -> io::Result<usize> {
        let mut ran = 0;
        let mut matched = 0;

        for test in tests {
            if !group.should_include(test.info()) {
                continue;
            }
            matched += 1;

            let key = test.key();
            if already_run.contains(&key) {
                log::debug!("'{}' already ran in an earlier group", test.name());
                continue;
            }
            if context.aborting() {
                break;
            }

            context.run_test(test)?;
            already_run.insert(key);
            ran += 1;
        }

        if matched == 0 && !group.name().is_empty() {
            context.no_matching_test_cases(group.name())?;
        }
        Ok(ran)
    }
}
