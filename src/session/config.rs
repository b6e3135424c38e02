use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter::FilterGroup;
use crate::report::ReporterConfig;
use crate::report::registry::DEFAULT_REPORTER;

/// Run name used when none is configured.
pub const DEFAULT_RUN_NAME: &str = "tagrun";

/// One filter group as written in a config file or on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupSpec {
    pub name: String,
    pub filters: Vec<String>,
}

impl GroupSpec {
    /// A group whose name is its filters joined by spaces.
    pub fn from_filters(filters: Vec<String>) -> Self {
        Self {
            name: filters.join(" "),
            filters,
        }
    }
}

/// Raw, unvalidated configuration.
///
/// Deserialized from a YAML file and then overridden from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigData {
    pub name: String,
    /// Reporter name; empty selects the console reporter.
    pub reporter: String,
    /// Output file; empty writes to the default stream.
    pub output_filename: String,
    pub groups: Vec<GroupSpec>,
    pub abort_after: Option<usize>,
    pub show_successful: bool,
    pub show_durations: bool,
    pub list_tests: bool,
    pub list_tags: bool,
    pub list_reporters: bool,
    #[serde(skip)]
    pub show_help: bool,
    #[serde(skip)]
    pub verbose: bool,
}

impl ConfigData {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadConfig`] if the file cannot be read and
    /// [`ConfigError::ParseConfig`] if it is not valid configuration.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_listing(&self) -> bool {
        self.list_tests || self.list_tags || self.list_reporters
    }
}

/// Validated configuration with compiled filter groups.
#[derive(Debug, Clone)]
pub struct Config {
    data: ConfigData,
    groups: Vec<FilterGroup>,
}

impl Config {
    /// Validate `data` and compile its filter groups.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroAbortThreshold`] for an abort threshold of
    /// zero and [`ConfigError::TagExpression`] for a malformed group token.
    pub fn new(data: ConfigData) -> Result<Self, ConfigError> {
        if data.abort_after == Some(0) {
            return Err(ConfigError::ZeroAbortThreshold);
        }
        let groups = data
            .groups
            .iter()
            .map(|spec| FilterGroup::parse(spec.name.as_str(), spec.filters.as_slice()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { data, groups })
    }

    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    /// Filter groups in declared order. Empty means "run everything".
    pub fn filter_groups(&self) -> &[FilterGroup] {
        &self.groups
    }

    pub fn run_name(&self) -> &str {
        if self.data.name.is_empty() {
            DEFAULT_RUN_NAME
        } else {
            &self.data.name
        }
    }

    pub fn reporter_name(&self) -> &str {
        if self.data.reporter.is_empty() {
            DEFAULT_REPORTER
        } else {
            &self.data.reporter
        }
    }

    pub fn output_filename(&self) -> &str {
        &self.data.output_filename
    }

    pub fn abort_after(&self) -> Option<usize> {
        self.data.abort_after
    }

    pub fn reporter_config(&self) -> ReporterConfig {
        ReporterConfig {
            run_name: self.run_name().to_owned(),
            show_successful: self.data.show_successful,
            show_durations: self.data.show_durations,
        }
    }
}
