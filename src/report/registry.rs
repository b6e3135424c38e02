use std::io::Write;

use crate::report::console::ConsoleReporter;
use crate::report::junit::JunitReporter;
use crate::report::serialized::{Format, SerializedReporter};
use crate::report::{Reporter, ReporterConfig};

/// Builds a reporter writing to the given stream.
pub type ReporterFactory = fn(ReporterConfig, Box<dyn Write>) -> Box<dyn Reporter>;

/// Name used when no reporter is configured.
pub const DEFAULT_REPORTER: &str = "console";

struct Entry {
    name: String,
    description: String,
    factory: ReporterFactory,
}

/// Registry of available reporters, looked up by name.
pub struct ReporterRegistry {
    entries: Vec<Entry>,
}

impl ReporterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a registry with the built-in reporters:
    /// `console`, `junit`, `json` and `yaml`.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register("console", "human-readable streaming output", |config, out| {
            Box::new(ConsoleReporter::new(config, out))
        });
        reg.register("junit", "JUnit XML, one testsuite per filter group", |config, out| {
            Box::new(JunitReporter::new(config, out))
        });
        reg.register("json", "machine-readable JSON run report", |config, out| {
            Box::new(SerializedReporter::new(Format::Json, config, out))
        });
        reg.register("yaml", "machine-readable YAML run report", |config, out| {
            Box::new(SerializedReporter::new(Format::Yaml, config, out))
        });
        reg
    }

    /// Register a reporter. A later registration under the same name wins.
    pub fn register(&mut self, name: &str, description: &str, factory: ReporterFactory) {
        self.entries.retain(|e| e.name != name);
        self.entries.push(Entry {
            name: name.to_owned(),
            description: description.to_owned(),
            factory,
        });
    }

    /// Look up a reporter factory by name.
    pub fn get(&self, name: &str) -> Option<ReporterFactory> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.factory)
    }

    /// All registered reporter names with their descriptions.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.description.as_str()))
            .collect()
    }
}

impl Default for ReporterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
