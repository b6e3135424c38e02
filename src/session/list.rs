use std::collections::BTreeMap;
use std::collections::HashSet;
use std::io::{self, Write};

use crate::filter::FilterGroup;
use crate::report::registry::ReporterRegistry;
use crate::report::util::pluralize;
use crate::session::config::Config;
use crate::testcase::TestCase;

/// Tests selected by any configured group, in registration order, each once.
fn selected<'t>(config: &Config, tests: &'t [TestCase]) -> Vec<&'t TestCase> {
    let implicit = [FilterGroup::match_all("")];
    let groups = match config.filter_groups() {
        [] => &implicit[..],
        groups => groups,
    };
    let mut seen = HashSet::new();
    tests
        .iter()
        .filter(|t| groups.iter().any(|g| g.should_include(t.info())))
        .filter(|t| seen.insert(t.key()))
        .collect()
}

/// Print the selected tests. Returns how many were listed.
pub fn list_tests(config: &Config, tests: &[TestCase], out: &mut dyn Write) -> io::Result<usize> {
    let matching = selected(config, tests);
    if config.filter_groups().is_empty() {
        writeln!(out, "All available test cases:")?;
    } else {
        writeln!(out, "Matching test cases:")?;
    }
    for test in &matching {
        writeln!(out, "  {}", test.name())?;
        if !test.tags_as_string().is_empty() {
            writeln!(out, "      {}", test.tags_as_string())?;
        }
    }
    writeln!(out, "{}\n", pluralize(matching.len(), "matching test case"))?;
    Ok(matching.len())
}

/// Print every tag used by the selected tests with its usage count.
/// Returns the number of distinct tags.
pub fn list_tags(config: &Config, tests: &[TestCase], out: &mut dyn Write) -> io::Result<usize> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for test in selected(config, tests) {
        for tag in test.tags() {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    if config.filter_groups().is_empty() {
        writeln!(out, "All available tags:")?;
    } else {
        writeln!(out, "Tags for matching test cases:")?;
    }
    for (tag, count) in &counts {
        writeln!(out, "  {count:>4}  [{tag}]")?;
    }
    writeln!(out, "{}\n", pluralize(counts.len(), "tag"))?;
    Ok(counts.len())
}

/// Print the registered reporters. Returns how many there are.
pub fn list_reporters(reporters: &ReporterRegistry, out: &mut dyn Write) -> io::Result<usize> {
    let entries = reporters.list();
    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    writeln!(out, "Available reporters:")?;
    for (name, description) in &entries {
        writeln!(out, "  {name:<width$}  {description}")?;
    }
    writeln!(out)?;
    Ok(entries.len())
}
