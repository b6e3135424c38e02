use std::path::PathBuf;

use clap::Parser;

use crate::session::config::{ConfigData, GroupSpec};

/// Command-line options. Values given here override the config file.
#[derive(Debug, Parser)]
#[command(
    name = "tagrun",
    about = "Run registered test cases, grouped by name and tag filters",
    version
)]
pub struct Cli {
    /// Test names, name patterns or tag expressions forming one filter group
    #[arg(value_name = "TEST_SPEC")]
    pub specs: Vec<String>,

    /// Additional filter group; separate its filters with ';'
    #[arg(short, long = "group", value_name = "SPEC")]
    pub groups: Vec<String>,

    /// Reporter to use
    #[arg(short, long, value_name = "NAME")]
    pub reporter: Option<String>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<String>,

    /// Name of the run
    #[arg(short, long, value_name = "RUN_NAME")]
    pub name: Option<String>,

    /// Abort at the first failure
    #[arg(short, long)]
    pub abort: bool,

    /// Abort after N failures
    #[arg(short = 'x', long, value_name = "N")]
    pub abortx: Option<usize>,

    /// Report passing tests too
    #[arg(short, long)]
    pub success: bool,

    /// Show test durations
    #[arg(short, long)]
    pub durations: bool,

    /// List matching tests instead of running them
    #[arg(short, long)]
    pub list_tests: bool,

    /// List the tags of matching tests
    #[arg(short = 't', long)]
    pub list_tags: bool,

    /// List available reporters
    #[arg(long)]
    pub list_reporters: bool,

    /// YAML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Split a `-g` value into a group. The raw value names the group.
fn parse_group(spec: &str) -> GroupSpec {
    GroupSpec {
        name: spec.trim().to_owned(),
        filters: spec
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
    }
}

impl Cli {
    /// Overlay these options onto `data`.
    ///
    /// Groups given on the command line replace the file's groups entirely.
    pub fn apply(self, data: &mut ConfigData) {
        let mut groups = Vec::new();
        if !self.specs.is_empty() {
            groups.push(GroupSpec::from_filters(self.specs));
        }
        groups.extend(self.groups.iter().map(|g| parse_group(g)));
        if !groups.is_empty() {
            data.groups = groups;
        }

        if let Some(reporter) = self.reporter {
            data.reporter = reporter;
        }
        if let Some(out) = self.out {
            data.output_filename = out;
        }
        if let Some(name) = self.name {
            data.name = name;
        }
        if self.abort {
            data.abort_after = Some(1);
        }
        if self.abortx.is_some() {
            data.abort_after = self.abortx;
        }

        data.show_successful |= self.success;
        data.show_durations |= self.durations;
        data.list_tests |= self.list_tests;
        data.list_tags |= self.list_tags;
        data.list_reporters |= self.list_reporters;
        data.verbose |= self.verbose;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tagrun").chain(args.iter().copied())).unwrap()
    }

    fn applied(args: &[&str], mut data: ConfigData) -> ConfigData {
        parse(args).apply(&mut data);
        data
    }

    #[test]
    fn positional_specs_form_one_group() {
        let data = applied(&["[unit]", "~slow*"], ConfigData::default());
        assert_eq!(data.groups.len(), 1);
        assert_eq!(data.groups[0].name, "[unit] ~slow*");
        assert_eq!(data.groups[0].filters, vec!["[unit]", "~slow*"]);
    }

    #[test]
    fn group_flag_splits_on_semicolon() {
        let data = applied(&["-g", "[a]; b*", "--group", "[c]"], ConfigData::default());
        assert_eq!(data.groups.len(), 2);
        assert_eq!(data.groups[0].name, "[a]; b*");
        assert_eq!(data.groups[0].filters, vec!["[a]", "b*"]);
        assert_eq!(data.groups[1].filters, vec!["[c]"]);
    }

    #[test]
    fn command_line_groups_replace_file_groups() {
        let file = ConfigData {
            groups: vec![GroupSpec::from_filters(vec!["[file]".into()])],
            ..ConfigData::default()
        };
        assert_eq!(applied(&[], file.clone()).groups, file.groups);
        let data = applied(&["[cli]"], file);
        assert_eq!(data.groups.len(), 1);
        assert_eq!(data.groups[0].name, "[cli]");
    }

    #[test]
    fn abort_flags() {
        assert_eq!(applied(&["-a"], ConfigData::default()).abort_after, Some(1));
        assert_eq!(applied(&["-x", "4"], ConfigData::default()).abort_after, Some(4));
        assert_eq!(applied(&["-a", "-x", "4"], ConfigData::default()).abort_after, Some(4));
        assert_eq!(applied(&[], ConfigData::default()).abort_after, None);
    }

    #[test]
    fn values_override_file() {
        let file = ConfigData {
            reporter: "junit".into(),
            name: "nightly".into(),
            ..ConfigData::default()
        };
        let data = applied(&["-r", "json", "-o", "out.json", "-s", "-d", "-v"], file);
        assert_eq!(data.reporter, "json");
        assert_eq!(data.output_filename, "out.json");
        assert_eq!(data.name, "nightly");
        assert!(data.show_successful && data.show_durations && data.verbose);
    }

    #[test]
    fn listing_flags() {
        let data = applied(&["-l", "-t", "--list-reporters"], ConfigData::default());
        assert!(data.list_tests && data.list_tags && data.list_reporters);
    }

    #[test]
    fn bad_abort_count_is_parse_error() {
        assert!(Cli::try_parse_from(["tagrun", "-x", "many"]).is_err());
    }
}
