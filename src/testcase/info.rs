use crate::error::ConfigError;
use crate::testcase::expr::TagExpr;
use crate::testcase::tags::{self, TagSet};
use crate::util::location::SourceLocation;

/// Immutable description of a registered test.
///
/// Tags are pulled out of the description at construction time, and the
/// hidden flag and tag rendering are computed once there and never again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseInfo {
    name: String,
    class_name: String,
    description: String,
    tags: TagSet,
    tags_as_string: String,
    location: SourceLocation,
    hidden: bool,
}

impl TestCaseInfo {
    /// Describe a test. `description` may embed `[tag]` tokens.
    pub fn new(
        name: impl Into<String>,
        class_name: impl Into<String>,
        description: &str,
        location: SourceLocation,
    ) -> Self {
        let name = name.into();
        let (description, tags) = tags::extract_tags(description);
        let hidden = tags::is_hidden(&name, &tags);
        let tags_as_string = tags::render_tags(&tags);
        Self {
            name,
            class_name: class_name.into(),
            description,
            tags,
            tags_as_string,
            location,
            hidden,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grouping label, e.g. the fixture a method test belongs to. Often empty.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Free-text description with tag tokens removed.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Tags rendered as `[a][b]`, in set order.
    pub fn tags_as_string(&self) -> &str {
        &self.tags_as_string
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tags::normalize_tag(tag))
    }

    /// Parse `pattern` as a tag expression and evaluate it against this test.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TagExpression`] if `pattern` is malformed.
    pub fn matches_tags(&self, pattern: &str) -> Result<bool, ConfigError> {
        Ok(TagExpr::parse(pattern)?.matches(&self.tags))
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, desc: &str) -> TestCaseInfo {
        TestCaseInfo::new(name, "", desc, SourceLocation::new("tests/info.rs", 1))
    }

    #[test]
    fn info_extracts_tags_from_description() {
        let i = info("adds", "sums two values [Math][unit]");
        assert_eq!(i.description(), "sums two values");
        assert_eq!(i.tags().len(), 2);
        assert_eq!(i.tags_as_string(), "[math][unit]");
    }

    #[test]
    fn info_not_hidden_by_default() {
        assert!(!info("adds", "[unit]").is_hidden());
    }

    #[test]
    fn info_hidden_by_hide_tag() {
        assert!(info("adds", "[hide]").is_hidden());
        assert!(info("adds", "[.][unit]").is_hidden());
    }

    #[test]
    fn info_hidden_by_name_prefix() {
        assert!(info("./adds", "").is_hidden());
    }

    #[test]
    fn has_tag_is_case_insensitive() {
        let i = info("adds", "[Unit]");
        assert!(i.has_tag("unit"));
        assert!(i.has_tag("UNIT"));
        assert!(!i.has_tag("integration"));
    }

    #[test]
    fn matches_tags_evaluates_expression() {
        let i = info("adds", "[unit][fast]");
        assert!(i.matches_tags("[unit]").unwrap());
        assert!(i.matches_tags("[UNIT][fast]").unwrap());
        assert!(!i.matches_tags("[unit]~[fast]").unwrap());
        assert!(i.matches_tags("[slow],[fast]").unwrap());
    }

    #[test]
    fn matches_tags_rejects_malformed_pattern() {
        let i = info("adds", "[unit]");
        assert!(matches!(
            i.matches_tags("[unit"),
            Err(ConfigError::TagExpression { .. })
        ));
    }

    #[test]
    fn info_keeps_location_and_class() {
        let i = TestCaseInfo::new("m", "Fixture", "", SourceLocation::new("a.rs", 9));
        assert_eq!(i.class_name(), "Fixture");
        assert_eq!(i.location().line, 9);
    }
}
