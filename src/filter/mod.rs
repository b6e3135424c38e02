use crate::error::ConfigError;
use crate::testcase::TestCaseInfo;
use crate::testcase::expr::TagExpr;

/// Where a `*` wildcard appears in a name pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wildcard {
    None,
    AtStart,
    AtEnd,
    AtBothEnds,
}

/// A case-insensitive test-name pattern, optionally negated.
///
/// - `"adds two numbers"` → exact name
/// - `"adds*"` / `"*numbers"` / `"*two*"` → prefix / suffix / substring
/// - `"~slow*"` or `"exclude:slow*"` → exclusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    text: String,
    wildcard: Wildcard,
    exclude: bool,
}

impl NamePattern {
    pub fn parse(spec: &str) -> Self {
        let mut text = spec.trim().to_lowercase();
        let mut exclude = false;
        if let Some(rest) = text.strip_prefix("exclude:") {
            text = rest.to_owned();
            exclude = true;
        } else if let Some(rest) = text.strip_prefix('~') {
            text = rest.to_owned();
            exclude = true;
        }

        let at_start = text.starts_with('*');
        if at_start {
            text.remove(0);
        }
        let at_end = text.ends_with('*');
        if at_end {
            text.pop();
        }
        let wildcard = match (at_start, at_end) {
            (false, false) => Wildcard::None,
            (true, false) => Wildcard::AtStart,
            (false, true) => Wildcard::AtEnd,
            (true, true) => Wildcard::AtBothEnds,
        };

        Self {
            text,
            wildcard,
            exclude,
        }
    }

    pub fn is_exclusion(&self) -> bool {
        self.exclude
    }

    /// Whether the name matches, ignoring negation.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        match self.wildcard {
            Wildcard::None => name == self.text,
            Wildcard::AtStart => name.ends_with(&self.text),
            Wildcard::AtEnd => name.starts_with(&self.text),
            Wildcard::AtBothEnds => name.contains(&self.text),
        }
    }
}

/// A named predicate deciding which tests a filter group runs.
///
/// Tokens starting with `[`, `~[` or `(` are tag expressions, everything else
/// is a [`NamePattern`]. A group with no tokens matches every non-hidden test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGroup {
    name: String,
    tag_expressions: Vec<TagExpr>,
    inclusions: Vec<NamePattern>,
    exclusions: Vec<NamePattern>,
}

impl FilterGroup {
    /// A group that selects every non-hidden test.
    pub fn match_all(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag_expressions: Vec::new(),
            inclusions: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    /// Build a group from its tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TagExpression`] if a tag token is malformed.
    pub fn parse<S: AsRef<str>>(name: impl Into<String>, tokens: &[S]) -> Result<Self, ConfigError> {
        let mut group = Self::match_all(name);
        for token in tokens {
            group.add_token(token.as_ref())?;
        }
        Ok(group)
    }

    /// Add one tag-expression or name-pattern token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TagExpression`] if a tag token is malformed.
    pub fn add_token(&mut self, token: &str) -> Result<(), ConfigError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(());
        }
        if is_tag_token(token) {
            self.tag_expressions.push(TagExpr::parse(token)?);
        } else {
            let pattern = NamePattern::parse(token);
            if pattern.is_exclusion() {
                self.exclusions.push(pattern);
            } else {
                self.inclusions.push(pattern);
            }
        }
        Ok(())
    }

    /// Empty for the anonymous catch-all group.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_match_all(&self) -> bool {
        self.tag_expressions.is_empty() && self.inclusions.is_empty() && self.exclusions.is_empty()
    }

    /// Whether the test belongs to this group.
    pub fn should_include(&self, test: &TestCaseInfo) -> bool {
        if !self.tag_expressions.is_empty()
            && !self.tag_expressions.iter().any(|e| e.matches(test.tags()))
        {
            return false;
        }

        if !self.inclusions.is_empty() && !self.inclusions.iter().any(|p| p.matches_name(test.name()))
        {
            return false;
        }

        if self.exclusions.iter().any(|p| p.matches_name(test.name())) {
            return false;
        }

        !test.is_hidden() || self.selects_explicitly()
    }

    /// Hidden tests need a positive tag or name token to be picked up.
    fn selects_explicitly(&self) -> bool {
        !self.inclusions.is_empty() || self.tag_expressions.iter().any(TagExpr::has_positive_literal)
    }
}

fn is_tag_token(token: &str) -> bool {
    token.starts_with('[') || token.starts_with("~[") || token.starts_with('(')
}
