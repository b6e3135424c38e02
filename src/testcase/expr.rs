use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::testcase::tags::{TagSet, normalize_tag};

/// A boolean expression over tag literals.
///
/// Grammar:
///
/// ```text
/// expr    := and ( ',' and )*
/// and     := unary+
/// unary   := '~' unary | primary
/// primary := '[' tag ']' | '(' expr ')'
/// ```
///
/// `[unit][fast]` requires both tags, `[unit],[fast]` either, `~[slow]`
/// excludes a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagExpr {
    Tag(String),
    Not(Box<TagExpr>),
    And(Vec<TagExpr>),
    Or(Vec<TagExpr>),
}

impl TagExpr {
    /// Parse a tag expression.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TagExpression`] if the input is empty or malformed.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut parser = Parser::new(input);
        parser.skip_whitespace();
        if parser.at_end() {
            return Err(parser.error("empty tag expression"));
        }
        let expr = parser.parse_or()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(expr),
            Some(c) => Err(parser.error(format!("unexpected '{c}'"))),
        }
    }

    /// Evaluate against a normalized tag set.
    pub fn matches(&self, tags: &TagSet) -> bool {
        match self {
            Self::Tag(tag) => tags.contains(tag),
            Self::Not(inner) => !inner.matches(tags),
            Self::And(items) => items.iter().all(|e| e.matches(tags)),
            Self::Or(items) => items.iter().any(|e| e.matches(tags)),
        }
    }

    /// Whether any literal in the expression appears un-negated.
    ///
    /// Used to decide whether an expression explicitly selects hidden tests.
    pub fn has_positive_literal(&self) -> bool {
        self.positive(false)
    }

    fn positive(&self, negated: bool) -> bool {
        match self {
            Self::Tag(_) => !negated,
            Self::Not(inner) => inner.positive(!negated),
            Self::And(items) | Self::Or(items) => items.iter().any(|e| e.positive(negated)),
        }
    }
}

impl FromStr for TagExpr {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "[{tag}]"),
            Self::Not(inner) => match inner.as_ref() {
                Self::Tag(_) | Self::Not(_) => write!(f, "~{inner}"),
                _ => write!(f, "~({inner})"),
            },
            Self::And(items) => {
                for item in items {
                    match item {
                        Self::Or(_) => write!(f, "({item})")?,
                        _ => write!(f, "{item}")?,
                    }
                }
                Ok(())
            }
            Self::Or(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Peek the next significant character.
    fn peek_token(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.peek()
    }

    fn error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::TagExpression {
            expression: self.input.to_owned(),
            offset: self.pos,
            message: message.into(),
        }
    }

    fn parse_or(&mut self) -> Result<TagExpr, ConfigError> {
        let mut items = vec![self.parse_and()?];
        while self.peek_token() == Some(',') {
            self.bump();
            items.push(self.parse_and()?);
        }
        Ok(collapse(items, TagExpr::Or))
    }

    fn parse_and(&mut self) -> Result<TagExpr, ConfigError> {
        let mut items = vec![self.parse_unary()?];
        while matches!(self.peek_token(), Some('[' | '~' | '(')) {
            items.push(self.parse_unary()?);
        }
        Ok(collapse(items, TagExpr::And))
    }

    fn parse_unary(&mut self) -> Result<TagExpr, ConfigError> {
        if self.peek_token() == Some('~') {
            self.bump();
            if self.peek_token().is_none() {
                return Err(self.error("dangling '~'"));
            }
            return Ok(TagExpr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<TagExpr, ConfigError> {
        match self.peek_token() {
            Some('[') => {
                self.bump();
                let start = self.pos;
                let Some(len) = self.input[start..].find(']') else {
                    self.pos = self.input.len();
                    return Err(self.error("unterminated tag, expected ']'"));
                };
                let tag = normalize_tag(&self.input[start..start + len]);
                if tag.is_empty() {
                    return Err(self.error("empty tag"));
                }
                if tag.contains('[') {
                    return Err(self.error("'[' inside tag"));
                }
                self.pos = start + len + 1;
                Ok(TagExpr::Tag(tag))
            }
            Some('(') => {
                self.bump();
                let inner = self.parse_or()?;
                match self.peek_token() {
                    Some(')') => {
                        self.bump();
                        Ok(inner)
                    }
                    _ => Err(self.error("expected ')'")),
                }
            }
            Some(c) => Err(self.error(format!("expected '[', '~' or '(', found '{c}'"))),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

fn collapse(mut items: Vec<TagExpr>, wrap: fn(Vec<TagExpr>) -> TagExpr) -> TagExpr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}
