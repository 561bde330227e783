//! Matchers for funnel steps, error categories and purchase signatures.
//!
//! Matching is always explicit: every step or rule carries its own matcher,
//! nothing is inferred from the data.
//!
//! In TOML a matcher is either a shorthand string or a single-key table:
//!
//! ```toml
//! path = "/cart"                        # exact
//! path = "/products/*"                  # prefix "/products"
//! css  = { contains = "error-message" }
//! text = { icontains = "declined" }
//! text = { pattern = "(?i)declined" }
//! ```

use crate::loader::Event;
use crate::utils::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a single string field is matched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MatcherSpec", into = "MatcherSpec")]
pub enum Matcher {
    /// Whole value must be equal
    Exact(String),

    /// Value is the prefix itself or continues it past a `/`
    /// (parameterized routes like `/products/*`)
    Prefix(String),

    /// Value must contain the needle anywhere
    Contains(String),

    /// Like `Contains`, ignoring case
    ContainsIgnoreCase(String),

    /// Value must match the regular expression
    Pattern(Regex),
}

impl Matcher {
    pub fn exact(value: impl Into<String>) -> Self {
        Matcher::Exact(value.into())
    }

    pub fn prefix(value: impl Into<String>) -> Self {
        Matcher::Prefix(value.into())
    }

    pub fn contains(value: impl Into<String>) -> Self {
        Matcher::Contains(value.into())
    }

    pub fn contains_ignore_case(value: &str) -> Self {
        Matcher::ContainsIgnoreCase(value.to_lowercase())
    }

    /// Compile a regex matcher
    ///
    /// # Errors
    /// * `ConfigError::InvalidPattern` - the expression does not compile
    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Matcher::Pattern)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Parse the shorthand string form: `"/x/*"` is a prefix, anything else exact
    pub fn from_shorthand(value: &str) -> Self {
        match value.strip_suffix("/*") {
            Some(prefix) => Matcher::prefix(prefix),
            None => Matcher::exact(value),
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Matcher::Exact(expected) => value == expected,
            Matcher::Prefix(prefix) => is_route_prefix(prefix, value),
            Matcher::Contains(needle) => value.contains(needle.as_str()),
            Matcher::ContainsIgnoreCase(needle) => value.to_lowercase().contains(needle.as_str()),
            Matcher::Pattern(re) => re.is_match(value),
        }
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Matcher::Exact(a), Matcher::Exact(b))
            | (Matcher::Prefix(a), Matcher::Prefix(b))
            | (Matcher::Contains(a), Matcher::Contains(b))
            | (Matcher::ContainsIgnoreCase(a), Matcher::ContainsIgnoreCase(b)) => a == b,
            (Matcher::Pattern(a), Matcher::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// Serialized form of a [`Matcher`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum MatcherSpec {
    Shorthand(String),
    Exact { exact: String },
    Prefix { prefix: String },
    Contains { contains: String },
    ContainsIgnoreCase { icontains: String },
    Pattern { pattern: String },
}

impl TryFrom<MatcherSpec> for Matcher {
    type Error = ConfigError;

    fn try_from(spec: MatcherSpec) -> Result<Self, Self::Error> {
        Ok(match spec {
            MatcherSpec::Shorthand(value) => Matcher::from_shorthand(&value),
            MatcherSpec::Exact { exact } => Matcher::Exact(exact),
            MatcherSpec::Prefix { prefix } => Matcher::Prefix(prefix),
            MatcherSpec::Contains { contains } => Matcher::Contains(contains),
            MatcherSpec::ContainsIgnoreCase { icontains } => {
                Matcher::contains_ignore_case(&icontains)
            }
            MatcherSpec::Pattern { pattern } => Matcher::pattern(&pattern)?,
        })
    }
}

impl From<Matcher> for MatcherSpec {
    fn from(matcher: Matcher) -> Self {
        match matcher {
            // Shorthand would read an exact "/x/*" back as a prefix
            Matcher::Exact(exact) if exact.ends_with("/*") => MatcherSpec::Exact { exact },
            Matcher::Exact(exact) => MatcherSpec::Shorthand(exact),
            Matcher::Prefix(prefix) => MatcherSpec::Prefix { prefix },
            Matcher::Contains(contains) => MatcherSpec::Contains { contains },
            Matcher::ContainsIgnoreCase(icontains) => MatcherSpec::ContainsIgnoreCase { icontains },
            Matcher::Pattern(re) => MatcherSpec::Pattern {
                pattern: re.as_str().to_string(),
            },
        }
    }
}

/// Conjunction of optional field matchers over one event
///
/// Every present matcher must accept its field. A matcher with no fields set
/// accepts every event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMatcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Matcher>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<Matcher>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Matcher>,
}

impl EventMatcher {
    /// Matcher that accepts every event
    pub fn any() -> Self {
        Self::default()
    }

    pub fn on_path(matcher: Matcher) -> Self {
        Self::any().with_path(matcher)
    }

    pub fn on_css(matcher: Matcher) -> Self {
        Self::any().with_css(matcher)
    }

    pub fn on_text(matcher: Matcher) -> Self {
        Self::any().with_text(matcher)
    }

    pub fn with_path(mut self, matcher: Matcher) -> Self {
        self.path = Some(matcher);
        self
    }

    pub fn with_css(mut self, matcher: Matcher) -> Self {
        self.css = Some(matcher);
        self
    }

    pub fn with_text(mut self, matcher: Matcher) -> Self {
        self.text = Some(matcher);
        self
    }

    /// True when no field is constrained
    pub fn is_unconstrained(&self) -> bool {
        self.path.is_none() && self.css.is_none() && self.text.is_none()
    }

    pub fn matches(&self, event: &Event) -> bool {
        field_matches(&self.path, &event.path)
            && field_matches(&self.css, &event.css)
            && field_matches(&self.text, &event.text)
    }
}

/// `/products` covers `/products` and `/products/x`, not `/products-archive`
fn is_route_prefix(prefix: &str, value: &str) -> bool {
    match value.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

fn field_matches(matcher: &Option<Matcher>, value: &str) -> bool {
    matcher.as_ref().map_or(true, |m| m.is_match(value))
}

/// True when the event matches at least one of the matchers
pub fn matches_any(matchers: &[EventMatcher], event: &Event) -> bool {
    matchers.iter().any(|m| m.matches(event))
}
