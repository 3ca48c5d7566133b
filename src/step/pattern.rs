//! Step definition patterns and their compilation into [`Regex`]es.
//!
//! Three kinds of patterns may be registered:
//! - literal text, matched verbatim;
//! - a [`Regex`], implicitly anchored to the whole step text;
//! - a [Cucumber Expression], compiled via [`cucumber_expressions`].
//!
//! All three compile down to an anchored [`HashableRegex`], so matching and
//! capture extraction are uniform afterwards.
//!
//! [Cucumber Expression]: https://github.com/cucumber/cucumber-expressions#readme

use cucumber_expressions::Expression;
use derive_more::{Display, Error, From};
use regex::Regex;

use super::regex::HashableRegex;

/// Compiled pattern of a registered step definition.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Pattern {
    /// Pattern as it was written at the registration site.
    text: String,

    /// Anchored [`Regex`] this [`Pattern`] compiles to.
    regex: HashableRegex,
}

impl Pattern {
    /// Creates a [`Pattern`] matching the given `text` verbatim.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let regex = Regex::new(&format!("^{}$", regex::escape(&text)))
            .unwrap_or_else(|e| {
                // Escaped input cannot contain regex metacharacters.
                unreachable!("failed to compile escaped literal: {e}")
            });
        Self { text, regex: regex.into() }
    }

    /// Creates a [`Pattern`] out of the given regular expression, anchoring it
    /// to match the whole step text.
    ///
    /// # Errors
    ///
    /// If the given `pattern` is not a valid [`Regex`].
    pub fn regex(pattern: impl AsRef<str>) -> Result<Self, PatternError> {
        let pattern = pattern.as_ref();
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self { text: pattern.into(), regex: regex.into() })
    }

    /// Creates a [`Pattern`] out of the given [Cucumber Expression].
    ///
    /// # Errors
    ///
    /// If the given `expr` is not a valid [Cucumber Expression].
    ///
    /// [Cucumber Expression]: https://github.com/cucumber/cucumber-expressions#readme
    pub fn expression(expr: impl AsRef<str>) -> Result<Self, PatternError> {
        let expr = expr.as_ref();
        let regex = Expression::regex(expr)
            .map_err(|e| PatternError::Expression(e.to_string()))?;
        Ok(Self { text: expr.into(), regex: regex.into() })
    }

    /// Extracts capture groups out of the given step `text`, if this
    /// [`Pattern`] matches it.
    ///
    /// The returned values are the positional groups `1..`, without the whole
    /// match.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        self.regex.captures(text).map(|caps| {
            (1..caps.len())
                .map(|i| caps.get(i).map_or("", |m| m.as_str()).to_owned())
                .collect()
        })
    }

    /// Pattern as it was written at the registration site.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        let text = regex.as_str().to_owned();
        let anchored = Regex::new(&format!("^(?:{text})$")).unwrap_or_else(
            |e| unreachable!("failed to re-anchor a valid regex: {e}"),
        );
        Self { text, regex: anchored.into() }
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

/// Error of compiling a [`Pattern`] out of its registration-site form.
#[derive(Clone, Debug, Display, Error, From)]
pub enum PatternError {
    /// Invalid regular expression.
    #[display("invalid step definition regex: {_0}")]
    Regex(regex::Error),

    /// Invalid [Cucumber Expression].
    ///
    /// [Cucumber Expression]: https://github.com/cucumber/cucumber-expressions#readme
    #[display("invalid cucumber expression: {_0}")]
    #[from(ignore)]
    Expression(#[error(not(source))] String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_verbatim_only() {
        let pat = Pattern::literal("I have 5 (five) cucumbers");

        assert_eq!(pat.captures("I have 5 (five) cucumbers"), Some(vec![]));
        assert_eq!(pat.captures("I have 6 (five) cucumbers"), None);
    }

    #[test]
    fn regex_is_anchored_and_captures_groups() {
        let pat = Pattern::regex(r"I have (\d+) cucumbers").unwrap();

        assert_eq!(
            pat.captures("I have 5 cucumbers"),
            Some(vec!["5".to_owned()]),
        );
        assert_eq!(pat.captures("oh, I have 5 cucumbers"), None);
    }

    #[test]
    fn expression_captures_parameters() {
        let pat = Pattern::expression("I have {int} cucumbers").unwrap();

        assert_eq!(
            pat.captures("I have 42 cucumbers"),
            Some(vec!["42".to_owned()]),
        );
        assert_eq!(pat.captures("I have many cucumbers"), None);
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        assert!(matches!(
            Pattern::regex("(unclosed"),
            Err(PatternError::Regex(_)),
        ));
        assert!(matches!(
            Pattern::expression("I have {unbalanced cucumbers"),
            Err(PatternError::Expression(_)),
        ));
    }
}
