//! Errors of matching a step against registered step definitions.

use std::fmt;

use derive_more::Error;

use super::location::Location;

/// Error of a step text matching multiple registered step definitions inside
/// a [`Collection`].
///
/// [`Collection`]: super::Collection
#[derive(Clone, Debug, Error)]
pub struct AmbiguousMatchError {
    /// Patterns of the step definitions the text matches, sorted by their
    /// registration-site form.
    pub possible_matches: Vec<(String, Option<Location>)>,
}

impl fmt::Display for AmbiguousMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "possible matches:")?;
        for (pattern, loc) in &self.possible_matches {
            write!(f, "\n{pattern}")?;
            if let Some(loc) = loc {
                write!(f, " --> {loc}")?;
            }
        }
        Ok(())
    }
}
