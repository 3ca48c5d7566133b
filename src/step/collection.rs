//! Storage and matching of registered step definitions.

use std::time::Duration;

use itertools::Itertools as _;

use super::{
    error::AmbiguousMatchError,
    location::Location,
    pattern::Pattern,
    Step,
};

/// Single registered step definition: a [`Pattern`] paired with the function
/// to invoke and its per-definition options.
pub struct Entry<World> {
    /// [`Pattern`] this definition matches step texts with.
    pub pattern: Pattern,

    /// [`Location`] of the registration site.
    pub loc: Option<Location>,

    /// Per-definition timeout overriding the configured default one.
    pub timeout: Option<Duration>,

    /// [`Step`] function to invoke.
    pub func: Step<World>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for Entry<World> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            loc: self.loc,
            timeout: self.timeout,
            func: self.func,
        }
    }
}

impl<World> std::fmt::Debug for Entry<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("pattern", &self.pattern)
            .field("loc", &self.loc)
            .field("timeout", &self.timeout)
            .field("func", &format_args!("{:p}", self.func as *const ()))
            .finish()
    }
}

/// Collection of registered step definitions.
///
/// Every step text has to match exactly 1 [`Entry`] to be executable.
pub struct Collection<World> {
    /// Registered [`Entry`]s, in registration order.
    entries: Vec<Entry<World>>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for Collection<World> {
    fn clone(&self) -> Self {
        Self { entries: self.entries.clone() }
    }
}

// Implemented manually to omit redundant `World: Default` trait bound, imposed
// by `#[derive(Default)]`.
impl<World> Default for Collection<World> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<World> std::fmt::Debug for Collection<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("entries", &self.entries).finish()
    }
}

impl<World> Collection<World> {
    /// Creates a new empty [`Collection`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the given [`Entry`] in this [`Collection`].
    #[must_use]
    pub fn with(mut self, entry: Entry<World>) -> Self {
        self.entries.push(entry);
        self
    }

    /// Number of registered [`Entry`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indicates whether this [`Collection`] has no [`Entry`]s at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the [`Entry`] matching the given step `text` along with the
    /// captured groups, if any matches.
    ///
    /// # Errors
    ///
    /// If the given `text` matches multiple [`Entry`]s.
    pub fn find(
        &self,
        text: &str,
    ) -> Result<Option<(&Entry<World>, Vec<String>)>, AmbiguousMatchError>
    {
        let mut matches = self
            .entries
            .iter()
            .filter_map(|entry| {
                entry.pattern.captures(text).map(|caps| (entry, caps))
            })
            .collect::<Vec<_>>();

        match matches.len() {
            0 => Ok(None),
            // Instead of `.unwrap()` to avoid documenting `# Panics`.
            1 => Ok(matches.pop()),
            _ => Err(AmbiguousMatchError {
                possible_matches: matches
                    .into_iter()
                    .map(|(entry, _)| {
                        (entry.pattern.as_str().to_owned(), entry.loc)
                    })
                    .sorted()
                    .collect(),
            }),
        }
    }
}
