//! [`Regex`] wrapper usable in ordered and hashed collections.

use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use derive_more::{Deref, Display, From};
use regex::Regex;

/// [`Regex`] wrapper implementing [`Eq`], [`Ord`] and [`Hash`] by comparing
/// the underlying pattern strings.
#[derive(Clone, Debug, Deref, Display, From)]
pub struct HashableRegex(Regex);

impl HashableRegex {
    /// Creates a new [`HashableRegex`] out of the given [`Regex`].
    #[must_use]
    pub fn new(regex: Regex) -> Self {
        Self(regex)
    }

    /// Returns the pattern of the underlying [`Regex`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Hash for HashableRegex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state);
    }
}

impl PartialEq for HashableRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for HashableRegex {}

impl PartialOrd for HashableRegex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HashableRegex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_str().cmp(other.0.as_str())
    }
}
