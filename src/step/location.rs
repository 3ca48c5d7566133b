//! Source location tracking for registered step and hook functions.

use derive_more::Display;

/// Location of a registered step or hook function in the source code of the
/// test suite.
///
/// Used to disambiguate conflicting registrations in error messages.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path to the file where the function is registered.
    pub path: &'static str,

    /// Line of the file where the function is registered.
    pub line: u32,

    /// Column of the file where the function is registered.
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`] with the given `path`, `line` and `column`.
    #[must_use]
    pub const fn new(path: &'static str, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }

    /// Creates a [`Location`] pointing at the caller of the function this is
    /// invoked from.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        Self { path: loc.file(), line: loc.line(), column: loc.column() }
    }
}
