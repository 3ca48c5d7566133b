// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Flattened, example-expanded scenarios consumed by this crate.
//!
//! A [`Pickle`] is produced upstream by a feature-file parser and is read-only
//! here: this crate never decides *which* pickles to run, it only executes the
//! ordered sequence it is handed.

use derive_more::{Display, From};

/// A fully expanded, executable scenario: no outline placeholders remaining.
///
/// Immutable once produced. Executed independently of any other [`Pickle`]:
/// its outcome must never depend on other pickles' execution order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pickle {
    /// Unique identifier of this [`Pickle`], as assigned by the upstream
    /// parser.
    pub id: String,

    /// Human-readable name of this [`Pickle`].
    pub name: String,

    /// Tags attached to this [`Pickle`] (scenario tags plus inherited ones,
    /// already merged upstream).
    pub tags: Vec<String>,

    /// Ordered [`PickleStep`]s of this [`Pickle`].
    pub steps: Vec<PickleStep>,

    /// [`Location`] of this [`Pickle`] in its source file.
    pub location: Location,
}

impl Pickle {
    /// Creates a new [`Pickle`] with the given `id` and `name`, and no steps.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tags: Vec::new(),
            steps: Vec::new(),
            location: Location::default(),
        }
    }

    /// Appends a [`PickleStep`] with the given `text` to this [`Pickle`].
    #[must_use]
    pub fn step(mut self, text: impl Into<String>) -> Self {
        self.steps.push(PickleStep::new(text));
        self
    }

    /// Appends the given [`PickleStep`] to this [`Pickle`].
    #[must_use]
    pub fn step_with(mut self, step: PickleStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Attaches a tag to this [`Pickle`].
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Single step of a [`Pickle`]: text, an optional trailing [`StepArgument`]
/// and a source [`Location`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PickleStep {
    /// Text of this step, matched against registered step definitions.
    pub text: String,

    /// Optional trailing argument (data table or doc string).
    pub argument: Option<StepArgument>,

    /// [`Location`] of this step in its source file.
    pub location: Location,
}

impl PickleStep {
    /// Creates a new [`PickleStep`] with the given `text` and no argument.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            argument: None,
            location: Location::default(),
        }
    }

    /// Attaches the given [`StepArgument`] to this step.
    #[must_use]
    pub fn with_argument(mut self, argument: impl Into<StepArgument>) -> Self {
        self.argument = Some(argument.into());
        self
    }
}

/// Trailing argument of a [`PickleStep`], passed to the matched step function
/// after all positional captures.
#[derive(Clone, Debug, Eq, From, PartialEq)]
pub enum StepArgument {
    /// [`DataTable`] argument.
    Table(DataTable),

    /// [`DocString`] argument.
    DocString(DocString),
}

/// Tabular [`PickleStep`] argument.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DataTable {
    /// Rows of this table, each a list of cell values.
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Creates a new [`DataTable`] out of the given `rows`.
    #[must_use]
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }
}

impl<S: Into<String>, R: IntoIterator<Item = S>> FromIterator<R> for DataTable {
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        Self {
            rows: iter
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

/// Multi-line string [`PickleStep`] argument.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DocString {
    /// Content of this doc string.
    pub content: String,

    /// Optional media type hint of the [`content`].
    ///
    /// [`content`]: DocString::content
    pub media_type: Option<String>,
}

impl DocString {
    /// Creates a new [`DocString`] with the given `content` and no media type.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), media_type: None }
    }
}

/// Line-column position inside a source file.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
#[display("{line}:{column}")]
pub struct Location {
    /// Line number, 1-based.
    pub line: u32,

    /// Column number, 1-based.
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`] with the given `line` and `column`.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_pickle_with_steps_and_tags() {
        let pickle = Pickle::new("p-1", "eating cucumbers")
            .tag("@veggies")
            .step("I have 5 cucumbers")
            .step_with(
                PickleStep::new("the menu reads").with_argument(
                    DocString::new("cucumber salad"),
                ),
            );

        assert_eq!(pickle.id, "p-1");
        assert_eq!(pickle.tags, ["@veggies"]);
        assert_eq!(pickle.steps.len(), 2);
        assert!(pickle.steps[0].argument.is_none());
        assert!(matches!(
            pickle.steps[1].argument,
            Some(StepArgument::DocString(_)),
        ));
    }

    #[test]
    fn collects_data_table_from_rows() {
        let table: DataTable =
            [["name", "amount"], ["cucumber", "5"]].into_iter().collect();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], ["cucumber", "5"]);
    }

    #[test]
    fn location_displays_as_line_and_column() {
        assert_eq!(Location::new(3, 7).to_string(), "3:7");
    }
}
