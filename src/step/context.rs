//! Execution context handed to step functions.

use crate::{
    event::{Attachment, Source},
    pickle::{DataTable, DocString, PickleStep, StepArgument},
    runtime::attempt,
};

/// Context for a [`Step`] function execution.
///
/// [`Step`]: super::Step
#[derive(Clone, Debug)]
pub struct Context {
    /// [`PickleStep`] matched to the [`Step`] function.
    ///
    /// [`Step`]: super::Step
    pub step: Source<PickleStep>,

    /// Values of the capture groups the step definition's pattern extracted
    /// out of the step text.
    pub captures: Vec<String>,
}

impl Context {
    /// [`DataTable`] argument of the step, if it carries one.
    #[must_use]
    pub fn table(&self) -> Option<&DataTable> {
        match self.step.argument.as_ref()? {
            StepArgument::Table(table) => Some(table),
            StepArgument::DocString(_) => None,
        }
    }

    /// [`DocString`] argument of the step, if it carries one.
    #[must_use]
    pub fn docstring(&self) -> Option<&DocString> {
        match self.step.argument.as_ref()? {
            StepArgument::DocString(doc) => Some(doc),
            StepArgument::Table(_) => None,
        }
    }

    /// Records an [`Attachment`] for the in-flight attempt.
    ///
    /// # Panics
    ///
    /// If called outside of a running step or hook function.
    pub fn attach(
        &self,
        body: impl Into<Vec<u8>>,
        media_type: impl Into<String>,
    ) {
        attempt::attach(Attachment::new(body, media_type));
    }

    /// Records a log-line [`Attachment`] for the in-flight attempt.
    ///
    /// # Panics
    ///
    /// If called outside of a running step or hook function.
    pub fn log(&self, text: impl Into<String>) {
        attempt::attach(Attachment::log(text));
    }
}
