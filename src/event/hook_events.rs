//! Hook-related events and types.

use std::time::Duration;

use derive_more::Display;

use super::step_events::{Attachment, Status, StepError};

/// Kind of a hook executed around a worker, test case or step.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("{self:?}")]
pub enum HookKind {
    /// Executing once per worker, before any of its test cases.
    BeforeAll,

    /// Executing on each test case, before its steps.
    Before,

    /// Executing on each step, before the step function.
    BeforeStep,

    /// Executing on each step, after the step function.
    AfterStep,

    /// Executing on each test case, after its steps.
    After,

    /// Executing once per worker, after all of its test cases.
    AfterAll,
}

/// Event of running a single hook.
#[derive(Clone, Debug)]
pub enum Hook {
    /// Hook execution being started.
    Started,

    /// [`Attachment`] captured while the hook was running.
    Attachment(Attachment),

    /// Hook execution being finished.
    Finished {
        /// [`Status`] the hook finished with.
        status: Status,

        /// Wall-clock time the hook function ran for.
        duration: Duration,

        /// Error details of a failed hook.
        error: Option<StepError>,
    },
}

impl Hook {
    /// Constructs an event of a passed hook.
    #[must_use]
    pub const fn passed(duration: Duration) -> Self {
        Self::Finished { status: Status::Passed, duration, error: None }
    }

    /// Constructs an event of a hook that was selected but never invoked.
    #[must_use]
    pub const fn skipped() -> Self {
        Self::Finished {
            status: Status::Skipped,
            duration: Duration::ZERO,
            error: None,
        }
    }

    /// Constructs an event of a failed hook with the given `error`.
    #[must_use]
    pub fn errored(duration: Duration, error: StepError) -> Self {
        Self::Finished { status: Status::Failed, duration, error: Some(error) }
    }
}
