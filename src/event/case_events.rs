//! Test-case-level events and retries.

use std::time::Duration;

use crate::PickleStep;

use super::{
    hook_events::{Hook, HookKind},
    retries::Retries,
    source::Source,
    step_events::{Status, Step, StepError},
};

/// Event specific to a particular [`TestCase`].
///
/// [`TestCase`]: crate::TestCase
#[derive(Clone, Debug)]
pub enum Case {
    /// [`TestCase`] execution being started.
    ///
    /// [`TestCase`]: crate::TestCase
    Started,

    /// [`Hook`] event of a [`Before`], [`BeforeStep`], [`AfterStep`] or
    /// [`After`] hook.
    ///
    /// [`After`]: HookKind::After
    /// [`AfterStep`]: HookKind::AfterStep
    /// [`Before`]: HookKind::Before
    /// [`BeforeStep`]: HookKind::BeforeStep
    Hook(HookKind, Hook),

    /// [`Step`] event.
    Step(Source<PickleStep>, Step),

    /// [`TestCase`] execution being finished.
    ///
    /// [`TestCase`]: crate::TestCase
    Finished {
        /// [`Status`] the whole attempt folded to.
        status: Status,

        /// Whether another attempt of this [`TestCase`] follows.
        ///
        /// [`TestCase`]: crate::TestCase
        will_be_retried: bool,
    },
}

impl Case {
    /// Constructs an event of a case hook being started.
    #[must_use]
    pub const fn hook_started(kind: HookKind) -> Self {
        Self::Hook(kind, Hook::Started)
    }

    /// Constructs an event of a passed case hook.
    #[must_use]
    pub const fn hook_passed(kind: HookKind, duration: Duration) -> Self {
        Self::Hook(kind, Hook::passed(duration))
    }

    /// Constructs an event of a case hook that was never invoked.
    #[must_use]
    pub const fn hook_skipped(kind: HookKind) -> Self {
        Self::Hook(kind, Hook::skipped())
    }

    /// Constructs an event of a failed case hook.
    #[must_use]
    pub fn hook_failed(
        kind: HookKind,
        duration: Duration,
        error: StepError,
    ) -> Self {
        Self::Hook(kind, Hook::errored(duration, error))
    }

    /// Constructs an event of a [`PickleStep`] being started.
    #[must_use]
    pub fn step_started(step: impl Into<Source<PickleStep>>) -> Self {
        Self::Step(step.into(), Step::Started)
    }

    /// Transforms this [`Case`] event into a [`RetryableCase`] event.
    #[must_use]
    pub const fn with_retries(self, retries: Option<Retries>) -> RetryableCase {
        RetryableCase { event: self, retries }
    }
}

/// [`Case`] event paired with the retry state of its attempt.
#[derive(Clone, Debug)]
pub struct RetryableCase {
    /// Happened [`Case`] event.
    pub event: Case,

    /// Number of [`Retries`], if the [`TestCase`] is retryable.
    ///
    /// [`TestCase`]: crate::TestCase
    pub retries: Option<Retries>,
}
