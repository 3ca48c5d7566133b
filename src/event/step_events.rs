//! Step-level events, statuses and errors.

use std::time::Duration;

use derive_more::{Display, Error};

use super::event_struct::{info_message, Info};

/// Media type of [`Attachment`]s produced by log calls inside step and hook
/// functions.
pub const LOG_MEDIA_TYPE: &str = "text/x.brine.log";

/// Outcome classification of a step, hook or whole test case.
///
/// Variants are ordered by severity: folding the statuses of a case's parts
/// with [`max`] yields the case status.
///
/// [`max`]: Ord::max
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub enum Status {
    /// Executed and completed normally.
    #[display("passed")]
    Passed,

    /// Deliberately not executed, or cut short by an upstream skip.
    #[display("skipped")]
    Skipped,

    /// Declared but not implemented yet.
    #[display("pending")]
    Pending,

    /// No registered step definition matched the step text.
    #[display("undefined")]
    Undefined,

    /// More than one registered step definition matched the step text.
    #[display("ambiguous")]
    Ambiguous,

    /// Executed and panicked, timed out, or otherwise errored.
    #[display("failed")]
    Failed,
}

impl Status {
    /// Indicates whether this [`Status`] represents a successful outcome under
    /// non-strict evaluation ([`Pending`] and [`Undefined`] are tolerated).
    ///
    /// [`Pending`]: Status::Pending
    /// [`Undefined`]: Status::Undefined
    #[must_use]
    pub const fn is_ok(self, strict: bool) -> bool {
        match self {
            Self::Passed | Self::Skipped => true,
            Self::Pending | Self::Undefined => !strict,
            Self::Ambiguous | Self::Failed => false,
        }
    }
}

/// Error of executing a step or hook function.
#[derive(Clone, Debug, Display, Error)]
pub enum StepError {
    /// Function didn't settle within its timeout.
    #[display("step exceeded its timeout of {_0:?}")]
    Timeout(#[error(not(source))] Duration),

    /// Function panicked.
    #[display("step panicked: {}", info_message(_0))]
    Panic(#[error(not(source))] Info),

    /// No registered step definition matched the step text.
    #[display("step doesn't match any function")]
    NotFound,

    /// Multiple registered step definitions matched the step text.
    #[display("step match is ambiguous: {_0}")]
    Ambiguous(crate::step::AmbiguousMatchError),

    /// Hook signalled [`Verdict::Pending`], which only step functions may do.
    ///
    /// [`Verdict::Pending`]: crate::Verdict::Pending
    #[display("hook returned a pending verdict")]
    PendingHook,
}

impl StepError {
    /// [`Status`] this error classifies its step as.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Timeout(_) | Self::Panic(_) | Self::PendingHook => {
                Status::Failed
            }
            Self::NotFound => Status::Undefined,
            Self::Ambiguous(_) => Status::Ambiguous,
        }
    }
}

/// User-supplied artifact captured during a step or hook execution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    /// Raw content of this [`Attachment`].
    pub body: Vec<u8>,

    /// Media type of the [`body`].
    ///
    /// [`body`]: Attachment::body
    pub media_type: String,
}

impl Attachment {
    /// Creates a new [`Attachment`] out of the given `body` and `media_type`.
    #[must_use]
    pub fn new(body: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self { body: body.into(), media_type: media_type.into() }
    }

    /// Creates a log-line [`Attachment`] with the [`LOG_MEDIA_TYPE`].
    #[must_use]
    pub fn log(text: impl Into<String>) -> Self {
        Self {
            body: text.into().into_bytes(),
            media_type: LOG_MEDIA_TYPE.into(),
        }
    }
}

/// Event specific to a particular step of a test case.
#[derive(Clone, Debug)]
pub enum Step {
    /// Step execution being started.
    Started,

    /// [`Attachment`] captured while the step was running.
    Attachment(Attachment),

    /// Step execution being finished.
    Finished {
        /// [`Status`] the step finished with.
        status: Status,

        /// Wall-clock time the step function ran for.
        ///
        /// [`Duration::ZERO`] for steps that were never invoked.
        duration: Duration,

        /// Error details, for non-passed statuses that carry any.
        error: Option<StepError>,
    },
}

impl Step {
    /// Constructs an event of a passed step.
    #[must_use]
    pub const fn passed(duration: Duration) -> Self {
        Self::Finished { status: Status::Passed, duration, error: None }
    }

    /// Constructs an event of a step that was never invoked.
    #[must_use]
    pub const fn skipped() -> Self {
        Self::Finished {
            status: Status::Skipped,
            duration: Duration::ZERO,
            error: None,
        }
    }

    /// Constructs an event of a failed step with the given `error`.
    #[must_use]
    pub fn errored(duration: Duration, error: StepError) -> Self {
        Self::Finished { status: error.status(), duration, error: Some(error) }
    }
}
