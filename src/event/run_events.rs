//! Top-level run lifecycle events.

use std::time::Duration;

use crate::TestCase;

use super::{
    case_events::{Case, RetryableCase},
    hook_events::{Hook, HookKind},
    retries::Retries,
    source::Source,
};

/// Top-level event of a whole run.
///
/// The very first event of any run is [`Run::Started`] and the very last one
/// is [`Run::Finished`]. Everything in between nests under the [`TestCase`]
/// (or worker-wide hook) it belongs to.
#[derive(Debug)]
pub enum Run<World> {
    /// Run execution being started.
    Started,

    /// [`Hook`] event of a worker-wide [`BeforeAll`] or [`AfterAll`] hook.
    ///
    /// With multiple workers these are emitted once per worker.
    ///
    /// [`AfterAll`]: HookKind::AfterAll
    /// [`BeforeAll`]: HookKind::BeforeAll
    Hook(HookKind, Hook),

    /// [`Case`] event of a particular [`TestCase`].
    Case(Source<TestCase<World>>, RetryableCase),

    /// Run execution being finished.
    Finished {
        /// Whether every [`TestCase`] of the run finished with an acceptable
        /// [`Status`] and no worker-wide hook failed.
        ///
        /// [`Status`]: super::Status
        success: bool,

        /// Wall-clock time of the whole run.
        duration: Duration,
    },
}

// Manual implementation is required to omit the redundant `World: Clone` trait
// bound imposed by `#[derive(Clone)]`.
impl<World> Clone for Run<World> {
    fn clone(&self) -> Self {
        match self {
            Self::Started => Self::Started,
            Self::Hook(kind, ev) => Self::Hook(*kind, ev.clone()),
            Self::Case(case, ev) => Self::Case(case.clone(), ev.clone()),
            Self::Finished { success, duration } => {
                Self::Finished { success: *success, duration: *duration }
            }
        }
    }
}

impl<World> Run<World> {
    /// Constructs an event of the given [`Case`] event happening to the given
    /// [`TestCase`].
    #[must_use]
    pub fn case(
        case: impl Into<Source<TestCase<World>>>,
        retries: Option<Retries>,
        event: Case,
    ) -> Self {
        Self::Case(case.into(), event.with_retries(retries))
    }
}
