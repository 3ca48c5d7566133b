//! Driving a single step or hook function invocation to settlement.
//!
//! An attempt settles exactly one way: normally (with a [`Verdict`]), by
//! panicking, or by exceeding its deadline. Panics are caught with
//! [`catch_unwind()`] and deadlines are enforced by racing the function
//! against [`tokio::time::timeout()`], so a hung function cannot stall the
//! whole run.
//!
//! [`catch_unwind()`]: std::panic::catch_unwind()

use std::{
    any::Any,
    cell::RefCell,
    future::Future,
    panic::AssertUnwindSafe,
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

use futures::FutureExt as _;

use crate::{
    event::{coerce_into_info, Attachment, Info, StepError},
    Verdict,
};

thread_local! {
    /// Attachment buffer of the attempt currently in flight on this thread.
    static CARRIER: RefCell<Option<Rc<RefCell<Vec<Attachment>>>>> =
        RefCell::new(None);
}

/// Records an [`Attachment`] for the attempt currently in flight on this
/// thread.
///
/// # Panics
///
/// If called outside of a running step or hook function.
pub fn attach(attachment: Attachment) {
    CARRIER.with(|slot| {
        let slot = slot.borrow();
        let Some(buffer) = slot.as_ref() else {
            panic!(
                "attachments can only be recorded inside a running step or \
                 hook function",
            );
        };
        buffer.borrow_mut().push(attachment);
    });
}

/// Records a log-line [`Attachment`] for the attempt currently in flight on
/// this thread.
///
/// # Panics
///
/// If called outside of a running step or hook function.
pub fn log(text: impl Into<String>) {
    attach(Attachment::log(text));
}

/// Resets the thread's [`CARRIER`] once an attempt settles, even if the
/// settling itself panics.
struct CarrierGuard;

impl CarrierGuard {
    /// Installs the given `buffer` as the thread's [`CARRIER`].
    fn install(buffer: &Rc<RefCell<Vec<Attachment>>>) -> Self {
        CARRIER.with(|slot| *slot.borrow_mut() = Some(Rc::clone(buffer)));
        Self
    }
}

impl Drop for CarrierGuard {
    fn drop(&mut self) {
        CARRIER.with(|slot| *slot.borrow_mut() = None);
    }
}

/// Settled result of one function attempt.
#[derive(Debug)]
pub(crate) struct Outcome {
    /// [`Verdict`] the function resolved into, or the [`StepError`] that cut
    /// it short.
    pub(crate) verdict: Result<Verdict, StepError>,

    /// Wall-clock time the function ran for.
    pub(crate) duration: Duration,

    /// [`Attachment`]s recorded while the function was running.
    ///
    /// Present even for timed-out attempts: whatever was buffered before the
    /// deadline survives.
    pub(crate) attachments: Vec<Attachment>,
}

/// Resolves the effective deadline of an attempt: a per-registration override
/// beats the configured default, and [`Duration::ZERO`] disables the deadline
/// entirely.
pub(crate) fn limit_of(
    specific: Option<Duration>,
    default: Duration,
) -> Option<Duration> {
    let limit = specific.unwrap_or(default);
    (limit != Duration::ZERO).then_some(limit)
}

/// Drives the given function future to settlement, catching panics and
/// enforcing the `limit` deadline.
///
/// The deadline relies on [`tokio::time`], so attempts with a `limit` must be
/// polled inside a [`tokio`] runtime.
pub(crate) async fn run_attempt<F>(
    fut: F,
    limit: Option<Duration>,
    filter_stacktraces: bool,
) -> Outcome
where
    F: Future<Output = Verdict>,
{
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let guard = CarrierGuard::install(&buffer);

    let started = Instant::now();
    let caught = AssertUnwindSafe(fut).catch_unwind();
    let verdict = match limit {
        Some(limit) => match tokio::time::timeout(limit, caught).await {
            Ok(settled) => settle(settled, filter_stacktraces),
            Err(_) => Err(StepError::Timeout(limit)),
        },
        None => settle(caught.await, filter_stacktraces),
    };
    let duration = started.elapsed();

    drop(guard);
    let attachments = std::mem::take(&mut *buffer.borrow_mut());
    Outcome { verdict, duration, attachments }
}

/// Maps a [`catch_unwind()`] result into an attempt verdict.
///
/// [`catch_unwind()`]: std::panic::catch_unwind()
fn settle(
    res: Result<Verdict, Box<dyn Any + Send>>,
    filter_stacktraces: bool,
) -> Result<Verdict, StepError> {
    match res {
        Ok(verdict) => Ok(verdict),
        Err(payload) => {
            let mut info = coerce_into_info(payload);
            if filter_stacktraces {
                info = without_stacktrace(&info);
            }
            Err(StepError::Panic(info))
        }
    }
}

/// Trims a captured backtrace out of a panic message, keeping the assertion
/// text itself.
fn without_stacktrace(info: &Info) -> Info {
    info.downcast_ref::<String>()
        .map(|msg| {
            let trimmed = msg
                .split("\nstack backtrace:")
                .next()
                .unwrap_or(msg)
                .trim_end();
            Arc::new(trimmed.to_owned()) as Info
        })
        .unwrap_or_else(|| Arc::clone(info))
}

#[cfg(test)]
mod tests {
    use crate::event::info_message;

    use super::*;

    #[tokio::test]
    async fn passes_through_normal_settlement() {
        let outcome =
            run_attempt(async { Verdict::Passed }, None, false).await;

        assert!(matches!(outcome.verdict, Ok(Verdict::Passed)));
        assert!(outcome.attachments.is_empty());
    }

    #[tokio::test]
    async fn catches_panics_as_errors() {
        let outcome = run_attempt(
            async { panic!("cucumber overflow") },
            None,
            false,
        )
        .await;

        match outcome.verdict {
            Err(StepError::Panic(info)) => {
                assert_eq!(info_message(&info), "cucumber overflow");
            }
            other => panic!("expected `Panic`, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn enforces_deadline() {
        let outcome = run_attempt(
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Verdict::Passed
            },
            Some(Duration::from_millis(20)),
            false,
        )
        .await;

        assert!(matches!(outcome.verdict, Err(StepError::Timeout(_))));
    }

    #[tokio::test]
    async fn keeps_attachments_buffered_before_deadline() {
        let outcome = run_attempt(
            async {
                attach(Attachment::log("before hanging"));
                tokio::time::sleep(Duration::from_secs(30)).await;
                Verdict::Passed
            },
            Some(Duration::from_millis(20)),
            false,
        )
        .await;

        assert!(matches!(outcome.verdict, Err(StepError::Timeout(_))));
        assert_eq!(outcome.attachments, vec![Attachment::log("before hanging")]);
    }

    #[tokio::test]
    async fn zero_limit_disables_deadline() {
        assert_eq!(limit_of(None, Duration::ZERO), None);
        assert_eq!(limit_of(Some(Duration::ZERO), Duration::from_secs(5)), None);
        assert_eq!(
            limit_of(Some(Duration::from_secs(1)), Duration::from_secs(5)),
            Some(Duration::from_secs(1)),
        );
        assert_eq!(
            limit_of(None, Duration::from_secs(5)),
            Some(Duration::from_secs(5)),
        );
    }

    #[test]
    #[should_panic(expected = "inside a running step or hook")]
    fn attaching_outside_an_attempt_panics() {
        attach(Attachment::log("nowhere to go"));
    }
}
