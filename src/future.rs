//! Cooperative yielding between [`TestCase`]s.
//!
//! The serial [`Adapter`] runs everything on one task, so without a yield
//! point after each [`TestCase`] the consumer of the event stream would only
//! get polled once the whole run is over. [`FutureExt::then_yield()`] is that
//! yield point.
//!
//! [`Adapter`]: crate::runtime::Adapter
//! [`TestCase`]: crate::TestCase

use std::{future::Future, pin::Pin, task};

use futures::{future::Then, FutureExt as _};
use pin_project::pin_project;

/// Wakes the current task and returns [`task::Poll::Pending`] once.
pub(crate) const fn yield_now() -> YieldNow {
    YieldNow(false)
}

/// [`Future`] returned by the [`yield_now()`] function.
#[derive(Clone, Copy, Debug)]
pub(crate) struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> task::Poll<Self::Output> {
        if self.0 {
            task::Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            task::Poll::Pending
        }
    }
}

/// Return type of a [`FutureExt::then_yield()`] method.
type ThenYield<F, O> = Then<F, YieldThenReturn<O>, fn(O) -> YieldThenReturn<O>>;

/// Extensions of a [`Future`], used inside this crate.
pub(crate) trait FutureExt: Future + Sized {
    /// Yields once after this [`Future`] resolves, letting sibling tasks
    /// (the event stream consumer, in particular) make progress in between.
    fn then_yield(self) -> ThenYield<Self, Self::Output> {
        self.then(YieldThenReturn::new)
    }
}

impl<T: Future> FutureExt for T {}

/// [`Future`] returning a [`task::Poll::Pending`] once, before returning a
/// contained value.
#[derive(Debug)]
#[pin_project]
pub(crate) struct YieldThenReturn<V> {
    /// Value to be returned.
    value: Option<V>,

    /// [`YieldNow`] [`Future`].
    r#yield: YieldNow,
}

impl<V> YieldThenReturn<V> {
    /// Creates a new [`YieldThenReturn`] [`Future`].
    const fn new(v: V) -> Self {
        Self {
            value: Some(v),
            r#yield: yield_now(),
        }
    }
}

impl<V> Future for YieldThenReturn<V> {
    type Output = V;

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> task::Poll<Self::Output> {
        let this = self.project();
        task::ready!(this.r#yield.poll_unpin(cx));
        this.value
            .take()
            .map_or(task::Poll::Pending, task::Poll::Ready)
    }
}
