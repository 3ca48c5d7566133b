// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Hook registrations and their selection for a concrete test case.
//!
//! Hooks come in three shapes, each with its own function signature, so a
//! registration can never be invoked at the wrong lifecycle level:
//! - [`RunHook`]: worker-wide `BeforeAll`/`AfterAll`, sees the [`RunScope`]
//!   only;
//! - [`CaseHook`]: per-case `Before`/`After`, sees the [`World`];
//! - [`StepHook`]: per-step `BeforeStep`/`AfterStep`, sees the [`World`] and
//!   the step.
//!
//! [`World`]: crate::World

use std::time::Duration;

use futures::future::LocalBoxFuture;

use crate::{
    event::{Source, Status},
    pickle::{Pickle, PickleStep},
    tagexpr::TagExpr,
    world::RunScope,
    Verdict,
};

/// Alias for a worker-wide hook function.
pub type RunHookFn =
    for<'a> fn(&'a mut RunScope) -> LocalBoxFuture<'a, Verdict>;

/// Alias for a per-case hook function.
pub type CaseHookFn<World> =
    for<'a> fn(&'a mut World, CaseContext) -> LocalBoxFuture<'a, Verdict>;

/// Alias for a per-step hook function.
pub type StepHookFn<World> =
    for<'a> fn(&'a mut World, StepContext) -> LocalBoxFuture<'a, Verdict>;

/// Context handed to a [`CaseHook`] function.
#[derive(Clone, Debug)]
pub struct CaseContext {
    /// [`Pickle`] of the test case the hook runs around.
    pub pickle: Source<Pickle>,

    /// Folded [`Status`] of the attempt so far.
    ///
    /// [`None`] for `Before` hooks, [`Some`] for `After` ones.
    pub outcome: Option<Status>,
}

/// Context handed to a [`StepHook`] function.
#[derive(Clone, Debug)]
pub struct StepContext {
    /// [`Pickle`] of the test case the step belongs to.
    pub pickle: Source<Pickle>,

    /// [`PickleStep`] the hook runs around.
    pub step: Source<PickleStep>,
}

/// Worker-wide `BeforeAll`/`AfterAll` hook registration.
#[derive(Clone, Debug)]
pub struct RunHook {
    /// Function to invoke.
    pub func: RunHookFn,

    /// Per-hook timeout overriding the configured default one.
    pub timeout: Option<Duration>,
}

impl RunHook {
    /// Creates a new [`RunHook`] out of the given function.
    #[must_use]
    pub fn new(func: RunHookFn) -> Self {
        Self { func, timeout: None }
    }

    /// Sets a per-hook timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Per-case `Before`/`After` hook registration.
pub struct CaseHook<World> {
    /// Function to invoke.
    pub func: CaseHookFn<World>,

    /// [`TagExpr`] restricting which test cases this hook applies to.
    ///
    /// [`None`] applies to every test case.
    pub tags: Option<TagExpr>,

    /// Per-hook timeout overriding the configured default one.
    pub timeout: Option<Duration>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for CaseHook<World> {
    fn clone(&self) -> Self {
        Self {
            func: self.func,
            tags: self.tags.clone(),
            timeout: self.timeout,
        }
    }
}

impl<World> std::fmt::Debug for CaseHook<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseHook")
            .field("func", &format_args!("{:p}", self.func as *const ()))
            .field("tags", &self.tags)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<World> CaseHook<World> {
    /// Creates a new [`CaseHook`] out of the given function, applying to
    /// every test case.
    #[must_use]
    pub fn new(func: CaseHookFn<World>) -> Self {
        Self { func, tags: None, timeout: None }
    }

    /// Restricts this hook to test cases matching the given [`TagExpr`].
    #[must_use]
    pub fn with_tags(mut self, tags: TagExpr) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Sets a per-hook timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Per-step `BeforeStep`/`AfterStep` hook registration.
pub struct StepHook<World> {
    /// Function to invoke.
    pub func: StepHookFn<World>,

    /// [`TagExpr`] restricting which test cases this hook applies to.
    pub tags: Option<TagExpr>,

    /// Per-hook timeout overriding the configured default one.
    pub timeout: Option<Duration>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for StepHook<World> {
    fn clone(&self) -> Self {
        Self {
            func: self.func,
            tags: self.tags.clone(),
            timeout: self.timeout,
        }
    }
}

impl<World> std::fmt::Debug for StepHook<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepHook")
            .field("func", &format_args!("{:p}", self.func as *const ()))
            .field("tags", &self.tags)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<World> StepHook<World> {
    /// Creates a new [`StepHook`] out of the given function, applying to
    /// every test case.
    #[must_use]
    pub fn new(func: StepHookFn<World>) -> Self {
        Self { func, tags: None, timeout: None }
    }

    /// Restricts this hook to test cases matching the given [`TagExpr`].
    #[must_use]
    pub fn with_tags(mut self, tags: TagExpr) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Sets a per-hook timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Order the selected hooks are invoked in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Order {
    /// Registration order, used by `Before`-side hooks.
    Registration,

    /// Reverse registration order, used by `After`-side hooks, so setup and
    /// teardown nest.
    Reverse,
}

/// Hook registration that may carry a [`TagExpr`] restricting it to a subset
/// of test cases.
pub trait Selectable {
    /// [`TagExpr`] of this registration, if any.
    fn tag_filter(&self) -> Option<&TagExpr>;
}

impl<World> Selectable for CaseHook<World> {
    fn tag_filter(&self) -> Option<&TagExpr> {
        self.tags.as_ref()
    }
}

impl<World> Selectable for StepHook<World> {
    fn tag_filter(&self) -> Option<&TagExpr> {
        self.tags.as_ref()
    }
}

/// Selects the hooks applying to a test case with the given `tags`, in the
/// given invocation [`Order`].
pub fn select<'h, H: Selectable, S: AsRef<str>>(
    hooks: &'h [H],
    tags: &[S],
    order: Order,
) -> Vec<&'h H> {
    let mut selected = hooks
        .iter()
        .filter(|h| h.tag_filter().map_or(true, |expr| expr.eval(tags)))
        .collect::<Vec<_>>();
    if order == Order::Reverse {
        selected.reverse();
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestWorld;

    fn noop(
        _: &mut TestWorld,
        _: CaseContext,
    ) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { Verdict::Passed })
    }

    fn hooks() -> Vec<CaseHook<TestWorld>> {
        vec![
            CaseHook::new(noop),
            CaseHook::new(noop)
                .with_tags("@slow".parse().unwrap()),
            CaseHook::new(noop)
                .with_tags("not @slow".parse().unwrap()),
        ]
    }

    #[test]
    fn untagged_hook_applies_to_everything() {
        let hooks = hooks();

        let selected = select(&hooks, &["@fast"], Order::Registration);
        assert_eq!(selected.len(), 2);

        let selected = select(&hooks, &["@slow"], Order::Registration);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn reverse_order_flips_selection() {
        let hooks = hooks();

        let forward = select(&hooks, &["@slow"], Order::Registration);
        let mut backward = select(&hooks, &["@slow"], Order::Reverse);
        backward.reverse();

        assert_eq!(
            forward.iter().map(|h| h.tags.clone()).collect::<Vec<_>>(),
            backward.iter().map(|h| h.tags.clone()).collect::<Vec<_>>(),
        );
    }
}
