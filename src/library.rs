// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Library`] of the support code a run executes against: step definitions
//! and hooks.

use std::time::Duration;

use crate::{
    hook::{CaseHook, CaseHookFn, RunHook, RunHookFn, StepHook, StepHookFn},
    step::{self, Location, Pattern},
};

/// All the support code registered for a run: step definitions plus the six
/// hook phases.
///
/// Built up front and immutable afterwards, so it can be shared between
/// workers.
pub struct Library<World> {
    /// Registered step definitions.
    pub steps: step::Collection<World>,

    /// Worker-wide hooks executed before any test case.
    pub before_all: Vec<RunHook>,

    /// Worker-wide hooks executed after all test cases.
    pub after_all: Vec<RunHook>,

    /// Per-case hooks executed before a test case's steps.
    pub before: Vec<CaseHook<World>>,

    /// Per-case hooks executed after a test case's steps.
    pub after: Vec<CaseHook<World>>,

    /// Per-step hooks executed before every step.
    pub before_step: Vec<StepHook<World>>,

    /// Per-step hooks executed after every step.
    pub after_step: Vec<StepHook<World>>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for Library<World> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
            before_all: self.before_all.clone(),
            after_all: self.after_all.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
            before_step: self.before_step.clone(),
            after_step: self.after_step.clone(),
        }
    }
}

// Implemented manually to omit redundant `World: Default` trait bound, imposed
// by `#[derive(Default)]`.
impl<World> Default for Library<World> {
    fn default() -> Self {
        Self {
            steps: step::Collection::new(),
            before_all: Vec::new(),
            after_all: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            before_step: Vec::new(),
            after_step: Vec::new(),
        }
    }
}

impl<World> std::fmt::Debug for Library<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("steps", &self.steps)
            .field("before_all", &self.before_all.len())
            .field("after_all", &self.after_all.len())
            .field("before", &self.before)
            .field("after", &self.after)
            .field("before_step", &self.before_step)
            .field("after_step", &self.after_step)
            .finish()
    }
}

impl<World> Library<World> {
    /// Creates a new empty [`Library`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a step definition matching the given [`Pattern`].
    #[must_use]
    #[track_caller]
    pub fn step(
        mut self,
        pattern: impl Into<Pattern>,
        func: step::Step<World>,
    ) -> Self {
        self.steps = self.steps.with(step::Entry {
            pattern: pattern.into(),
            loc: Some(Location::caller()),
            timeout: None,
            func,
        });
        self
    }

    /// Registers a step definition with a per-definition timeout overriding
    /// the configured default one.
    #[must_use]
    #[track_caller]
    pub fn step_with_timeout(
        mut self,
        pattern: impl Into<Pattern>,
        timeout: Duration,
        func: step::Step<World>,
    ) -> Self {
        self.steps = self.steps.with(step::Entry {
            pattern: pattern.into(),
            loc: Some(Location::caller()),
            timeout: Some(timeout),
            func,
        });
        self
    }

    /// Registers a hook, executed once per worker before any of its test
    /// cases.
    #[must_use]
    pub fn before_all(mut self, func: RunHookFn) -> Self {
        self.before_all.push(RunHook::new(func));
        self
    }

    /// Registers a hook, executed once per worker after all its test cases,
    /// even if earlier hooks or test cases failed.
    #[must_use]
    pub fn after_all(mut self, func: RunHookFn) -> Self {
        self.after_all.push(RunHook::new(func));
        self
    }

    /// Registers a hook, executed on each test case before running its steps.
    #[must_use]
    pub fn before(mut self, func: CaseHookFn<World>) -> Self {
        self.before.push(CaseHook::new(func));
        self
    }

    /// Registers a [`CaseHook`] with explicit options, executed on each
    /// matching test case before running its steps.
    #[must_use]
    pub fn before_hook(mut self, hook: CaseHook<World>) -> Self {
        self.before.push(hook);
        self
    }

    /// Registers a hook, executed on each test case after running its steps,
    /// even after skipped or failed ones.
    #[must_use]
    pub fn after(mut self, func: CaseHookFn<World>) -> Self {
        self.after.push(CaseHook::new(func));
        self
    }

    /// Registers a [`CaseHook`] with explicit options, executed on each
    /// matching test case after running its steps.
    #[must_use]
    pub fn after_hook(mut self, hook: CaseHook<World>) -> Self {
        self.after.push(hook);
        self
    }

    /// Registers a hook, executed on each step before the step function.
    #[must_use]
    pub fn before_step(mut self, func: StepHookFn<World>) -> Self {
        self.before_step.push(StepHook::new(func));
        self
    }

    /// Registers a [`StepHook`] with explicit options, executed on each step
    /// of every matching test case before the step function.
    #[must_use]
    pub fn before_step_hook(mut self, hook: StepHook<World>) -> Self {
        self.before_step.push(hook);
        self
    }

    /// Registers a hook, executed on each step after the step function.
    #[must_use]
    pub fn after_step(mut self, func: StepHookFn<World>) -> Self {
        self.after_step.push(StepHook::new(func));
        self
    }

    /// Registers a [`StepHook`] with explicit options, executed on each step
    /// of every matching test case after the step function.
    #[must_use]
    pub fn after_step_hook(mut self, hook: StepHook<World>) -> Self {
        self.after_step.push(hook);
        self
    }
}
