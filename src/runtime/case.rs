// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Running a single [`TestCase`] through its whole lifecycle.
//!
//! One attempt walks the case's `Before` hooks, its steps (each wrapped into
//! the selected `BeforeStep`/`AfterStep` hooks), and its `After` hooks,
//! folding every piece into a single [`Status`] by severity. A [`Failed`]
//! attempt of a retryable case is followed by another attempt against a
//! freshly constructed [`World`], until the retry budget is exhausted.
//!
//! [`Failed`]: Status::Failed

use std::{sync::Arc, time::Duration};

use crate::{
    config::RetryOptions,
    event::{Case, Hook, HookKind, Retries, Source, Status, Step, StepError},
    hook::{self, CaseContext, CaseHook, Order, StepContext, StepHook},
    step,
    testcase::{ResolvedStep, Resolution, TestCase},
    world::World,
    Error, Verdict,
};

use super::{
    attempt,
    worker::{EventSink, Worker},
};

/// Way a [`TestCase`] attempt is driven.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Drive {
    /// Functions are invoked for real.
    Invoke,

    /// Nothing is invoked, but every step is still resolved and reported, so
    /// undefined and ambiguous steps surface without running anything.
    DryRun,

    /// Nothing is invoked and every step is reported as skipped, without
    /// classification. Used once fail-fast kicked in, or on a poisoned
    /// [`Worker`].
    PreSkip,
}

/// What a settled hook did to the rest of the attempt.
enum HookEffect {
    /// Attempt proceeds.
    Proceed,

    /// Hook asked to skip the guarded scope.
    Skip,

    /// Hook failed, the guarded scope is skipped and the attempt is failing.
    Fail,
}

impl<W: World, S: EventSink<W>> Worker<W, S> {
    /// Runs the given [`TestCase`] to completion, retries included, and
    /// returns its final [`Status`].
    ///
    /// `pre_skipped` forces the [`Drive::PreSkip`] mode regardless of this
    /// [`Worker`]'s own state, which is how a coordinator propagates
    /// fail-fast across workers.
    ///
    /// # Errors
    ///
    /// If a [`World`] fails to construct. Such a failure is not attributable
    /// to any step and aborts the whole run.
    pub(crate) async fn run_case(
        &mut self,
        case: &Source<TestCase<W>>,
        pre_skipped: bool,
    ) -> crate::Result<Status> {
        let drive = if self.config.dry_run {
            Drive::DryRun
        } else if self.poisoned
            || pre_skipped
            || (self.failing && self.config.fail_fast)
        {
            Drive::PreSkip
        } else {
            Drive::Invoke
        };

        let mut retry = case.retry;
        loop {
            let retries = retry.map(|r| r.retries);
            let status = self.run_attempt_of(case, retries, drive).await?;

            // Only a `Failed` attempt consumes retry budget: undefined and
            // ambiguous steps won't resolve differently on a second try.
            let next = (drive == Drive::Invoke && status == Status::Failed)
                .then(|| retry.and_then(RetryOptions::next_try))
                .flatten();
            self.emit_case(
                case,
                retries,
                Case::Finished { status, will_be_retried: next.is_some() },
            );

            let Some(next) = next else {
                self.record(status);
                return Ok(status);
            };
            if let Some(after) = next.after {
                tokio::time::sleep(after).await;
            }
            retry = Some(next);
        }
    }

    /// Runs a single attempt of the given [`TestCase`], emitting every event
    /// of the attempt except the final [`Case::Finished`] one.
    ///
    /// The only exception is a [`World`] construction failure, which emits
    /// [`Case::Finished`] itself before erroring, so the emitted stream stays
    /// well-formed even when the run aborts.
    async fn run_attempt_of(
        &self,
        case: &Source<TestCase<W>>,
        retries: Option<Retries>,
        drive: Drive,
    ) -> crate::Result<Status> {
        self.emit_case(case, retries, Case::Started);

        let mut world = if drive == Drive::Invoke {
            match W::new(&self.config.world_parameters).await {
                Ok(world) => Some(world),
                Err(e) => {
                    self.emit_case(
                        case,
                        retries,
                        Case::Finished {
                            status: Status::Failed,
                            will_be_retried: false,
                        },
                    );
                    return Err(Error::WorldConstruction(e.to_string()));
                }
            }
        } else {
            None
        };

        let library = Arc::clone(&self.library);
        let tags = &case.pickle.tags;
        let mut severity = Status::Passed;

        // `Some` halts further invocations: `Skipped` after a skip, anything
        // worse after a failure.
        let mut halt: Option<Status> = None;

        for hook in
            hook::select(&library.before, tags, Order::Registration)
        {
            let effect = self
                .run_case_hook(
                    case,
                    retries,
                    HookKind::Before,
                    hook,
                    None,
                    drive == Drive::Invoke && halt.is_none(),
                    &mut world,
                )
                .await;
            match effect {
                HookEffect::Proceed => {}
                HookEffect::Skip => {
                    severity = severity.max(Status::Skipped);
                    halt = Some(Status::Skipped);
                }
                HookEffect::Fail => {
                    severity = Status::Failed;
                    halt = Some(Status::Failed);
                }
            }
        }

        // A `Before` hook that asked to skip suppresses the step events
        // entirely, while a failed one still reports each step as skipped.
        let suppress_steps =
            drive == Drive::Invoke && halt == Some(Status::Skipped);
        if !suppress_steps {
            for resolved in &case.steps {
                let step_status = self
                    .run_step(case, retries, resolved, drive, &mut halt,
                              &mut world)
                    .await;
                severity = severity.max(step_status);
            }
        }

        for hook in hook::select(&library.after, tags, Order::Reverse) {
            let effect = self
                .run_case_hook(
                    case,
                    retries,
                    HookKind::After,
                    hook,
                    Some(severity),
                    drive == Drive::Invoke,
                    &mut world,
                )
                .await;
            match effect {
                // `After` hooks can't skip anything anymore.
                HookEffect::Proceed | HookEffect::Skip => {}
                HookEffect::Fail => severity = Status::Failed,
            }
        }

        drop(world);
        Ok(severity)
    }

    /// Runs a single `Before`/`After` case hook, or reports it as skipped
    /// when `invoke` is unset.
    #[allow(clippy::too_many_arguments)]
    async fn run_case_hook(
        &self,
        case: &Source<TestCase<W>>,
        retries: Option<Retries>,
        kind: HookKind,
        hook: &CaseHook<W>,
        outcome_so_far: Option<Status>,
        invoke: bool,
        world: &mut Option<W>,
    ) -> HookEffect {
        self.emit_case(case, retries, Case::hook_started(kind));
        if !invoke {
            self.emit_case(case, retries, Case::hook_skipped(kind));
            return HookEffect::Proceed;
        }

        let Some(world) = world.as_mut() else {
            // `invoke` implies `Drive::Invoke`, and that mode always
            // constructs a `World` up-front.
            unreachable!("no `World` constructed for an invoked hook");
        };
        let ctx = CaseContext {
            pickle: case.pickle.clone(),
            outcome: outcome_so_far,
        };
        let limit =
            attempt::limit_of(hook.timeout, self.config.default_timeout);
        let outcome = attempt::run_attempt(
            (hook.func)(world, ctx),
            limit,
            self.config.filter_stacktraces,
        )
        .await;

        for att in outcome.attachments {
            self.emit_case(
                case,
                retries,
                Case::Hook(kind, Hook::Attachment(att)),
            );
        }
        match outcome.verdict {
            Ok(Verdict::Passed) => {
                self.emit_case(
                    case,
                    retries,
                    Case::hook_passed(kind, outcome.duration),
                );
                HookEffect::Proceed
            }
            Ok(Verdict::Skipped) => {
                self.emit_case(
                    case,
                    retries,
                    Case::Hook(
                        kind,
                        Hook::Finished {
                            status: Status::Skipped,
                            duration: outcome.duration,
                            error: None,
                        },
                    ),
                );
                HookEffect::Skip
            }
            Ok(Verdict::Pending) => {
                self.emit_case(
                    case,
                    retries,
                    Case::hook_failed(
                        kind,
                        outcome.duration,
                        StepError::PendingHook,
                    ),
                );
                HookEffect::Fail
            }
            Err(err) => {
                self.emit_case(
                    case,
                    retries,
                    Case::hook_failed(kind, outcome.duration, err),
                );
                HookEffect::Fail
            }
        }
    }

    /// Runs a single [`ResolvedStep`] with its `BeforeStep`/`AfterStep`
    /// hooks, returning the [`Status`] the step (and its hooks) folded to.
    async fn run_step(
        &self,
        case: &Source<TestCase<W>>,
        retries: Option<Retries>,
        resolved: &ResolvedStep<W>,
        drive: Drive,
        halt: &mut Option<Status>,
        world: &mut Option<W>,
    ) -> Status {
        let library = Arc::clone(&self.library);
        let tags = &case.pickle.tags;
        let step_src = &resolved.step;

        self.emit_case(case, retries, Case::step_started(step_src.clone()));

        let matched = matches!(resolved.resolution, Resolution::Matched { .. });
        let attempt_fn = drive == Drive::Invoke && halt.is_none() && matched;

        let mut fold = Status::Passed;
        let mut blocked = false;
        let mut hook_failed = false;
        for hook in
            hook::select(&library.before_step, tags, Order::Registration)
        {
            let effect = self
                .run_step_hook(
                    case,
                    retries,
                    HookKind::BeforeStep,
                    hook,
                    step_src,
                    attempt_fn && !blocked,
                    world,
                )
                .await;
            match effect {
                HookEffect::Proceed => {}
                HookEffect::Skip => blocked = true,
                HookEffect::Fail => {
                    blocked = true;
                    hook_failed = true;
                    fold = Status::Failed;
                }
            }
        }

        // Resolution is reported independently of whether anything still
        // runs: an undefined step stays undefined even after a failure or
        // under a dry run. A pre-skipped test case is the exception, its
        // steps are uniformly skipped without classification.
        let invoked = attempt_fn && !blocked;
        let step_status = match &resolved.resolution {
            _ if drive == Drive::PreSkip => {
                self.emit_step(case, retries, step_src, Step::skipped());
                Status::Skipped
            }
            Resolution::Undefined => {
                self.emit_step(
                    case,
                    retries,
                    step_src,
                    Step::errored(Duration::ZERO, StepError::NotFound),
                );
                Status::Undefined
            }
            Resolution::Ambiguous(err) => {
                self.emit_step(
                    case,
                    retries,
                    step_src,
                    Step::errored(
                        Duration::ZERO,
                        StepError::Ambiguous(err.clone()),
                    ),
                );
                Status::Ambiguous
            }
            Resolution::Matched { entry, captures } => {
                if invoked {
                    let Some(world) = world.as_mut() else {
                        unreachable!(
                            "no `World` constructed for an invoked step",
                        );
                    };
                    let ctx = step::Context {
                        step: step_src.clone(),
                        captures: captures.clone(),
                    };
                    let limit = attempt::limit_of(
                        entry.timeout,
                        self.config.default_timeout,
                    );
                    let outcome = attempt::run_attempt(
                        (entry.func)(world, ctx),
                        limit,
                        self.config.filter_stacktraces,
                    )
                    .await;

                    for att in outcome.attachments {
                        self.emit_step(
                            case,
                            retries,
                            step_src,
                            Step::Attachment(att),
                        );
                    }
                    match outcome.verdict {
                        Ok(Verdict::Passed) => {
                            self.emit_step(
                                case,
                                retries,
                                step_src,
                                Step::passed(outcome.duration),
                            );
                            Status::Passed
                        }
                        Ok(Verdict::Skipped) => {
                            self.emit_step(
                                case,
                                retries,
                                step_src,
                                Step::Finished {
                                    status: Status::Skipped,
                                    duration: outcome.duration,
                                    error: None,
                                },
                            );
                            Status::Skipped
                        }
                        Ok(Verdict::Pending) => {
                            self.emit_step(
                                case,
                                retries,
                                step_src,
                                Step::Finished {
                                    status: Status::Pending,
                                    duration: outcome.duration,
                                    error: None,
                                },
                            );
                            Status::Pending
                        }
                        Err(err) => {
                            let status = err.status();
                            self.emit_step(
                                case,
                                retries,
                                step_src,
                                Step::errored(outcome.duration, err),
                            );
                            status
                        }
                    }
                } else {
                    self.emit_step(case, retries, step_src, Step::skipped());
                    Status::Skipped
                }
            }
        };
        if halt.is_none() && step_status != Status::Passed {
            *halt = Some(step_status);
        }
        fold = fold.max(step_status);

        // A `BeforeStep` failure blocks its step, but the cleanup hooks of
        // that step still run. A step that was never going to be attempted
        // keeps its `AfterStep` hooks skipped as well.
        let cleanup = invoked || (attempt_fn && hook_failed);
        for hook in hook::select(&library.after_step, tags, Order::Reverse) {
            let effect = self
                .run_step_hook(
                    case,
                    retries,
                    HookKind::AfterStep,
                    hook,
                    step_src,
                    cleanup,
                    world,
                )
                .await;
            if matches!(effect, HookEffect::Fail) {
                fold = Status::Failed;
                *halt = Some(Status::Failed);
            }
        }

        fold
    }

    /// Runs a single `BeforeStep`/`AfterStep` hook, or reports it as skipped
    /// when `invoke` is unset.
    #[allow(clippy::too_many_arguments)]
    async fn run_step_hook(
        &self,
        case: &Source<TestCase<W>>,
        retries: Option<Retries>,
        kind: HookKind,
        hook: &StepHook<W>,
        step: &Source<crate::PickleStep>,
        invoke: bool,
        world: &mut Option<W>,
    ) -> HookEffect {
        self.emit_case(case, retries, Case::hook_started(kind));
        if !invoke {
            self.emit_case(case, retries, Case::hook_skipped(kind));
            return HookEffect::Proceed;
        }

        let Some(world) = world.as_mut() else {
            unreachable!("no `World` constructed for an invoked step hook");
        };
        let ctx = StepContext {
            pickle: case.pickle.clone(),
            step: step.clone(),
        };
        let limit =
            attempt::limit_of(hook.timeout, self.config.default_timeout);
        let outcome = attempt::run_attempt(
            (hook.func)(world, ctx),
            limit,
            self.config.filter_stacktraces,
        )
        .await;

        for att in outcome.attachments {
            self.emit_case(
                case,
                retries,
                Case::Hook(kind, Hook::Attachment(att)),
            );
        }
        match outcome.verdict {
            Ok(Verdict::Passed) => {
                self.emit_case(
                    case,
                    retries,
                    Case::hook_passed(kind, outcome.duration),
                );
                HookEffect::Proceed
            }
            Ok(Verdict::Skipped) => {
                self.emit_case(
                    case,
                    retries,
                    Case::Hook(
                        kind,
                        Hook::Finished {
                            status: Status::Skipped,
                            duration: outcome.duration,
                            error: None,
                        },
                    ),
                );
                HookEffect::Skip
            }
            Ok(Verdict::Pending) => {
                self.emit_case(
                    case,
                    retries,
                    Case::hook_failed(
                        kind,
                        outcome.duration,
                        StepError::PendingHook,
                    ),
                );
                HookEffect::Fail
            }
            Err(err) => {
                self.emit_case(
                    case,
                    retries,
                    Case::hook_failed(kind, outcome.duration, err),
                );
                HookEffect::Fail
            }
        }
    }

    /// Emits a [`Case`] event of the given [`TestCase`].
    fn emit_case(
        &self,
        case: &Source<TestCase<W>>,
        retries: Option<Retries>,
        event: Case,
    ) {
        use crate::event::Run;

        self.emit(Run::case(case.clone(), retries, event));
    }

    /// Emits a [`Step`] event of the given [`PickleStep`].
    ///
    /// [`PickleStep`]: crate::PickleStep
    fn emit_step(
        &self,
        case: &Source<TestCase<W>>,
        retries: Option<Retries>,
        step: &Source<crate::PickleStep>,
        event: Step,
    ) {
        self.emit_case(case, retries, Case::Step(step.clone(), event));
    }
}
