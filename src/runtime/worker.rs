// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution slot owning a [`RunScope`] and its worker-wide hooks.

use std::sync::Arc;

use futures::channel::mpsc;

use crate::{
    config::Config,
    event::{Event, Hook, HookKind, Run, Status},
    hook::RunHook,
    library::Library,
    world::{RunScope, World},
    Verdict,
};

use super::attempt::{self, Outcome};

/// Sink the lifecycle events of a [`Worker`] are pushed into.
pub(crate) trait EventSink<W> {
    /// Pushes a single event (or a fatal error) into this sink.
    fn send(&self, ev: crate::Result<Event<Run<W>>>);
}

impl<W> EventSink<W>
    for mpsc::UnboundedSender<crate::Result<Event<Run<W>>>>
{
    fn send(&self, ev: crate::Result<Event<Run<W>>>) {
        // If the receiver end is dropped, then no one listens for events
        // anymore and we can just stop emitting them.
        drop(self.unbounded_send(ev));
    }
}

/// Execution slot running [`TestCase`]s one at a time.
///
/// A [`Worker`] owns one [`RunScope`], runs the `BeforeAll` hooks against it
/// once before picking up any [`TestCase`], and the `AfterAll` hooks once
/// after the last one. A `BeforeAll` failure poisons the [`Worker`]: every
/// [`TestCase`] it's handed afterwards is reported as [`Status::Skipped`]
/// without being invoked.
///
/// [`TestCase`]: crate::TestCase
pub(crate) struct Worker<W, S> {
    /// Shared [`Library`] of step definitions and hooks.
    pub(crate) library: Arc<Library<W>>,

    /// Shared run [`Config`].
    pub(crate) config: Arc<Config>,

    /// Sink the emitted events are pushed into.
    pub(crate) sink: S,

    /// Worker-wide mutable state shared by `BeforeAll`/`AfterAll` hooks.
    pub(crate) scope: RunScope,

    /// Indicator whether a `BeforeAll` hook has failed on this [`Worker`].
    pub(crate) poisoned: bool,

    /// Indicator whether any [`TestCase`] (or worker-wide hook) handled by
    /// this [`Worker`] has finished with an unacceptable [`Status`].
    ///
    /// [`TestCase`]: crate::TestCase
    pub(crate) failing: bool,
}

impl<W: World, S: EventSink<W>> Worker<W, S> {
    /// Creates a new idle [`Worker`].
    pub(crate) fn new(
        library: Arc<Library<W>>,
        config: Arc<Config>,
        sink: S,
    ) -> Self {
        let scope = RunScope::new(config.world_parameters.clone());
        Self { library, config, sink, scope, poisoned: false, failing: false }
    }

    /// Emits a single [`Run`] event.
    pub(crate) fn emit(&self, ev: Run<W>) {
        self.sink.send(Ok(Event::new(ev)));
    }

    /// Runs every registered `BeforeAll` hook, in registration order.
    ///
    /// A failure poisons this [`Worker`] and skips the remaining `BeforeAll`
    /// hooks.
    pub(crate) async fn run_before_all(&mut self) {
        let hooks = self.library.before_all.clone();
        let mut hooks = hooks.iter();
        for hook in hooks.by_ref() {
            self.emit(Run::Hook(HookKind::BeforeAll, Hook::Started));
            if self.config.dry_run {
                self.emit(Run::Hook(HookKind::BeforeAll, Hook::skipped()));
                continue;
            }
            let outcome = self.invoke(hook).await;
            if self.conclude(HookKind::BeforeAll, outcome) {
                self.poisoned = true;
                self.failing = true;
                break;
            }
        }
        for _ in hooks {
            self.emit(Run::Hook(HookKind::BeforeAll, Hook::Started));
            self.emit(Run::Hook(HookKind::BeforeAll, Hook::skipped()));
        }
    }

    /// Runs every registered `AfterAll` hook, in reverse registration order.
    ///
    /// `AfterAll` hooks always run, poisoned [`Worker`] or not, so teardown
    /// gets its chance even after a broken setup.
    pub(crate) async fn run_after_all(&mut self) {
        let hooks = self.library.after_all.clone();
        for hook in hooks.iter().rev() {
            self.emit(Run::Hook(HookKind::AfterAll, Hook::Started));
            if self.config.dry_run {
                self.emit(Run::Hook(HookKind::AfterAll, Hook::skipped()));
                continue;
            }
            let outcome = self.invoke(hook).await;
            if self.conclude(HookKind::AfterAll, outcome) {
                self.failing = true;
            }
        }
    }

    /// Invokes a single worker-wide hook function against the [`RunScope`].
    async fn invoke(&mut self, hook: &RunHook) -> Outcome {
        let limit =
            attempt::limit_of(hook.timeout, self.config.default_timeout);
        let filter = self.config.filter_stacktraces;
        attempt::run_attempt((hook.func)(&mut self.scope), limit, filter)
            .await
    }

    /// Emits the events of a settled worker-wide hook [`Outcome`], returning
    /// whether the hook failed.
    fn conclude(&self, kind: HookKind, outcome: Outcome) -> bool {
        for att in outcome.attachments {
            self.emit(Run::Hook(kind, Hook::Attachment(att)));
        }
        match outcome.verdict {
            // `Verdict::Skipped` is a no-op at the worker level: there is no
            // test case to skip here.
            Ok(Verdict::Passed | Verdict::Skipped) => {
                self.emit(Run::Hook(kind, Hook::passed(outcome.duration)));
                false
            }
            Ok(Verdict::Pending) => {
                self.emit(Run::Hook(
                    kind,
                    Hook::errored(
                        outcome.duration,
                        crate::event::StepError::PendingHook,
                    ),
                ));
                true
            }
            Err(err) => {
                self.emit(Run::Hook(
                    kind,
                    Hook::errored(outcome.duration, err),
                ));
                true
            }
        }
    }

    /// Records the final [`Status`] of a handled [`TestCase`].
    ///
    /// [`TestCase`]: crate::TestCase
    pub(crate) fn record(&mut self, status: Status) {
        if !status.is_ok(self.config.strict) {
            self.failing = true;
        }
    }
}
