// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Multi-threaded [`Adapter`] distributing [`TestCase`]s over a pool of
//! worker threads.
//!
//! Each worker thread hosts its own single-threaded [`tokio`] runtime and its
//! own [`RunScope`], running `BeforeAll`/`AfterAll` once per worker. The
//! coordinator pull-dispatches [`TestCase`]s to whichever worker reports
//! itself idle, so a slow case never blocks the rest of the queue behind a
//! fixed pre-partitioning. Since a whole [`TestCase`] runs on one worker, its
//! events stay contiguous in that worker's emission order, and the streams of
//! different workers interleave at [`TestCase`] event granularity.
//!
//! [`RunScope`]: crate::RunScope

use std::{collections::VecDeque, sync::Arc, thread, time::Instant};

use either::Either;
use futures::{
    channel::mpsc, future, stream, FutureExt as _, StreamExt as _,
};

use crate::{
    config::Config,
    event::{Event, Run, Source},
    library::Library,
    testcase::TestCase,
    world::World,
    Error,
};

use super::{
    worker::{EventSink, Worker},
    Adapter, EventStream,
};

/// [`Adapter`] running [`TestCase`]s on `workers` dedicated threads.
#[derive(Debug)]
pub struct Parallel<W> {
    library: Arc<Library<W>>,
    config: Arc<Config>,
    workers: usize,
}

impl<W> Parallel<W> {
    /// Creates a new [`Parallel`] adapter with the given number of worker
    /// threads.
    #[must_use]
    pub fn new(library: Library<W>, config: Config, workers: usize) -> Self {
        Self {
            library: Arc::new(library),
            config: Arc::new(config),
            workers: workers.max(1),
        }
    }
}

/// Command dispatched to a single worker thread.
enum Command<W> {
    /// Run the given [`TestCase`].
    Run {
        /// [`TestCase`] to run.
        case: Source<TestCase<W>>,

        /// Whether fail-fast already kicked in, so the [`TestCase`] is only
        /// to be reported as skipped.
        pre_skipped: bool,
    },

    /// No more [`TestCase`]s: run `AfterAll` hooks and exit.
    Shutdown,
}

/// Message a worker thread reports back to the coordinator.
enum Report<W> {
    /// Worker finished its `BeforeAll` hooks and is ready for dispatch.
    Ready {
        /// Identifier of the reporting worker.
        worker: usize,
    },

    /// Lifecycle event (or fatal error) emitted by a worker.
    Emitted(crate::Result<Event<Run<W>>>),

    /// Worker finished a dispatched [`TestCase`] and is idle again.
    CaseFinished {
        /// Identifier of the reporting worker.
        worker: usize,

        /// Whether the [`TestCase`] finished with an unacceptable [`Status`].
        ///
        /// [`Status`]: crate::event::Status
        failing: bool,

        /// Whether the [`TestCase`] aborted the run entirely.
        fatal: bool,
    },

    /// Worker ran its `AfterAll` hooks and exited its loop.
    Done {
        /// Whether anything handled by the worker failed.
        failing: bool,
    },
}

/// [`EventSink`] forwarding a worker's events to the coordinator.
struct Forwarder<W>(mpsc::UnboundedSender<Report<W>>);

impl<W> EventSink<W> for Forwarder<W> {
    fn send(&self, ev: crate::Result<Event<Run<W>>>) {
        drop(self.0.unbounded_send(Report::Emitted(ev)));
    }
}

impl<W: World> Adapter<W> for Parallel<W> {
    type EventStream = EventStream<W>;

    fn run(self, cases: Vec<TestCase<W>>) -> Self::EventStream {
        let (report_tx, report_rx) = mpsc::unbounded();

        let mut command_txs = Vec::with_capacity(self.workers);
        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let (command_tx, command_rx) = mpsc::unbounded();
            match spawn_worker(
                id,
                Arc::clone(&self.library),
                Arc::clone(&self.config),
                command_rx,
                report_tx.clone(),
            ) {
                Ok(handle) => {
                    command_txs.push(command_tx);
                    handles.push(handle);
                }
                Err(e) => {
                    // Tell the already spawned workers to wind down before
                    // aborting the whole run.
                    for tx in &command_txs {
                        drop(tx.unbounded_send(Command::Shutdown));
                    }
                    for handle in handles {
                        drop(handle.join());
                    }
                    return stream::once(future::ready(Err(e))).boxed_local();
                }
            }
        }
        drop(report_tx);

        let (out_tx, out_rx) = mpsc::unbounded();
        let coordinate = coordinate(
            cases,
            command_txs,
            report_rx,
            handles,
            self.config.fail_fast,
            out_tx,
        );

        stream::select(
            out_rx.map(Either::Left),
            coordinate.into_stream().map(Either::Right),
        )
        .filter_map(|r| {
            future::ready(match r {
                Either::Left(ev) => Some(ev),
                Either::Right(()) => None,
            })
        })
        .boxed_local()
    }
}

/// Spawns a single worker thread hosting its own [`tokio`] runtime.
fn spawn_worker<W: World>(
    id: usize,
    library: Arc<Library<W>>,
    config: Arc<Config>,
    mut commands: mpsc::UnboundedReceiver<Command<W>>,
    reports: mpsc::UnboundedSender<Report<W>>,
) -> crate::Result<thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(Error::WorkerSpawn)?;

    thread::Builder::new()
        .name(format!("brine-worker-{id}"))
        .spawn(move || {
            runtime.block_on(async move {
                let strict = config.strict;
                let mut worker =
                    Worker::new(library, config, Forwarder(reports.clone()));

                worker.run_before_all().await;
                drop(reports.unbounded_send(Report::Ready { worker: id }));

                while let Some(command) = commands.next().await {
                    match command {
                        Command::Run { case, pre_skipped } => {
                            let (failing, fatal) = match worker
                                .run_case(&case, pre_skipped)
                                .await
                            {
                                Ok(status) => (!status.is_ok(strict), false),
                                Err(e) => {
                                    worker.sink.send(Err(e));
                                    (true, true)
                                }
                            };
                            drop(reports.unbounded_send(
                                Report::CaseFinished {
                                    worker: id,
                                    failing,
                                    fatal,
                                },
                            ));
                        }
                        Command::Shutdown => break,
                    }
                }

                worker.run_after_all().await;
                drop(reports.unbounded_send(Report::Done {
                    failing: worker.failing,
                }));
            });
        })
        .map_err(Error::WorkerSpawn)
}

/// Pull-dispatches [`TestCase`]s to idle workers, forwards their emitted
/// events into `out`, and finally joins the worker threads and emits the
/// closing [`Run::Finished`] event.
async fn coordinate<W: World>(
    cases: Vec<TestCase<W>>,
    command_txs: Vec<mpsc::UnboundedSender<Command<W>>>,
    mut reports: mpsc::UnboundedReceiver<Report<W>>,
    handles: Vec<thread::JoinHandle<()>>,
    fail_fast: bool,
    out: mpsc::UnboundedSender<crate::Result<Event<Run<W>>>>,
) {
    let started_at = Instant::now();
    drop(out.unbounded_send(Ok(Event::new(Run::Started))));

    let mut todo: VecDeque<_> = cases.into_iter().map(Source::new).collect();
    let mut failing = false;
    let mut fatal = false;
    let mut active = command_txs.len();
    let mut ready = Vec::with_capacity(command_txs.len());

    while active > 0 {
        let Some(report) = reports.next().await else {
            break;
        };
        match report {
            Report::Emitted(ev) => {
                drop(out.unbounded_send(ev));
            }
            Report::Ready { worker } => {
                // Nothing is dispatched until every worker has finished its
                // `BeforeAll` hooks, so no [`TestCase`] ever races a worker
                // that is still setting up shared resources.
                ready.push(worker);
                if ready.len() == command_txs.len() {
                    for worker in ready.drain(..) {
                        dispatch(
                            &mut todo,
                            &command_txs[worker],
                            fail_fast && failing,
                            fatal,
                        );
                    }
                }
            }
            Report::CaseFinished { worker, failing: case_failing, fatal: case_fatal } => {
                failing |= case_failing;
                fatal |= case_fatal;
                dispatch(
                    &mut todo,
                    &command_txs[worker],
                    fail_fast && failing,
                    fatal,
                );
            }
            Report::Done { failing: worker_failing } => {
                failing |= worker_failing;
                active -= 1;
            }
        }
    }

    // All workers reported `Done` at this point, so their threads are already
    // unwinding and the joins are near-instant.
    for handle in handles {
        drop(handle.join());
    }
    drop(out.unbounded_send(Ok(Event::new(Run::Finished {
        success: !failing && !fatal,
        duration: started_at.elapsed(),
    }))));
}

/// Hands an idle worker its next [`Command`].
fn dispatch<W>(
    todo: &mut VecDeque<Source<TestCase<W>>>,
    tx: &mpsc::UnboundedSender<Command<W>>,
    pre_skipped: bool,
    fatal: bool,
) {
    let next = if fatal { None } else { todo.pop_front() };
    let command = next
        .map_or(Command::Shutdown, |case| Command::Run { case, pre_skipped });
    drop(tx.unbounded_send(command));
}
