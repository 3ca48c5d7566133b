// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Single-threaded [`Adapter`] running every [`TestCase`] on the calling
//! thread.

use std::{sync::Arc, time::Instant};

use either::Either;
use futures::{
    channel::mpsc, future, stream, FutureExt as _, StreamExt as _,
};

use crate::{
    config::Config,
    event::{Event, Run, Source},
    future::FutureExt as _,
    library::Library,
    testcase::TestCase,
    world::World,
};

use super::{
    worker::{EventSink as _, Worker},
    Adapter, EventStream,
};

/// [`Adapter`] running [`TestCase`]s one after another on the thread polling
/// the returned stream.
///
/// Per-case events are strictly contiguous by construction: nothing else is
/// running.
#[derive(Debug)]
pub struct Serial<W> {
    library: Arc<Library<W>>,
    config: Arc<Config>,
}

impl<W> Serial<W> {
    /// Creates a new [`Serial`] adapter.
    #[must_use]
    pub fn new(library: Library<W>, config: Config) -> Self {
        Self { library: Arc::new(library), config: Arc::new(config) }
    }
}

impl<W: World> Adapter<W> for Serial<W> {
    type EventStream = EventStream<W>;

    fn run(self, cases: Vec<TestCase<W>>) -> Self::EventStream {
        let (sender, receiver) = mpsc::unbounded();
        let execute = execute(self.library, self.config, cases, sender);

        stream::select(
            receiver.map(Either::Left),
            execute.into_stream().map(Either::Right),
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

/// Runs every [`TestCase`] on a single [`Worker`], pushing the emitted events
/// into the given `sender`.
async fn execute<W: World>(
    library: Arc<Library<W>>,
    config: Arc<Config>,
    cases: Vec<TestCase<W>>,
    sender: mpsc::UnboundedSender<crate::Result<Event<Run<W>>>>,
) {
    let started_at = Instant::now();
    let mut worker = Worker::new(library, config, sender);

    worker.emit(Run::Started);
    worker.run_before_all().await;

    let mut fatal = false;
    for case in cases {
        let case = Source::new(case);
        // Yielding between cases lets the receiving end drain the emitted
        // events instead of buffering the whole run.
        match worker.run_case(&case, false).then_yield().await {
            Ok(_) => {}
            Err(e) => {
                worker.sink.send(Err(e));
                fatal = true;
                break;
            }
        }
    }

    worker.run_after_all().await;

    let success = !worker.failing && !fatal;
    worker.emit(Run::Finished { success, duration: started_at.elapsed() });
}
