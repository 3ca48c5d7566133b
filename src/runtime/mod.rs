// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution of assembled [`TestCase`]s as an ordered stream of lifecycle
//! events.

pub mod attempt;
mod case;
pub mod parallel;
pub mod serial;
mod worker;

use std::time::Duration;

use futures::{stream::LocalBoxStream, Stream, StreamExt as _};

use crate::{
    config::Config,
    event::{Event, Run},
    library::Library,
    pickle::Pickle,
    testcase::{self, TestCase},
    world::World,
};

pub use self::{
    attempt::{attach, log},
    parallel::Parallel,
    serial::Serial,
};

/// Stream of lifecycle events produced by an [`Adapter`].
pub type EventStream<World> =
    LocalBoxStream<'static, crate::Result<Event<Run<World>>>>;

/// Strategy of driving assembled [`TestCase`]s to completion.
///
/// Implementors are expected to source the returned events in a
/// [happened-before] order:
/// - [`Run::Started`] strictly precedes everything else, and
///   [`Run::Finished`] strictly follows everything else;
/// - every event of a [`TestCase`] attempt happens after its
///   [`Case::Started`] and before its [`Case::Finished`];
/// - attempts of the same [`TestCase`] never interleave with each other.
///
/// [`Case::Finished`]: crate::event::Case::Finished
/// [`Case::Started`]: crate::event::Case::Started
/// [happened-before]: https://en.wikipedia.org/wiki/Happened-before
pub trait Adapter<World> {
    /// Output events [`Stream`].
    type EventStream: Stream<Item = crate::Result<Event<Run<World>>>>;

    /// Consumes the given [`TestCase`]s, producing their lifecycle events.
    fn run(self, cases: Vec<TestCase<World>>) -> Self::EventStream;
}

/// Final verdict of a whole run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Summary {
    /// Whether every [`TestCase`] finished with an acceptable [`Status`] and
    /// no worker-wide hook failed.
    ///
    /// [`Status`]: crate::event::Status
    /// [`TestCase`]: crate::TestCase
    pub success: bool,

    /// Wall-clock time of the whole run.
    pub duration: Duration,
}

/// Assembles the given [`Pickle`]s against the [`Library`] and runs them on
/// the [`Adapter`] the [`Config`] selects: [`Serial`] for a single worker,
/// [`Parallel`] otherwise.
pub fn events<W: World>(
    pickles: Vec<Pickle>,
    library: Library<W>,
    config: Config,
) -> EventStream<W> {
    let cases = testcase::assemble(pickles, &library, &config);
    match config.workers {
        Some(workers) if workers > 1 => {
            Parallel::new(library, config, workers).run(cases)
        }
        _ => Serial::new(library, config).run(cases),
    }
}

/// Runs the given [`Pickle`]s to completion, folding the whole event stream
/// into a single [`Summary`].
///
/// # Errors
///
/// If the run aborts fatally, e.g. on a [`World`] construction failure.
pub async fn run<W: World>(
    pickles: Vec<Pickle>,
    library: Library<W>,
    config: Config,
) -> crate::Result<Summary> {
    let mut stream = events(pickles, library, config);
    let mut summary = Summary { success: false, duration: Duration::ZERO };
    while let Some(ev) = stream.next().await {
        if let Run::Finished { success, duration } = ev?.into_inner() {
            summary = Summary { success, duration };
        }
    }
    Ok(summary)
}
