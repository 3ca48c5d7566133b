// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution runtime for behavior-driven test runners.
//!
//! Takes pre-assembled [`Pickle`]s (compiled test cases of a
//! Gherkin-flavored frontend), a [`Library`] of step definitions and hooks,
//! and a run [`Config`], and drives everything to completion as an ordered
//! stream of lifecycle [`event`]s:
//!
//! ```rust
//! # use std::collections::HashMap;
//! #
//! # use futures::future::LocalBoxFuture;
//! # use brine::{
//! #     step::{Context, Pattern},
//! #     Config, Library, Parameters, Pickle, Verdict, World,
//! # };
//! #
//! #[derive(Debug, Default)]
//! struct Calculator(i64);
//!
//! impl World for Calculator {
//!     type Error = std::convert::Infallible;
//!
//!     async fn new(_: &Parameters) -> Result<Self, Self::Error> {
//!         Ok(Self::default())
//!     }
//! }
//!
//! fn add(w: &mut Calculator, ctx: Context) -> LocalBoxFuture<'_, Verdict> {
//!     Box::pin(async move {
//!         w.0 += ctx.captures[0].parse::<i64>().unwrap_or_default();
//!         Verdict::Passed
//!     })
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> brine::Result<()> {
//! let library =
//!     Library::new().step(Pattern::expression("I add {int}")?, add);
//! let pickles = vec![Pickle::new("pickle-1", "addition").step("I add 4")];
//!
//! let summary =
//!     brine::runtime::run(pickles, library, Config::default()).await?;
//! assert!(summary.success);
//! # Ok(())
//! # }
//! ```
//!
//! Step functions and hooks resolve into a [`Verdict`] instead of panicking
//! for control flow, though panics are caught and reported as failures too.

pub mod config;
pub mod error;
pub mod event;
mod future;
pub mod hook;
pub mod library;
pub mod pickle;
pub mod runtime;
pub mod step;
pub mod tagexpr;
pub mod testcase;
pub mod world;

pub use self::{
    config::{Config, RetryOptions},
    error::{Error, Result},
    event::{Event, Source},
    library::Library,
    pickle::{
        DataTable, DocString, Location, Pickle, PickleStep, StepArgument,
    },
    runtime::{Adapter, Parallel, Serial, Summary},
    tagexpr::TagExpr,
    testcase::{CaseId, TestCase},
    world::{Parameters, RunScope, World},
};

/// Way a step or hook function resolved, as reported by the function itself.
///
/// This is the sentinel a function returns on purpose. Failures are never
/// expressed this way: a function fails by panicking (usually through a
/// failed assertion) or by exceeding its timeout.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// Function completed successfully.
    Passed,

    /// Function asked to skip the rest of its test case.
    Skipped,

    /// Function declares its implementation unfinished.
    Pending,
}
