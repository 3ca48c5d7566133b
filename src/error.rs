// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fatal errors aborting a whole run.
//!
//! Non-fatal failures (panicking steps, timeouts, failed hooks) never surface
//! here: they are reported through the event stream and fold into the final
//! success flag instead.

use derive_more::{Display, From};

use crate::{step::PatternError, tagexpr::TagExprError};

/// Fatal error of a run.
#[derive(Debug, Display, derive_more::Error, From)]
pub enum Error {
    /// Constructing a [`World`] instance errored, so test cases cannot be
    /// driven at all.
    ///
    /// [`World`]: crate::World
    #[display("failed to construct a world instance: {_0}")]
    #[from(ignore)]
    WorldConstruction(#[error(not(source))] String),

    /// Invalid tag expression in the run configuration.
    #[display("invalid tag expression: {_0}")]
    TagExpr(TagExprError),

    /// Invalid step definition pattern.
    #[display("invalid step definition pattern: {_0}")]
    Pattern(PatternError),

    /// Failed to provision a worker thread or its async runtime.
    #[display("failed to provision a worker: {_0}")]
    WorkerSpawn(std::io::Error),
}

/// Alias for a [`Result`] with this crate's [`Error`].
///
/// [`Result`]: std::result::Result
pub type Result<T> = std::result::Result<T, Error>;
