// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Definitions for a [`Collection`] which is used to store [`Step`] [`Fn`]s
//! and the [`Pattern`]s they match step texts with.

pub mod collection;
pub mod context;
pub mod error;
pub mod location;
pub mod pattern;
pub mod regex;

pub use collection::{Collection, Entry};
pub use context::Context;
pub use error::AmbiguousMatchError;
pub use location::Location;
pub use pattern::{Pattern, PatternError};
pub use regex::HashableRegex;

use futures::future::LocalBoxFuture;

use crate::Verdict;

/// Alias for a step function executed against a [`PickleStep`], resolving
/// into a [`Verdict`].
///
/// [`PickleStep`]: crate::PickleStep
pub type Step<World> =
    for<'a> fn(&'a mut World, Context) -> LocalBoxFuture<'a, Verdict>;
