// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Assembly of executable [`TestCase`]s out of [`Pickle`]s and a [`Library`].
//!
//! Matching happens once, up front, so every attempt of a test case sees the
//! same [`Resolution`]s and undefined or ambiguous steps are known before
//! anything runs.

use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::{Display, FromStr};

use crate::{
    config::{Config, RetryOptions},
    event::Source,
    library::Library,
    pickle::{Pickle, PickleStep},
    step,
};

/// ID of a [`TestCase`], uniquely identifying it within a process.
///
/// Stable across retry attempts of the same [`TestCase`].
#[derive(Clone, Copy, Debug, Display, Eq, FromStr, Hash, PartialEq)]
pub struct CaseId(pub u64);

impl CaseId {
    /// Creates a new unique [`CaseId`].
    pub fn new() -> Self {
        /// [`AtomicU64`] ID.
        static ID: AtomicU64 = AtomicU64::new(0);

        Self(ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of matching a single [`PickleStep`] against a [`Library`]'s step
/// definitions.
pub enum Resolution<World> {
    /// Exactly one step definition matched.
    Matched {
        /// Matched [`step::Entry`].
        entry: step::Entry<World>,

        /// Capture groups its pattern extracted out of the step text.
        captures: Vec<String>,
    },

    /// Multiple step definitions matched.
    Ambiguous(step::AmbiguousMatchError),

    /// No step definition matched.
    Undefined,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for Resolution<World> {
    fn clone(&self) -> Self {
        match self {
            Self::Matched { entry, captures } => Self::Matched {
                entry: entry.clone(),
                captures: captures.clone(),
            },
            Self::Ambiguous(err) => Self::Ambiguous(err.clone()),
            Self::Undefined => Self::Undefined,
        }
    }
}

impl<World> std::fmt::Debug for Resolution<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched { entry, captures } => f
                .debug_struct("Matched")
                .field("entry", entry)
                .field("captures", captures)
                .finish(),
            Self::Ambiguous(err) => {
                f.debug_tuple("Ambiguous").field(err).finish()
            }
            Self::Undefined => f.write_str("Undefined"),
        }
    }
}

/// Single step of a [`TestCase`]: the [`PickleStep`] plus its up-front
/// [`Resolution`].
pub struct ResolvedStep<World> {
    /// [`PickleStep`] as handed in by the upstream parser.
    pub step: Source<PickleStep>,

    /// [`Resolution`] the step matched to.
    pub resolution: Resolution<World>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for ResolvedStep<World> {
    fn clone(&self) -> Self {
        Self { step: self.step.clone(), resolution: self.resolution.clone() }
    }
}

impl<World> std::fmt::Debug for ResolvedStep<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedStep")
            .field("step", &self.step)
            .field("resolution", &self.resolution)
            .finish()
    }
}

/// Fully assembled, executable test case: a [`Pickle`] with every step
/// resolved and the retry policy decided.
pub struct TestCase<World> {
    /// Unique [`CaseId`] of this [`TestCase`].
    pub id: CaseId,

    /// [`Pickle`] this [`TestCase`] was assembled from.
    pub pickle: Source<Pickle>,

    /// [`ResolvedStep`]s of this [`TestCase`], in execution order.
    pub steps: Vec<ResolvedStep<World>>,

    /// Retry policy of this [`TestCase`], if it's retryable.
    pub retry: Option<RetryOptions>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for TestCase<World> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            pickle: self.pickle.clone(),
            steps: self.steps.clone(),
            retry: self.retry,
        }
    }
}

impl<World> std::fmt::Debug for TestCase<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("id", &self.id)
            .field("pickle", &self.pickle)
            .field("steps", &self.steps)
            .field("retry", &self.retry)
            .finish()
    }
}

impl<World> TestCase<World> {
    /// Assembles a [`TestCase`] out of a single [`Pickle`].
    #[must_use]
    pub fn assemble(
        pickle: Pickle,
        library: &Library<World>,
        config: &Config,
    ) -> Self {
        let retry = RetryOptions::parse_from_tags(&pickle.tags, config);
        let steps = pickle
            .steps
            .iter()
            .map(|step| {
                let resolution = match library.steps.find(&step.text) {
                    Ok(Some((entry, captures))) => Resolution::Matched {
                        entry: entry.clone(),
                        captures,
                    },
                    Ok(None) => Resolution::Undefined,
                    Err(ambiguous) => Resolution::Ambiguous(ambiguous),
                };
                ResolvedStep {
                    step: Source::new(step.clone()),
                    resolution,
                }
            })
            .collect();
        Self { id: CaseId::new(), pickle: Source::new(pickle), steps, retry }
    }
}

/// Assembles every [`Pickle`] into a [`TestCase`], preserving the input
/// order.
#[must_use]
pub fn assemble<World>(
    pickles: Vec<Pickle>,
    library: &Library<World>,
    config: &Config,
) -> Vec<TestCase<World>> {
    pickles
        .into_iter()
        .map(|pickle| TestCase::assemble(pickle, library, config))
        .collect()
}
