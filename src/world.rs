// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`World`] trait definition and run-wide support state.

use std::{collections::HashMap, fmt::Display, future::Future};

/// Free-form `key => value` options handed to the test suite by whoever
/// launches the run.
pub type Parameters = HashMap<String, String>;

/// Represents a shared user-defined state for a single test case attempt.
///
/// A fresh [`World`] is constructed for every attempt, including retry
/// attempts, so state never leaks between test cases or between attempts of
/// the same test case.
///
/// This crate doesn't provide out-of-box solution for managing state shared
/// across test cases, because we want some friction there to avoid tests
/// being dependent on each other. If your workflow needs a way to share state
/// between test cases (ex. database connection pool), we recommend using a
/// [`std::sync::LazyLock`] or organize it other way via shared state.
pub trait World: Sized + 'static {
    /// Error of creating a new [`World`] instance.
    type Error: Display;

    /// Creates a new [`World`] instance out of the run-wide [`Parameters`].
    fn new(
        params: &Parameters,
    ) -> impl Future<Output = Result<Self, Self::Error>>;
}

/// Worker-wide state handed to `BeforeAll`/`AfterAll` hooks.
///
/// Lives for the whole lifetime of a worker, across all its test cases.
#[derive(Clone, Debug, Default)]
pub struct RunScope {
    /// Run-wide [`Parameters`] the run was launched with.
    pub parameters: Parameters,
}

impl RunScope {
    /// Creates a new [`RunScope`] out of the given run-wide [`Parameters`].
    #[must_use]
    pub fn new(parameters: Parameters) -> Self {
        Self { parameters }
    }
}
