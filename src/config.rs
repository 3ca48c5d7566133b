// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Run [`Config`]uration and retry policy resolution.

use std::time::Duration;

use smart_default::SmartDefault;

use crate::{
    event::Retries,
    world::Parameters,
    tagexpr::TagExpr,
};

/// Configuration of a whole run.
///
/// Usable both programmatically and as a [`clap`] argument group embedded
/// into a test binary's CLI.
#[derive(Clone, Debug, SmartDefault, clap::Args)]
#[group(skip)]
pub struct Config {
    /// Resolve and report every test case without invoking any functions.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Stop scheduling new test cases after the first failure.
    #[arg(long, global = true, visible_alias = "ff")]
    pub fail_fast: bool,

    /// Treat pending and undefined test cases as failures.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Default timeout for a single step or hook invocation. Zero disables
    /// timeouts entirely.
    ///
    /// Duration is represented in a human-readable format like `12min5s`.
    /// Supported suffixes:
    /// - `nsec`, `ns` — nanoseconds.
    /// - `usec`, `us` — microseconds.
    /// - `msec`, `ms` — milliseconds.
    /// - `seconds`, `second`, `sec`, `s` - seconds.
    /// - `minutes`, `minute`, `min`, `m` - minutes.
    #[arg(
        long,
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "30s",
        verbatim_doc_comment,
        global = true,
    )]
    #[default(Duration::from_secs(30))]
    pub default_timeout: Duration,

    /// Number of times a test case will be retried in case of a failure.
    #[arg(long, value_name = "int", global = true)]
    pub retry: Option<usize>,

    /// Delay between each test case retry attempt.
    ///
    /// Duration is represented in a human-readable format like `12min5s`.
    #[arg(
        long,
        value_name = "duration",
        value_parser = humantime::parse_duration,
        global = true,
    )]
    pub retry_after: Option<Duration>,

    /// Tag expression to filter retried test cases.
    #[arg(long, value_name = "tagexpr", global = true)]
    pub retry_tag_filter: Option<TagExpr>,

    /// Number of workers to run test cases on. Absent or 1 runs everything
    /// serially on the calling thread.
    #[arg(long, short, value_name = "int", global = true)]
    pub workers: Option<usize>,

    /// Trim framework frames out of captured panic messages.
    #[arg(long, global = true)]
    pub filter_stacktraces: bool,

    /// Free-form `key=value` options handed to [`World`] constructors.
    ///
    /// [`World`]: crate::World
    #[arg(skip)]
    pub world_parameters: Parameters,
}

/// Options for retrying a [`TestCase`].
///
/// [`TestCase`]: crate::TestCase
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryOptions {
    /// Number of [`Retries`].
    pub retries: Retries,

    /// Delay before next retry attempt will be executed.
    pub after: Option<Duration>,
}

impl RetryOptions {
    /// Returns [`Some`], in case next retry attempt is available, or [`None`]
    /// otherwise.
    #[must_use]
    pub fn next_try(self) -> Option<Self> {
        self.retries
            .next_try()
            .map(|num| Self { retries: num, after: self.after })
    }

    /// Resolves [`RetryOptions`] out of a test case's `tags` and the run
    /// [`Config`].
    ///
    /// A `@retry` tag on the test case wins over the [`Config`], with the
    /// grammar `@retry`, `@retry(3)`, `@retry.after(5s)` or
    /// `@retry(3).after(5s)`. Without such a tag, the [`Config`]'s `retry`
    /// settings apply, narrowed by its `retry_tag_filter` if one is set.
    #[must_use]
    pub fn parse_from_tags(tags: &[String], config: &Config) -> Option<Self> {
        let tag_options = tags.iter().find_map(|tag| {
            let retries = tag.strip_prefix("@retry")?;
            let (num, rest) = retries
                .strip_prefix('(')
                .and_then(|s| {
                    let (num, rest) = s.split_once(')')?;
                    num.parse::<usize>().ok().map(|num| (Some(num), rest))
                })
                .unwrap_or((None, retries));

            let after = rest.strip_prefix(".after").and_then(|after| {
                let after = after.strip_prefix('(')?;
                let (dur, _) = after.split_once(')')?;
                humantime::parse_duration(dur).ok()
            });

            Some((num, after))
        });

        if let Some((tag_retries, tag_after)) = tag_options {
            Some(Self {
                retries: Retries::initial(
                    tag_retries.or(config.retry).unwrap_or(1),
                ),
                after: tag_after.or(config.retry_after),
            })
        } else {
            let config_wants_retry =
                config.retry_tag_filter.as_ref().map_or_else(
                    || config.retry.is_some() || config.retry_after.is_some(),
                    |expr| expr.eval(tags),
                );
            config_wants_retry.then(|| Self {
                retries: Retries::initial(config.retry.unwrap_or(1)),
                after: config.retry_after,
            })
        }
    }
}
