// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Key occurrences in a lifecycle of a run.
//!
//! The top-level enum here is [`Run`].
//!
//! Each event enum contains variants indicating what stage of execution an
//! [`Adapter`] is at, and variants with detailed content about the precise
//! sub-event.
//!
//! [`Adapter`]: crate::runtime::Adapter

pub mod case_events;
pub mod event_struct;
pub mod hook_events;
pub mod retries;
pub mod run_events;
pub mod source;
pub mod step_events;

pub use case_events::{Case, RetryableCase};
pub use event_struct::{coerce_into_info, info_message, Event, Info, Metadata};
pub use hook_events::{Hook, HookKind};
pub use retries::Retries;
pub use run_events::Run;
pub use source::Source;
pub use step_events::{Attachment, Status, Step, StepError, LOG_MEDIA_TYPE};
