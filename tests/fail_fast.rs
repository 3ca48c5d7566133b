use std::{
    convert::Infallible,
    sync::atomic::{AtomicUsize, Ordering},
};

use futures::{future::LocalBoxFuture, StreamExt as _};

use brine::{
    event::{Case, Run, Status, Step},
    runtime,
    step::Context,
    Config, Library, Parameters, Pickle, Verdict,
};

#[derive(Debug, Default)]
struct World;

impl brine::World for World {
    type Error = Infallible;

    async fn new(_: &Parameters) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}

async fn collect(
    pickles: Vec<Pickle>,
    library: Library<World>,
    config: Config,
) -> Vec<Run<World>> {
    runtime::events(pickles, library, config)
        .map(|ev| ev.unwrap().into_inner())
        .collect()
        .await
}

fn case_statuses(events: &[Run<World>]) -> Vec<Status> {
    events
        .iter()
        .filter_map(|ev| match ev {
            Run::Case(_, retryable) => match &retryable.event {
                Case::Finished { status, .. } => Some(*status),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn remaining_cases_are_reported_skipped_after_a_failure() {
    static INVOCATIONS: AtomicUsize = AtomicUsize::new(0);

    fn counting(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async {
            INVOCATIONS.fetch_add(1, Ordering::SeqCst);
            Verdict::Passed
        })
    }
    fn failing(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { panic!("first failure") })
    }

    let library = Library::new()
        .step("counting step", counting)
        .step("failing step", failing);
    let pickles = vec![
        Pickle::new("p1", "passes").step("counting step"),
        Pickle::new("p2", "fails").step("failing step"),
        Pickle::new("p3", "never runs").step("counting step"),
        Pickle::new("p4", "never runs either").step("counting step"),
    ];
    let config = Config { fail_fast: true, ..Config::default() };

    let events = collect(pickles, library, config).await;

    assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 1);
    assert_eq!(
        case_statuses(&events),
        vec![
            Status::Passed,
            Status::Failed,
            Status::Skipped,
            Status::Skipped,
        ],
    );
    assert!(matches!(
        events.last(),
        Some(Run::Finished { success: false, .. }),
    ));
}

#[tokio::test]
async fn pre_skipped_cases_suppress_step_classification() {
    fn failing(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { panic!("first failure") })
    }

    let library = Library::new().step("failing step", failing);
    let pickles = vec![
        Pickle::new("p1", "fails").step("failing step"),
        Pickle::new("p2", "unmatched").step("mystery step"),
    ];
    let config =
        Config { fail_fast: true, strict: true, ..Config::default() };

    let events = collect(pickles, library, config).await;

    // The second case never gets a chance to run, so its unmatched step is
    // reported skipped rather than undefined.
    let step_statuses = events
        .iter()
        .filter_map(|ev| match ev {
            Run::Case(_, retryable) => match &retryable.event {
                Case::Step(_, Step::Finished { status, .. }) => Some(*status),
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(step_statuses, vec![Status::Failed, Status::Skipped]);
    assert_eq!(
        case_statuses(&events),
        vec![Status::Failed, Status::Skipped],
    );
}

#[tokio::test]
async fn without_fail_fast_everything_still_runs() {
    fn passing(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { Verdict::Passed })
    }
    fn failing(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { panic!("still failing") })
    }

    let library = Library::new()
        .step("passing step", passing)
        .step("failing step", failing);
    let pickles = vec![
        Pickle::new("p1", "fails").step("failing step"),
        Pickle::new("p2", "passes").step("passing step"),
    ];

    let events = collect(pickles, library, Config::default()).await;

    assert_eq!(
        case_statuses(&events),
        vec![Status::Failed, Status::Passed],
    );
}

#[tokio::test]
async fn strict_mode_fail_fasts_on_pending() {
    static INVOCATIONS: AtomicUsize = AtomicUsize::new(0);

    fn counting(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async {
            INVOCATIONS.fetch_add(1, Ordering::SeqCst);
            Verdict::Passed
        })
    }
    fn pending(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { Verdict::Pending })
    }

    let library = Library::new()
        .step("pending step", pending)
        .step("counting step", counting);
    let pickles = vec![
        Pickle::new("p1", "pending").step("pending step"),
        Pickle::new("p2", "after pending").step("counting step"),
    ];
    let config =
        Config { fail_fast: true, strict: true, ..Config::default() };

    let events = collect(pickles, library, config).await;

    assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 0);
    assert_eq!(
        case_statuses(&events),
        vec![Status::Pending, Status::Skipped],
    );
}
