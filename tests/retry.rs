use std::{
    convert::Infallible,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use futures::{future::LocalBoxFuture, StreamExt as _};

use brine::{
    event::{Case, Run, Status},
    runtime,
    step::Context,
    Config, Library, Parameters, Pickle, Verdict,
};

#[derive(Debug)]
struct World {
    /// Ordinal of this [`World`] instance, to observe reconstruction between
    /// attempts.
    generation: usize,
}

static GENERATION: AtomicUsize = AtomicUsize::new(0);

impl brine::World for World {
    type Error = Infallible;

    async fn new(_: &Parameters) -> Result<Self, Self::Error> {
        Ok(Self { generation: GENERATION.fetch_add(1, Ordering::SeqCst) })
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

fn case_finishes(events: &[Run<World>]) -> Vec<(Status, bool)> {
    events
        .iter()
        .filter_map(|ev| match ev {
            Run::Case(_, retryable) => match &retryable.event {
                Case::Finished { status, will_be_retried } => {
                    Some((*status, *will_be_retried))
                }
                _ => None,
            },
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn failed_case_is_retried_against_a_fresh_world() {
    static FIRST_SEEN: AtomicUsize = AtomicUsize::new(usize::MAX);

    fn flaky(w: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async move {
            let first = FIRST_SEEN
                .compare_exchange(
                    usize::MAX,
                    w.generation,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok();
            if first {
                panic!("first attempt always fails");
            }
            assert_ne!(
                w.generation,
                FIRST_SEEN.load(Ordering::SeqCst),
                "retry reused the same world instance",
            );
            Verdict::Passed
        })
    }

    let library = Library::new().step("flaky step", flaky);
    let pickles = vec![Pickle::new("p1", "flaky").step("flaky step")];
    let config = Config { retry: Some(1), ..Config::default() };

    let events = collect(pickles, library, config).await;

    assert_eq!(
        case_finishes(&events),
        vec![(Status::Failed, true), (Status::Passed, false)],
    );
    assert!(matches!(events.last(), Some(Run::Finished { success: true, .. })));
}

#[tokio::test]
async fn exhausted_retries_leave_the_case_failed() {
    fn hopeless(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { panic!("never passes") })
    }

    let library = Library::new().step("hopeless step", hopeless);
    let pickles = vec![Pickle::new("p1", "hopeless").step("hopeless step")];
    let config = Config { retry: Some(2), ..Config::default() };

    let events = collect(pickles, library, config).await;

    assert_eq!(
        case_finishes(&events),
        vec![
            (Status::Failed, true),
            (Status::Failed, true),
            (Status::Failed, false),
        ],
    );
    assert!(matches!(
        events.last(),
        Some(Run::Finished { success: false, .. }),
    ));
}

#[tokio::test]
async fn undefined_case_is_not_retried() {
    let library = Library::new();
    let pickles = vec![Pickle::new("p1", "undefined").step("mystery step")];
    let config = Config { retry: Some(3), ..Config::default() };

    let events = collect(pickles, library, config).await;

    assert_eq!(case_finishes(&events), vec![(Status::Undefined, false)]);
}

#[tokio::test]
async fn retry_tag_overrides_the_configured_count() {
    fn hopeless(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { panic!("never passes") })
    }

    let library = Library::new().step("hopeless step", hopeless);
    let pickles = vec![Pickle::new("p1", "tagged")
        .tag("@retry(2)")
        .step("hopeless step")];

    let events = collect(pickles, library, Config::default()).await;

    assert_eq!(case_finishes(&events).len(), 3);
}

#[tokio::test]
async fn retry_tag_filter_narrows_config_retries() {
    fn hopeless(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { panic!("never passes") })
    }

    let library = Library::new().step("hopeless step", hopeless);
    let pickles = vec![
        Pickle::new("p1", "flaky-tagged")
            .tag("@flaky")
            .step("hopeless step"),
        Pickle::new("p2", "untagged").step("hopeless step"),
    ];
    let config = Config {
        retry: Some(1),
        retry_tag_filter: Some("@flaky".parse().unwrap()),
        ..Config::default()
    };

    let events = collect(pickles, library, config).await;

    assert_eq!(
        case_finishes(&events),
        vec![
            (Status::Failed, true),
            (Status::Failed, false),
            (Status::Failed, false),
        ],
    );
}

#[tokio::test]
async fn retry_delay_is_respected() {
    fn hopeless(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { panic!("never passes") })
    }

    let library = Library::new().step("hopeless step", hopeless);
    let pickles = vec![Pickle::new("p1", "delayed").step("hopeless step")];
    let config = Config {
        retry: Some(1),
        retry_after: Some(Duration::from_millis(50)),
        ..Config::default()
    };

    let started = std::time::Instant::now();
    let events = collect(pickles, library, config).await;

    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(case_finishes(&events).len(), 2);
}
