use std::convert::Infallible;

use futures::{future::LocalBoxFuture, StreamExt as _};

use brine::{
    event::{Case, Run, Status, Step, StepError},
    runtime,
    step::{Context, Pattern},
    Config, Library, Parameters, Pickle, Verdict,
};

#[derive(Debug, Default)]
struct World(u64);

impl brine::World for World {
    type Error = Infallible;

    async fn new(_: &Parameters) -> Result<Self, Self::Error> {
        Ok(Self::default())
    }
}

fn passing(w: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
    Box::pin(async move {
        w.0 += 1;
        Verdict::Passed
    })
}

fn skipping(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
    Box::pin(async { Verdict::Skipped })
}

fn pending(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
    Box::pin(async { Verdict::Pending })
}

fn exploding(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
    Box::pin(async { panic!("boom") })
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
async fn brackets_the_run_with_started_and_finished() {
    let library = Library::new().step("a step", passing);
    let pickles = vec![Pickle::new("p1", "single").step("a step")];

    let events = collect(pickles, library, Config::default()).await;

    assert!(matches!(events.first(), Some(Run::Started)));
    assert!(matches!(events.last(), Some(Run::Finished { success: true, .. })));
}

#[tokio::test]
async fn emits_case_and_step_events_in_order() {
    let library = Library::new().step("a step", passing);
    let pickles = vec![Pickle::new("p1", "single").step("a step")];

    let events = collect(pickles, library, Config::default()).await;

    let case_events = events
        .iter()
        .filter_map(|ev| match ev {
            Run::Case(_, retryable) => Some(&retryable.event),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert!(matches!(case_events[0], Case::Started));
    assert!(matches!(case_events[1], Case::Step(_, Step::Started)));
    assert!(matches!(
        case_events[2],
        Case::Step(_, Step::Finished { status: Status::Passed, .. }),
    ));
    assert!(matches!(
        case_events[3],
        Case::Finished { status: Status::Passed, will_be_retried: false },
    ));
}

#[tokio::test]
async fn undefined_step_is_reported_as_undefined() {
    let library = Library::new().step("known step", passing);
    let pickles = vec![Pickle::new("p1", "unknown").step("mystery step")];

    let events = collect(pickles, library, Config::default()).await;

    let not_found = events.iter().any(|ev| {
        matches!(
            ev,
            Run::Case(_, retryable)
                if matches!(
                    &retryable.event,
                    Case::Step(_, Step::Finished {
                        status: Status::Undefined,
                        error: Some(StepError::NotFound),
                        ..
                    }),
                ),
        )
    });
    assert!(not_found);
    assert_eq!(case_finishes(&events), vec![(Status::Undefined, false)]);
}

#[tokio::test]
async fn ambiguous_step_lists_its_candidates() {
    let library = Library::new()
        .step(Pattern::regex("an? (.*)").unwrap(), passing)
        .step(Pattern::regex("a (.*)").unwrap(), passing);
    let pickles = vec![Pickle::new("p1", "ambiguous").step("a step")];

    let events = collect(pickles, library, Config::default()).await;

    let candidates = events.iter().find_map(|ev| match ev {
        Run::Case(_, retryable) => match &retryable.event {
            Case::Step(
                _,
                Step::Finished {
                    error: Some(StepError::Ambiguous(err)), ..
                },
            ) => Some(err.possible_matches.len()),
            _ => None,
        },
        _ => None,
    });
    assert_eq!(candidates, Some(2));
    assert_eq!(case_finishes(&events), vec![(Status::Ambiguous, false)]);
}

#[tokio::test]
async fn skipping_step_halts_the_remaining_ones() {
    let library = Library::new()
        .step("first", passing)
        .step("second", skipping)
        .step("third", passing);
    let pickles = vec![
        Pickle::new("p1", "halted").step("first").step("second").step("third"),
    ];

    let events = collect(pickles, library, Config::default()).await;

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
    assert_eq!(
        step_statuses,
        vec![Status::Passed, Status::Skipped, Status::Skipped],
    );
    assert_eq!(case_finishes(&events), vec![(Status::Skipped, false)]);
}

#[tokio::test]
async fn panicking_step_fails_the_case_but_not_the_following_one() {
    let library =
        Library::new().step("explodes", exploding).step("works", passing);
    let pickles = vec![
        Pickle::new("p1", "failing").step("explodes"),
        Pickle::new("p2", "passing").step("works"),
    ];

    let events = collect(pickles, library, Config::default()).await;

    assert_eq!(
        case_finishes(&events),
        vec![(Status::Failed, false), (Status::Passed, false)],
    );
    assert!(matches!(
        events.last(),
        Some(Run::Finished { success: false, .. }),
    ));
}

#[tokio::test]
async fn pending_is_acceptable_unless_strict() {
    let library = Library::new().step("unfinished", pending);
    let pickles = vec![Pickle::new("p1", "pending").step("unfinished")];

    let relaxed = collect(
        pickles.clone(),
        Library::new().step("unfinished", pending),
        Config::default(),
    )
    .await;
    assert!(matches!(
        relaxed.last(),
        Some(Run::Finished { success: true, .. }),
    ));

    let config = Config { strict: true, ..Config::default() };
    let strict = collect(pickles, library, config).await;
    assert_eq!(case_finishes(&strict), vec![(Status::Pending, false)]);
    assert!(matches!(
        strict.last(),
        Some(Run::Finished { success: false, .. }),
    ));
}

#[tokio::test]
async fn empty_case_passes() {
    let library = Library::new();
    let pickles = vec![Pickle::new("p1", "empty")];

    let events = collect(pickles, library, Config::default()).await;

    assert_eq!(case_finishes(&events), vec![(Status::Passed, false)]);
    assert!(matches!(events.last(), Some(Run::Finished { success: true, .. })));
}

#[tokio::test]
async fn captures_are_handed_to_the_step_function() {
    fn wants_four(w: &mut World, ctx: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async move {
            w.0 = ctx.captures[0].parse().unwrap();
            assert_eq!(w.0, 4);
            Verdict::Passed
        })
    }

    let library = Library::new()
        .step(Pattern::expression("I add {int}").unwrap(), wants_four);
    let pickles = vec![Pickle::new("p1", "capturing").step("I add 4")];

    let events = collect(pickles, library, Config::default()).await;

    assert_eq!(case_finishes(&events), vec![(Status::Passed, false)]);
}
