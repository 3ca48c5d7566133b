use futures::{future::LocalBoxFuture, StreamExt as _};

use brine::{
    event::{Case, Run, Status},
    runtime,
    step::Context,
    Config, Error, Library, Parameters, Pickle, Verdict,
};

#[derive(Debug)]
struct Unbuildable;

impl brine::World for Unbuildable {
    type Error = String;

    async fn new(_: &Parameters) -> Result<Self, Self::Error> {
        Err("database is unreachable".to_owned())
    }
}

fn passing(_: &mut Unbuildable, _: Context) -> LocalBoxFuture<'_, Verdict> {
    Box::pin(async { Verdict::Passed })
}

#[tokio::test]
async fn construction_failure_aborts_the_run() {
    let library = Library::new().step("a step", passing);
    let pickles = vec![
        Pickle::new("p1", "first").step("a step"),
        Pickle::new("p2", "second").step("a step"),
    ];

    let res = runtime::run(pickles, library, Config::default()).await;

    match res {
        Err(Error::WorldConstruction(msg)) => {
            assert!(msg.contains("database is unreachable"));
        }
        other => panic!("expected `WorldConstruction` error, got {other:?}"),
    }
}

#[tokio::test]
async fn the_failing_case_is_still_reported_failed() {
    let library = Library::new().step("a step", passing);
    let pickles = vec![Pickle::new("p1", "first").step("a step")];

    let events: Vec<_> =
        runtime::events(pickles, library, Config::default())
            .collect()
            .await;

    let case_failed = events.iter().any(|ev| {
        matches!(
            ev,
            Ok(event) if matches!(
                event.as_ref(),
                Run::Case(_, retryable)
                    if matches!(
                        &retryable.event,
                        Case::Finished { status: Status::Failed, .. },
                    ),
            ),
        )
    });
    assert!(case_failed);
    assert!(events.iter().any(Result::is_err));
}
