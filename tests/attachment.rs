use std::convert::Infallible;

use futures::{future::LocalBoxFuture, StreamExt as _};

use brine::{
    event::{Case, Hook, HookKind, Run, Step, LOG_MEDIA_TYPE},
    hook::CaseContext,
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

#[tokio::test]
async fn step_attachments_precede_the_step_finish() {
    fn attaching(_: &mut World, ctx: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async move {
            ctx.log("first note");
            ctx.attach(vec![0x89, 0x50], "image/png");
            Verdict::Passed
        })
    }

    let library = Library::new().step("attaches things", attaching);
    let pickles = vec![Pickle::new("p1", "attaching").step("attaches things")];

    let events = collect(pickles, library, Config::default()).await;

    let step_events = events
        .iter()
        .filter_map(|ev| match ev {
            Run::Case(_, retryable) => match &retryable.event {
                Case::Step(_, ev) => Some(ev.clone()),
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>();
    assert!(matches!(step_events[0], Step::Started));
    match &step_events[1] {
        Step::Attachment(att) => {
            assert_eq!(att.media_type, LOG_MEDIA_TYPE);
            assert_eq!(att.body, b"first note");
        }
        other => panic!("expected a log attachment, got {other:?}"),
    }
    match &step_events[2] {
        Step::Attachment(att) => {
            assert_eq!(att.media_type, "image/png");
            assert_eq!(att.body, vec![0x89, 0x50]);
        }
        other => panic!("expected a binary attachment, got {other:?}"),
    }
    assert!(matches!(step_events[3], Step::Finished { .. }));
}

#[tokio::test]
async fn attachments_survive_a_panicking_step() {
    fn half_done(_: &mut World, ctx: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async move {
            ctx.log("made it this far");
            panic!("and no further");
        })
    }

    let library = Library::new().step("half done", half_done);
    let pickles = vec![Pickle::new("p1", "panicking").step("half done")];

    let events = collect(pickles, library, Config::default()).await;

    let attached = events.iter().any(|ev| {
        matches!(
            ev,
            Run::Case(_, retryable)
                if matches!(
                    &retryable.event,
                    Case::Step(_, Step::Attachment(att))
                        if att.body == b"made it this far",
                ),
        )
    });
    assert!(attached);
}

#[tokio::test]
async fn hook_attachments_are_reported_under_the_hook() {
    fn noting(_: &mut World, _: CaseContext) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async {
            brine::runtime::log("setting things up");
            Verdict::Passed
        })
    }
    fn passing(_: &mut World, _: Context) -> LocalBoxFuture<'_, Verdict> {
        Box::pin(async { Verdict::Passed })
    }

    let library =
        Library::new().before(noting).step("a step", passing);
    let pickles = vec![Pickle::new("p1", "hooked").step("a step")];

    let events = collect(pickles, library, Config::default()).await;

    let hook_attachment = events.iter().any(|ev| {
        matches!(
            ev,
            Run::Case(_, retryable)
                if matches!(
                    &retryable.event,
                    Case::Hook(HookKind::Before, Hook::Attachment(att))
                        if att.body == b"setting things up",
                ),
        )
    });
    assert!(hook_attachment);
}
