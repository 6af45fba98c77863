use std::time::Duration;

use futures::StreamExt;
use ladeno_storefront::{
    error::AppError,
    live::{self, Change, ChangeHub, Collection},
};
use uuid::Uuid;

async fn ticked(stream: &mut (impl futures::Stream<Item = ()> + Unpin)) -> bool {
    tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .is_ok_and(|tick| tick.is_some())
}

#[tokio::test(start_paused = true)]
async fn watch_ticks_once_up_front() {
    let hub = ChangeHub::default();
    let mut ticks = Box::pin(hub.watch(Collection::Carts, Some(Uuid::new_v4())));
    assert!(ticked(&mut ticks).await);
    assert!(!ticked(&mut ticks).await, "nothing published yet");
}

#[tokio::test(start_paused = true)]
async fn only_matching_changes_tick() {
    let hub = ChangeHub::default();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let mut ticks = Box::pin(hub.watch(Collection::Carts, Some(alice)));
    assert!(ticked(&mut ticks).await);

    hub.publish(Change::new(Collection::Carts, [bob]));
    hub.publish(Change::new(Collection::Orders, [alice]));
    assert!(!ticked(&mut ticks).await);

    hub.publish(Change::new(Collection::Carts, [alice]));
    assert!(ticked(&mut ticks).await);
}

#[tokio::test(start_paused = true)]
async fn everyone_changes_reach_every_owner() {
    let hub = ChangeHub::default();
    let mut mine = Box::pin(hub.watch(Collection::Products, Some(Uuid::new_v4())));
    let mut all = Box::pin(hub.watch(Collection::Products, None));
    assert!(ticked(&mut mine).await);
    assert!(ticked(&mut all).await);

    hub.publish(Change::everyone(Collection::Products));
    assert!(ticked(&mut mine).await);
    assert!(ticked(&mut all).await);
}

#[test]
fn unowned_watchers_see_owned_changes() {
    let change = Change::new(Collection::Orders, [Uuid::new_v4()]);
    assert!(change.concerns(Collection::Orders, None));
    assert!(!change.concerns(Collection::Orders, Some(Uuid::new_v4())));
    assert!(!change.concerns(Collection::Carts, None));
}

#[tokio::test]
async fn snapshots_skip_failed_reads() {
    let ticks = futures::stream::iter([(), (), ()]);
    let mut calls = 0;
    let snapshots = live::snapshots(ticks, || {
        calls += 1;
        let call = calls;
        async move {
            if call == 2 {
                Err(AppError::Internal(anyhow::anyhow!("read failed")))
            } else {
                Ok(call)
            }
        }
    });
    let seen: Vec<i32> = snapshots.collect().await;
    assert_eq!(seen, vec![1, 3]);
}

#[tokio::test]
async fn session_event_precedes_snapshots() -> anyhow::Result<()> {
    use axum::response::IntoResponse;

    let session = Uuid::new_v4();
    let response = live::sse_session(session, futures::stream::iter(vec![vec![1, 2], vec![3]]))
        .into_response();
    assert_eq!(
        response.headers()[axum::http::header::CONTENT_TYPE],
        "text/event-stream"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = String::from_utf8(body.to_vec())?;
    let expected = format!(
        "event: session\ndata: {session}\n\nevent: snapshot\ndata: [1,2]\n\nevent: snapshot\ndata: [3]\n\n"
    );
    assert_eq!(body, expected);
    Ok(())
}
