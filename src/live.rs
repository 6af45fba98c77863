//! Live subscriptions.
//!
//! Every write publishes a [`Change`] on the hub. A subscriber turns matching changes
//! into re-reads and pushes the full result set as an SSE `snapshot` event; the newest
//! snapshot always wins, so a lagging receiver simply re-reads.

use std::{convert::Infallible, future::Future};

use async_stream::stream;
use axum::response::{
    Sse,
    sse::{Event, KeepAlive},
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Products,
    Carts,
    Orders,
    Users,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub collection: Collection,
    /// Users whose view of the collection changed. Empty means everyone.
    pub owners: Vec<Uuid>,
}

impl Change {
    pub fn new(collection: Collection, owners: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            collection,
            owners: owners.into_iter().collect(),
        }
    }

    pub fn everyone(collection: Collection) -> Self {
        Self {
            collection,
            owners: Vec::new(),
        }
    }

    pub fn concerns(&self, collection: Collection, owner: Option<Uuid>) -> bool {
        if self.collection != collection {
            return false;
        }
        match owner {
            None => true,
            Some(owner) => self.owners.is_empty() || self.owners.contains(&owner),
        }
    }
}

#[derive(Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<Change>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, change: Change) {
        let collection = change.collection;
        // No receivers is the normal idle case.
        let receivers = self.sender.send(change).unwrap_or(0);
        tracing::trace!(?collection, receivers, "change published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.sender.subscribe()
    }

    /// One tick right away, then one per matching change (or lag) until the hub closes.
    pub fn watch(
        &self,
        collection: Collection,
        owner: Option<Uuid>,
    ) -> impl Stream<Item = ()> + use<> {
        let mut receiver = self.subscribe();
        stream! {
            yield ();
            loop {
                match receiver.recv().await {
                    Ok(change) if change.concerns(collection, owner) => {
                        yield ();
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(?collection, skipped, "subscriber lagged; re-reading");
                        yield ();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Re-reads on every tick. A failed read is logged and the previous snapshot stands.
pub fn snapshots<T, F, Fut>(ticks: impl Stream<Item = ()>, mut fetch: F) -> impl Stream<Item = T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    stream! {
        let mut ticks = std::pin::pin!(ticks);
        while ticks.next().await.is_some() {
            match fetch().await {
                Ok(snapshot) => {
                    yield snapshot;
                }
                Err(err) => tracing::warn!(error = %err, "snapshot read failed"),
            }
        }
    }
}

fn snapshot_event<T: Serialize>(snapshot: T) -> Result<Event, Infallible> {
    let event = Event::default().event("snapshot");
    Ok(match event.json_data(&snapshot) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "snapshot serialization failed");
            Event::default().event("error").data("snapshot serialization failed")
        }
    })
}

pub fn sse_snapshots<T, S>(snapshots: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize + 'static,
    S: Stream<Item = T> + Send + 'static,
{
    Sse::new(snapshots.map(snapshot_event)).keep_alive(KeepAlive::default())
}

/// Like [`sse_snapshots`], preceded by a `session` event naming the control session.
pub fn sse_session<T, S>(
    session: Uuid,
    snapshots: S,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize + 'static,
    S: Stream<Item = T> + Send + 'static,
{
    let opened = Event::default().event("session").data(session.to_string());
    let events =
        futures::stream::once(async move { Ok(opened) }).chain(snapshots.map(snapshot_event));
    Sse::new(events).keep_alive(KeepAlive::default())
}
