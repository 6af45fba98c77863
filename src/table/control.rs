//! Input side of a live table.
//!
//! Opening a live table registers a session; the client posts [`TableCommand`]s against
//! its id and they are fed into that connection's [`super::live::live_pages`]. The session
//! is dropped together with the SSE stream.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_stream::stream;
use futures::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{PageNav, PageSize, live::TableEvent};
use crate::error::{AppError, AppResult};

const CHANNEL_CAPACITY: usize = 32;

/// One user edit of a live table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableCommand {
    /// Debounced before it reaches the grid.
    Filter { value: String },
    /// Same column flips direction.
    Sort { column: String },
    Navigate { to: PageNav },
    PageSize { size: PageSize },
}

struct Control {
    owner: Uuid,
    filters: mpsc::Sender<String>,
    commands: mpsc::Sender<TableEvent>,
}

type Sessions = Arc<Mutex<HashMap<Uuid, Control>>>;

#[derive(Clone, Default)]
pub struct TableControls {
    sessions: Sessions,
}

fn lock(sessions: &Sessions) -> MutexGuard<'_, HashMap<Uuid, Control>> {
    sessions
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TableControls {
    pub fn open(&self, owner: Uuid) -> TableInputs {
        let session = Uuid::new_v4();
        let (filter_tx, filter_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        lock(&self.sessions).insert(
            session,
            Control {
                owner,
                filters: filter_tx,
                commands: command_tx,
            },
        );
        tracing::debug!(%session, %owner, "table session opened");

        TableInputs {
            session,
            filters: filter_rx,
            commands: command_rx,
            guard: SessionGuard {
                session,
                sessions: self.sessions.clone(),
            },
        }
    }

    /// Unknown, closed, or someone else's session all read as not found.
    pub async fn send(&self, owner: Uuid, session: Uuid, command: TableCommand) -> AppResult<()> {
        let (filters, commands) = {
            let sessions = lock(&self.sessions);
            let control = sessions
                .get(&session)
                .filter(|control| control.owner == owner)
                .ok_or(AppError::NotFound)?;
            (control.filters.clone(), control.commands.clone())
        };

        let delivered = match command {
            TableCommand::Filter { value } => filters.send(value).await.is_ok(),
            TableCommand::Sort { column } => {
                commands.send(TableEvent::ToggleSort(column)).await.is_ok()
            }
            TableCommand::Navigate { to } => commands.send(TableEvent::Navigate(to)).await.is_ok(),
            TableCommand::PageSize { size } => {
                commands.send(TableEvent::PageSize(size)).await.is_ok()
            }
        };
        if !delivered {
            lock(&self.sessions).remove(&session);
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct SessionGuard {
    session: Uuid,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        lock(&self.sessions).remove(&self.session);
        tracing::debug!(session = %self.session, "table session closed");
    }
}

/// Receiving ends of one session.
pub struct TableInputs {
    session: Uuid,
    filters: mpsc::Receiver<String>,
    commands: mpsc::Receiver<TableEvent>,
    guard: SessionGuard,
}

impl TableInputs {
    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Raw filter text and the other grid events. The session lives as long as the
    /// filter stream.
    pub fn into_streams(
        self,
    ) -> (
        impl Stream<Item = String> + Send + 'static,
        impl Stream<Item = TableEvent> + Send + 'static,
    ) {
        let TableInputs {
            mut filters,
            mut commands,
            guard,
            ..
        } = self;
        let filters = stream! {
            let _guard = guard;
            while let Some(filter) = filters.recv().await {
                yield filter;
            }
        };
        let commands = stream! {
            while let Some(command) = commands.recv().await {
                yield command;
            }
        };
        (filters, commands)
    }
}
