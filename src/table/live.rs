//! A grid bound to a live snapshot feed.
//!
//! Snapshots replace the whole record set; filter edits are debounced before the grid
//! re-filters. Each applied event yields a fresh [`TablePage`].

use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};

use super::{ColumnSpec, PageNav, PageSize, Record, Table, TablePage, TableState};

pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub enum TableEvent {
    Snapshot(Vec<Record>),
    Filter(String),
    ToggleSort(String),
    Navigate(PageNav),
    PageSize(PageSize),
}

pub struct LiveTable {
    spec: ColumnSpec,
    table: Table,
    state: TableState,
}

impl LiveTable {
    pub fn new(spec: ColumnSpec, state: TableState) -> Self {
        Self {
            spec,
            table: Table::default(),
            state,
        }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn page(&self) -> TablePage {
        self.table.view(&self.state)
    }

    /// A new snapshot keeps sort and filter; the page index is clamped by the view.
    pub fn apply(&mut self, event: TableEvent) -> TablePage {
        match event {
            TableEvent::Snapshot(records) => {
                self.table = Table::new(records, &self.spec);
            }
            TableEvent::Filter(filter) => self.state.set_filter(filter),
            TableEvent::ToggleSort(key) => self.state.toggle_sort(&key),
            TableEvent::Navigate(nav) => {
                let page_count = self.page().page_count;
                self.state.navigate(nav, page_count);
            }
            TableEvent::PageSize(size) => self.state.set_page_size(size),
        }
        let page = self.page();
        self.state.page_index = page.page_index;
        page
    }
}

/// Emits an item only after `period` passes without a newer one. The last pending item
/// is flushed when the input ends.
pub fn debounce<S>(input: S, period: Duration) -> impl Stream<Item = S::Item>
where
    S: Stream,
{
    stream! {
        let mut input = std::pin::pin!(input);
        let mut pending = None;
        loop {
            let step = if pending.is_some() {
                tokio::select! {
                    next = input.next() => Step::Input(next),
                    _ = tokio::time::sleep(period) => Step::Quiet,
                }
            } else {
                Step::Input(input.next().await)
            };

            match step {
                Step::Input(Some(item)) => pending = Some(item),
                Step::Input(None) => {
                    if let Some(item) = pending.take() {
                        yield item;
                    }
                    break;
                }
                Step::Quiet => {
                    if let Some(item) = pending.take() {
                        yield item;
                    }
                }
            }
        }
    }
}

enum Step<T> {
    Input(Option<T>),
    Quiet,
}

/// Drives a [`LiveTable`] from a snapshot feed, a filter feed (debounced here) and the
/// remaining grid events.
pub fn live_pages<A, B, C>(
    mut table: LiveTable,
    snapshots: A,
    filters: B,
    commands: C,
) -> impl Stream<Item = TablePage>
where
    A: Stream<Item = Vec<Record>>,
    B: Stream<Item = String>,
    C: Stream<Item = TableEvent>,
{
    let events = futures::stream::select(
        futures::stream::select(
            snapshots.map(TableEvent::Snapshot),
            debounce(filters, FILTER_DEBOUNCE).map(TableEvent::Filter),
        ),
        commands,
    );
    events.map(move |event| table.apply(event))
}
