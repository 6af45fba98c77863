use futures::StreamExt;
use ladeno_storefront::{
    error::AppError,
    table::{
        ColumnSpec, PageNav, PageSize, Record, TableState,
        control::{TableCommand, TableControls},
        live::{FILTER_DEBOUNCE, LiveTable, TableEvent, debounce, live_pages},
    },
};
use serde_json::{Value, json};
use tokio::{sync::mpsc, time::Instant};
use uuid::Uuid;

fn records(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .map(|value| value.as_object().cloned().expect("object record"))
        .collect()
}

fn catalog() -> Vec<Record> {
    records(vec![
        json!({ "name": "Running Shoe", "price": 30 }),
        json!({ "name": "Hat", "price": 10 }),
        json!({ "name": "Shoe Rack", "price": 20 }),
    ])
}

fn channel_stream(
    rx: mpsc::UnboundedReceiver<String>,
) -> impl futures::Stream<Item = String> {
    futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|v| (v, rx)) })
}

#[tokio::test(start_paused = true)]
async fn filter_edits_settle_before_emitting() {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut out = Box::pin(debounce(channel_stream(rx), FILTER_DEBOUNCE));

    let start = Instant::now();
    for edit in ["s", "sh", "sho", "shoe"] {
        tx.send(edit.to_string()).expect("send");
    }
    assert_eq!(out.next().await.as_deref(), Some("shoe"));
    assert!(start.elapsed() >= FILTER_DEBOUNCE);

    tx.send("hat".to_string()).expect("send");
    drop(tx);
    assert_eq!(out.next().await.as_deref(), Some("hat"));
    assert_eq!(out.next().await, None);
}

#[tokio::test(start_paused = true)]
async fn spaced_edits_each_emit() {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut out = Box::pin(debounce(channel_stream(rx), FILTER_DEBOUNCE));

    tx.send("a".to_string()).expect("send");
    assert_eq!(out.next().await.as_deref(), Some("a"));
    tx.send("b".to_string()).expect("send");
    assert_eq!(out.next().await.as_deref(), Some("b"));
}

#[test]
fn snapshot_keeps_sort_and_filter() {
    let mut table = LiveTable::new(ColumnSpec::open(), TableState::default());
    table.apply(TableEvent::Snapshot(catalog()));
    table.apply(TableEvent::ToggleSort("price".into()));
    table.apply(TableEvent::Filter("shoe".into()));

    let page = table.apply(TableEvent::Snapshot(records(vec![
        json!({ "name": "Trail Shoe", "price": 50 }),
        json!({ "name": "Running Shoe", "price": 30 }),
        json!({ "name": "Hat", "price": 10 }),
    ])));

    let names: Vec<&str> = page
        .rows
        .iter()
        .filter_map(|row| row["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Running Shoe", "Trail Shoe"]);
    assert_eq!(table.state().filter, "shoe");
}

#[test]
fn filter_change_returns_to_first_page() {
    let rows: Vec<Value> = (0..12).map(|i| json!({ "name": format!("shoe {i}") })).collect();
    let mut table = LiveTable::new(ColumnSpec::open(), TableState::default());
    table.apply(TableEvent::Snapshot(records(rows)));
    table.apply(TableEvent::PageSize(PageSize::try_from(5).expect("size")));

    let page = table.apply(TableEvent::Navigate(PageNav::Last));
    assert_eq!(page.page_index, 2);

    let page = table.apply(TableEvent::Filter("shoe 1".into()));
    assert_eq!(page.page_index, 0);
    assert_eq!(page.filtered_rows, 3);
}

#[test]
fn shrinking_snapshot_clamps_page() {
    let rows: Vec<Value> = (0..12).map(|i| json!({ "name": format!("row {i}") })).collect();
    let mut table = LiveTable::new(ColumnSpec::open(), TableState::default());
    table.apply(TableEvent::Snapshot(records(rows)));
    table.apply(TableEvent::Navigate(PageNav::Next));
    assert_eq!(table.state().page_index, 1);

    let page = table.apply(TableEvent::Snapshot(catalog()));
    assert_eq!(page.page_index, 0);
    assert_eq!(table.state().page_index, 0);
}

#[tokio::test(start_paused = true)]
async fn live_pages_follow_snapshots_then_filters() {
    let table = LiveTable::new(ColumnSpec::open(), TableState::default());
    let pages: Vec<_> = live_pages(
        table,
        futures::stream::iter(vec![catalog()]),
        futures::stream::iter(vec!["shoe".to_string()]),
        futures::stream::empty(),
    )
    .collect()
    .await;

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].filtered_rows, 3);
    assert_eq!(pages[1].filter, "shoe");
    assert_eq!(pages[1].filtered_rows, 2);
}

#[tokio::test(start_paused = true)]
async fn control_session_drives_live_pages() -> anyhow::Result<()> {
    let controls = TableControls::default();
    let owner = Uuid::new_v4();
    let inputs = controls.open(owner);
    let session = inputs.session();
    let (filters, commands) = inputs.into_streams();
    let snapshots = futures::stream::iter(vec![catalog()]).chain(futures::stream::pending());
    let mut pages = Box::pin(live_pages(
        LiveTable::new(ColumnSpec::open(), TableState::default()),
        snapshots,
        filters,
        commands,
    ));
    assert_eq!(pages.next().await.expect("snapshot page").filtered_rows, 3);

    let sort = TableCommand::Sort { column: "price".into() };
    controls.send(owner, session, sort).await?;
    let page = pages.next().await.expect("sorted page");
    let prices: Vec<i64> = page.rows.iter().filter_map(|row| row["price"].as_i64()).collect();
    assert_eq!(prices, vec![10, 20, 30]);

    let start = Instant::now();
    let filter = TableCommand::Filter { value: "shoe".into() };
    controls.send(owner, session, filter).await?;
    let page = pages.next().await.expect("filtered page");
    assert!(start.elapsed() >= FILTER_DEBOUNCE);
    assert_eq!(page.filtered_rows, 2);

    let stranger = controls
        .send(Uuid::new_v4(), session, TableCommand::Navigate { to: PageNav::Next })
        .await;
    assert!(matches!(stranger, Err(AppError::NotFound)));

    drop(pages);
    assert!(controls.is_empty());
    let closed = controls
        .send(owner, session, TableCommand::Navigate { to: PageNav::First })
        .await;
    assert!(matches!(closed, Err(AppError::NotFound)));
    Ok(())
}

#[test]
fn table_commands_parse_from_json() {
    let command: TableCommand =
        serde_json::from_value(json!({ "type": "page_size", "size": 20 })).expect("page size");
    assert_eq!(
        command,
        TableCommand::PageSize { size: PageSize::try_from(20).expect("size") }
    );

    let command: TableCommand =
        serde_json::from_value(json!({ "type": "navigate", "to": "last" })).expect("navigate");
    assert_eq!(command, TableCommand::Navigate { to: PageNav::Last });

    assert!(serde_json::from_value::<TableCommand>(json!({ "type": "page_size", "size": 7 })).is_err());
}
