use ladeno_storefront::{
    response::Meta,
    routes::health::HealthData,
    table::{ColumnSpec, PageSize, Table, TableState},
};
use serde_json::json;

#[test]
fn health_is_ok_only_when_every_check_passes() {
    assert_eq!(HealthData::from_checks(true, true).status, "ok");
    assert_eq!(HealthData::from_checks(false, true).status, "degraded");

    let data = HealthData::from_checks(true, false);
    assert_eq!(data.status, "degraded");
    assert!(data.database);
    assert!(!data.storage);
}

#[test]
fn table_page_meta_is_one_based() {
    let records = (0..12)
        .map(|i| {
            json!({ "name": format!("item {i}") })
                .as_object()
                .cloned()
                .expect("object")
        })
        .collect();
    let state = TableState {
        page_index: 1,
        page_size: PageSize::try_from(5).expect("page size"),
        ..TableState::default()
    };
    let page = Table::new(records, &ColumnSpec::open()).view(&state);
    let meta = Meta::from(&page);

    assert_eq!(meta.page, Some(2));
    assert_eq!(meta.per_page, Some(5));
    assert_eq!(meta.total, Some(12));
    assert_eq!(meta.page_count, Some(3));
}
