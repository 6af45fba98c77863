use ladeno_storefront::{routes::params::Pagination, services::catalog_service::like_pattern};

#[test]
fn pagination_defaults_and_clamps() {
    assert_eq!(Pagination::default().normalize(), (1, 20, 0));

    let p = Pagination {
        page: Some(3),
        per_page: Some(500),
    };
    assert_eq!(p.normalize(), (3, 100, 200));

    let p = Pagination {
        page: Some(-4),
        per_page: Some(0),
    };
    assert_eq!(p.normalize(), (1, 1, 0));
}

#[test]
fn huge_page_saturates_offset() {
    let p = Pagination {
        page: Some(i64::MAX),
        per_page: Some(100),
    };
    let (page, per_page, offset) = p.normalize();
    assert_eq!(page, i64::MAX);
    assert_eq!(per_page, 100);
    assert_eq!(offset, i64::MAX);
}

#[test]
fn search_wildcards_are_literal() {
    assert_eq!(like_pattern("shoe"), "%shoe%");
    assert_eq!(like_pattern("100%"), "%100\\%%");
    assert_eq!(like_pattern("a_b"), "%a\\_b%");
    assert_eq!(like_pattern("c:\\tmp"), "%c:\\\\tmp%");
}
