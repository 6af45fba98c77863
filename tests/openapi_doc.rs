use ladeno_storefront::routes::doc::ApiDoc;
use utoipa::OpenApi;

#[test]
fn document_lists_live_routes() {
    let doc = ApiDoc::openapi();
    for path in [
        "/api/account/live",
        "/api/vendor/products/live",
        "/api/vendor/orders/live",
        "/api/vendor/tables/{session}",
    ] {
        assert!(doc.paths.paths.contains_key(path), "{path} missing");
    }
}

#[test]
fn option_lists_are_string_arrays() {
    let doc = serde_json::to_value(ApiDoc::openapi()).expect("openapi json");
    let schema = &doc["components"]["schemas"]["OptionList"];
    assert_eq!(schema["type"], "array");
    assert_eq!(schema["items"]["type"], "string");

    let command = &doc["components"]["schemas"]["TableCommand"];
    assert!(command.get("oneOf").is_some(), "{command}");
}
