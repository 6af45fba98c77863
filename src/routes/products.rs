use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{Sse, sse::Event},
    routing::get,
};
use futures::Stream;
use uuid::Uuid;

use crate::{
    dto::products::ProductList,
    error::AppResult,
    live,
    models::Product,
    response::ApiResponse,
    routes::params::CatalogQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/live", get(live_products))
        .route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search name, description or shop"),
        ("category" = Option<String>, Query, description = "Exact category"),
        ("sort_order" = Option<String>, Query, description = "asc | desc by creation time, default desc")
    ),
    responses(
        (status = 200, description = "Catalog, newest first", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = catalog_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/live",
    responses(
        (status = 200, description = "`snapshot` events carrying the whole catalog", content_type = "text/event-stream", body = ProductList)
    ),
    tag = "Products"
)]
pub async fn live_products(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    live::sse_snapshots(catalog_service::live_catalog(state))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product detail", body = ApiResponse<Product>),
        (status = 404, description = "Not found")
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = catalog_service::get_product(&state, id).await?;
    Ok(Json(resp))
}
