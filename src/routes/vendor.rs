use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    response::{Sse, sse::Event},
    routing::{get, post, put},
};
use futures::Stream;
use uuid::Uuid;

use crate::{
    dto::orders::SellerAction,
    error::AppResult,
    live,
    middleware::auth::{AuthUser, ensure_seller},
    models::{Order, Product},
    response::ApiResponse,
    routes::{params::TableQuery, upload},
    services::vendor_service,
    state::AppState,
    table::{TablePage, control::TableCommand},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(products_table).post(create_product))
        .route("/products/live", get(live_products_table))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route("/orders", get(orders_table))
        .route("/orders/live", get(live_orders_table))
        .route("/orders/{id}/{action}", post(order_action))
        .route("/tables/{session}", post(table_command))
}

#[utoipa::path(
    get,
    path = "/api/vendor/products",
    params(
        ("q" = Option<String>, Query, description = "Free-text filter over visible cells"),
        ("sort_by" = Option<String>, Query, description = "Column key"),
        ("sort_desc" = Option<bool>, Query, description = "Descending when true"),
        ("page_index" = Option<usize>, Query, description = "Zero-based page"),
        ("page_size" = Option<usize>, Query, description = "5, 10 or 20")
    ),
    responses(
        (status = 200, description = "One page of the seller's products", body = ApiResponse<TablePage>),
        (status = 403, description = "Not a seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn products_table(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TableQuery>,
) -> AppResult<Json<ApiResponse<TablePage>>> {
    let resp = vendor_service::products_table(&state, &user, query.table_state()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendor/products/live",
    params(("access_token" = Option<String>, Query, description = "Bearer token for EventSource clients")),
    responses(
        (status = 200, description = "A `session` event with the control session id, then `snapshot` events carrying table pages", content_type = "text/event-stream", body = TablePage)
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn live_products_table(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TableQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    ensure_seller(&user)?;
    let (session, pages) =
        vendor_service::live_products_table(state, user.user_id, query.table_state());
    Ok(live::sse_session(session, pages))
}

#[utoipa::path(
    post,
    path = "/api/vendor/products",
    request_body(content_type = "multipart/form-data", description = "name, category, price, description, sizes, colors, image"),
    responses(
        (status = 200, description = "Product added", body = ApiResponse<Product>),
        (status = 403, description = "Not a seller"),
        (status = 422, description = "Field errors")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let (form, image) = upload::read_product_form(multipart).await?;
    let resp = vendor_service::create_product(&state, &user, form, image).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/vendor/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Same fields as create; omit image to keep the current one"),
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 404, description = "Not one of the seller's products"),
        (status = 422, description = "Field errors")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let (form, image) = upload::read_product_form(multipart).await?;
    let resp = vendor_service::update_product(&state, &user, id, form, image).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/vendor/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not one of the seller's products")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = vendor_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendor/orders",
    params(
        ("q" = Option<String>, Query, description = "Free-text filter over visible cells"),
        ("sort_by" = Option<String>, Query, description = "Column key"),
        ("sort_desc" = Option<bool>, Query, description = "Descending when true"),
        ("page_index" = Option<usize>, Query, description = "Zero-based page"),
        ("page_size" = Option<usize>, Query, description = "5, 10 or 20"),
        ("status" = Option<String>, Query, description = "shipping | delivered | cancelled | refunded; all when absent")
    ),
    responses(
        (status = 200, description = "One page of orders for the seller", body = ApiResponse<TablePage>),
        (status = 403, description = "Not a seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn orders_table(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TableQuery>,
) -> AppResult<Json<ApiResponse<TablePage>>> {
    let resp =
        vendor_service::orders_table(&state, &user, query.table_state(), query.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendor/orders/live",
    params(("access_token" = Option<String>, Query, description = "Bearer token for EventSource clients")),
    responses(
        (status = 200, description = "A `session` event with the control session id, then `snapshot` events carrying table pages", content_type = "text/event-stream", body = TablePage)
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn live_orders_table(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TableQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    ensure_seller(&user)?;
    let (session, pages) = vendor_service::live_orders_table(
        state,
        user.user_id,
        query.table_state(),
        query.status,
    );
    Ok(live::sse_session(session, pages))
}

#[utoipa::path(
    post,
    path = "/api/vendor/orders/{id}/{action}",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("action" = SellerAction, Path, description = "refund | cancel | ship")
    ),
    responses(
        (status = 200, description = "Order status changed", body = ApiResponse<Order>),
        (status = 404, description = "Not one of the seller's orders"),
        (status = 409, description = "Status does not allow it")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn order_action(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, action)): Path<(Uuid, SellerAction)>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = vendor_service::seller_action(&state, &user, id, action).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/vendor/tables/{session}",
    params(("session" = Uuid, Path, description = "Id from the live table's `session` event")),
    request_body = TableCommand,
    responses(
        (status = 200, description = "Command queued for the live table", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "No such open table for this seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn table_command(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session): Path<Uuid>,
    Json(command): Json<TableCommand>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = vendor_service::table_command(&state, &user, session, command).await?;
    Ok(Json(resp))
}
