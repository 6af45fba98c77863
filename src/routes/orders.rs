use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{Sse, sse::Event},
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::{
    dto::orders::{ClientAction, OrderList},
    error::AppResult,
    live,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    services::order_service::{self, Party},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/live", get(live_orders))
        .route("/{id}/delivered", post(mark_delivered))
        .route("/{id}/cancel", post(cancel_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders placed by the current user, newest first", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_client_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/live",
    params(("access_token" = Option<String>, Query, description = "Bearer token for EventSource clients")),
    responses(
        (status = 200, description = "`snapshot` events carrying my orders", content_type = "text/event-stream", body = OrderList)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn live_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let orders = order_service::live_orders(state, Party::Client(user.user_id))
        .map(|items| OrderList { items });
    live::sse_snapshots(orders)
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/delivered",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order marked delivered", body = ApiResponse<Order>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Status does not allow it")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn mark_delivered(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::client_action(&state, &user, id, ClientAction::Delivered).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<Order>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Status does not allow it")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::client_action(&state, &user, id, ClientAction::Cancel).await?;
    Ok(Json(resp))
}
