use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    checkout::CheckoutState,
    dto::checkout::ShippingForm,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(current).delete(reset))
        .route("/address", post(submit_address))
        .route("/back", post(back))
        .route("/place", post(place_order))
}

#[utoipa::path(
    get,
    path = "/api/checkout",
    responses(
        (status = 200, description = "Current checkout step", body = ApiResponse<CheckoutState>)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn current(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CheckoutState>>> {
    let resp = checkout_service::current(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkout/address",
    request_body = ShippingForm,
    responses(
        (status = 200, description = "Cart frozen into the order summary", body = ApiResponse<CheckoutState>),
        (status = 400, description = "Cart is empty or not at the address step"),
        (status = 422, description = "Field errors")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn submit_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(form): Json<ShippingForm>,
) -> AppResult<Json<ApiResponse<CheckoutState>>> {
    let resp = checkout_service::submit_address(&state, &user, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkout/back",
    responses(
        (status = 200, description = "Previous step", body = ApiResponse<CheckoutState>),
        (status = 400, description = "Order already placed")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn back(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CheckoutState>>> {
    let resp = checkout_service::back(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkout/place",
    responses(
        (status = 200, description = "Orders written, cart emptied", body = ApiResponse<CheckoutState>),
        (status = 400, description = "No order summary to confirm")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CheckoutState>>> {
    let resp = checkout_service::place_order(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/checkout",
    responses(
        (status = 200, description = "Session back at the address step", body = ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn reset(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = checkout_service::reset(&state, &user).await?;
    Ok(Json(resp))
}
