use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    response::{Sse, sse::Event},
    routing::{get, post},
};
use futures::Stream;

use crate::{
    dto::{
        account::{BecomeSellerRequest, UpdateAccountRequest},
        auth::SignInResponse,
        products::UploadedFile,
    },
    error::AppResult,
    live,
    middleware::auth::AuthUser,
    models::UserProfile,
    response::ApiResponse,
    routes::upload,
    services::account_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_account).put(update_account))
        .route("/live", get(live_account))
        .route("/seller", post(become_seller))
        .route("/brand-image", post(upload_brand_image))
}

#[utoipa::path(
    get,
    path = "/api/account",
    responses(
        (status = 200, description = "Profile", body = ApiResponse<UserProfile>)
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = account_service::get_account(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/account/live",
    params(("access_token" = Option<String>, Query, description = "Bearer token for EventSource clients")),
    responses(
        (status = 200, description = "`snapshot` events carrying the profile", content_type = "text/event-stream", body = UserProfile)
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn live_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    live::sse_snapshots(account_service::live_account(state, user.user_id))
}

#[utoipa::path(
    put,
    path = "/api/account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserProfile>),
        (status = 422, description = "Field errors")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_account(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateAccountRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = account_service::update_account(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/seller",
    request_body = BecomeSellerRequest,
    responses(
        (status = 200, description = "Seller role granted; use the returned token from now on", body = ApiResponse<SignInResponse>),
        (status = 422, description = "Field errors")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn become_seller(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BecomeSellerRequest>,
) -> AppResult<Json<ApiResponse<SignInResponse>>> {
    let resp = account_service::become_seller(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/brand-image",
    request_body(content_type = "multipart/form-data", description = "image"),
    responses(
        (status = 200, description = "Brand image stored", body = ApiResponse<UploadedFile>),
        (status = 422, description = "No image part")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn upload_brand_image(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadedFile>>> {
    let image = upload::read_image(multipart).await?;
    let resp = account_service::upload_brand_image(&state, &user, image).await?;
    Ok(Json(resp))
}
