use chrono::Utc;
use futures::Stream;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    dto::{
        account::{BecomeSellerRequest, UpdateAccountRequest},
        auth::SignInResponse,
        products::{PendingImage, UploadedFile},
    },
    entity::users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    error::{AppError, AppResult, FieldErrors},
    live::{self, Change, Collection},
    middleware::auth::AuthUser,
    models::{ROLE_SELLER, UserProfile},
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
    storage::ObjectStore,
    validation,
};

async fn load_user(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

/// Copies the seller's current shop details onto every product they list.
async fn sync_shop_details(state: &AppState, profile: &UserProfile) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET seller_name = $2, shop_name = $3, shop_address = $4, shop_phone = $5,
            brand_image = $6, updated_at = now()
        WHERE seller_id = $1
        "#,
    )
    .bind(profile.id)
    .bind(&profile.name)
    .bind(&profile.shop_name)
    .bind(&profile.shop_address)
    .bind(&profile.shop_phone)
    .bind(&profile.brand_image)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::debug!(seller_id = %profile.id, products = result.rows_affected(), "shop details synced");
        state.hub.publish(Change::everyone(Collection::Products));
    }
    Ok(())
}

async fn profile_changed(state: &AppState, profile: &UserProfile) -> AppResult<()> {
    state.hub.publish(Change::new(Collection::Users, [profile.id]));
    if profile.is_seller() {
        sync_shop_details(state, profile).await?;
    }
    Ok(())
}

/// Profile snapshots for the signed-in user; role and shop changes arrive here.
pub fn live_account(state: AppState, user_id: Uuid) -> impl Stream<Item = UserProfile> {
    let ticks = state.hub.watch(Collection::Users, Some(user_id));
    live::snapshots(ticks, move || {
        let state = state.clone();
        async move { auth_service::find_user(&state, user_id).await }
    })
}

pub async fn get_account(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let profile = auth_service::find_user(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", profile, None))
}

pub async fn update_account(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateAccountRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let mut errors = FieldErrors::new();
    if payload.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        errors.insert("name".into(), validation::REQUIRED.into());
    }
    if payload.phone.as_deref().is_some_and(|phone| !validation::is_valid_phone(phone)) {
        errors.insert("phone".into(), "Phone number is invalid".into());
    }
    if payload
        .shop_phone
        .as_deref()
        .is_some_and(|phone| !validation::is_valid_phone(phone))
    {
        errors.insert("shop_phone".into(), "Invalid Phone Number".into());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let existing = load_user(state, user).await?;
    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(validation::format_phone_number(&phone));
    }
    if let Some(shop_name) = payload.shop_name {
        active.shop_name = Set(Some(shop_name.trim().to_string()));
    }
    if let Some(shop_address) = payload.shop_address {
        active.shop_address = Set(Some(shop_address.trim().to_string()));
    }
    if let Some(shop_phone) = payload.shop_phone {
        active.shop_phone = Set(Some(validation::format_phone_number(&shop_phone)));
    }
    if let Some(brand_image) = payload.brand_image {
        active.brand_image = Set(Some(brand_image).filter(|url| !url.is_empty()));
    }
    active.updated_at = Set(Utc::now().into());

    let profile = UserProfile::from(active.update(&state.orm).await?);
    profile_changed(state, &profile).await?;

    tracing::info!(user_id = %user.user_id, "account updated");
    Ok(ApiResponse::success(
        "Account updated",
        profile,
        Some(Meta::empty()),
    ))
}

/// Adds the seller role and shop details, returning a token that carries the new role.
pub async fn become_seller(
    state: &AppState,
    user: &AuthUser,
    payload: BecomeSellerRequest,
) -> AppResult<ApiResponse<SignInResponse>> {
    validation::validate_seller(&payload)?;

    let existing = load_user(state, user).await?;
    let mut roles = UserProfile::from(existing.clone()).roles;
    if !roles.iter().any(|role| role == ROLE_SELLER) {
        roles.push(ROLE_SELLER.to_string());
    }

    let mut active: UserActive = existing.into();
    active.roles = Set(serde_json::json!(roles));
    active.shop_name = Set(Some(payload.shop_name.trim().to_string()));
    active.shop_address = Set(Some(payload.shop_address.trim().to_string()));
    active.shop_phone = Set(Some(validation::format_phone_number(&payload.shop_phone)));
    if let Some(brand_image) = payload.brand_image.filter(|url| !url.is_empty()) {
        active.brand_image = Set(Some(brand_image));
    }
    active.updated_at = Set(Utc::now().into());

    let profile = UserProfile::from(active.update(&state.orm).await?);
    profile_changed(state, &profile).await?;
    let token = auth_service::issue_token(&state.config, &profile)?;

    tracing::info!(user_id = %user.user_id, "user became a seller");
    Ok(ApiResponse::success(
        "You are now a seller",
        SignInResponse {
            token,
            user: profile,
        },
        Some(Meta::empty()),
    ))
}

pub async fn upload_brand_image(
    state: &AppState,
    user: &AuthUser,
    image: PendingImage,
) -> AppResult<ApiResponse<UploadedFile>> {
    if image
        .content_type
        .as_deref()
        .is_some_and(|content_type| !content_type.starts_with("image/"))
    {
        return Err(AppError::field("image", "must be an image"));
    }

    let existing = load_user(state, user).await?;
    let key = ObjectStore::object_key("brand", user.user_id, &image.file_name);
    let stored = state.storage.put_logged(&key, &image.bytes).await?;

    let mut active: UserActive = existing.into();
    active.brand_image = Set(Some(stored.url.clone()));
    active.updated_at = Set(Utc::now().into());
    let profile = match active.update(&state.orm).await {
        Ok(model) => UserProfile::from(model),
        Err(err) => {
            tracing::warn!(user_id = %user.user_id, error = %err, "brand image not saved");
            state.storage.discard(&stored.key).await;
            return Err(err.into());
        }
    };
    profile_changed(state, &profile).await?;

    tracing::info!(user_id = %user.user_id, key = %stored.key, "brand image uploaded");
    Ok(ApiResponse::success(
        "Brand image uploaded",
        UploadedFile {
            key: stored.key,
            url: stored.url,
            bytes: stored.bytes,
        },
        Some(Meta::empty()),
    ))
}
