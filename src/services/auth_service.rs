use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::auth::{ChangePasswordRequest, Claims, SignInRequest, SignInResponse, SignUpRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    live::{Change, Collection},
    middleware::auth::AuthUser,
    models::UserProfile,
    response::{ApiResponse, Meta},
    state::AppState,
    validation,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(config: &AppConfig, user: &UserProfile) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        roles: user.roles.clone(),
        jti: Uuid::new_v4().to_string(),
        iat: Utc::now().timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn decode_token(secret: &str, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

pub async fn find_user(state: &AppState, user_id: Uuid) -> AppResult<UserProfile> {
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .map(UserProfile::from)
        .ok_or(AppError::NotFound)
}

pub async fn sign_up(state: &AppState, payload: SignUpRequest) -> AppResult<ApiResponse<UserProfile>> {
    validation::validate_sign_up(&payload)?;
    let email = payload.email.trim().to_lowercase();

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        phone: Set(validation::format_phone_number(&payload.phone)),
        password_hash: Set(password_hash),
        roles: Set(serde_json::json!([])),
        shop_name: Set(None),
        shop_address: Set(None),
        shop_phone: Set(None),
        brand_image: Set(None),
        password_changed_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.id, "user signed up");
    state.hub.publish(Change::new(Collection::Users, [user.id]));

    Ok(ApiResponse::success("User created", UserProfile::from(user), None))
}

pub async fn sign_in(state: &AppState, payload: SignInRequest) -> AppResult<ApiResponse<SignInResponse>> {
    let SignInRequest { email, password } = payload;
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Please fill up all required fields".into()));
    }

    let user = Users::find()
        .filter(UserCol::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let user = UserProfile::from(user);
    let token = issue_token(&state.config, &user)?;
    tracing::info!(user_id = %user.id, "user signed in");

    Ok(ApiResponse::success(
        "Signed in",
        SignInResponse { token, user },
        Some(Meta::empty()),
    ))
}

/// Revokes the presented token until it would have expired anyway.
pub async fn sign_out(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    sqlx::query(
        r#"
        INSERT INTO revoked_tokens (jti, expires_at)
        VALUES ($1, $2)
        ON CONFLICT (jti) DO NOTHING
        "#,
    )
    .bind(user.jti)
    .bind(user.expires_at)
    .execute(&state.pool)
    .await?;

    if let Err(err) = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
        .execute(&state.pool)
        .await
    {
        tracing::warn!(error = %err, "revoked token cleanup failed");
    }

    tracing::info!(user_id = %user.user_id, "user signed out");
    Ok(ApiResponse::success(
        "Signed out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let profile = find_user(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", profile, None))
}

/// Needs the current password. Every token issued before the change stops working; the
/// caller gets a fresh one.
pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<SignInResponse>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !verify_password(&payload.current_password, &existing.password_hash)? {
        tracing::warn!(user_id = %user.user_id, "password change with wrong current password");
        return Err(AppError::field("current_password", "Incorrect password"));
    }
    validation::validate_password(&payload.new_password)?;

    let mut active: UserActive = existing.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.password_changed_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    let profile = UserProfile::from(active.update(&state.orm).await?);
    let token = issue_token(&state.config, &profile)?;

    tracing::info!(user_id = %user.user_id, "password updated");
    Ok(ApiResponse::success(
        "New Password Saved",
        SignInResponse {
            token,
            user: profile,
        },
        Some(Meta::empty()),
    ))
}
