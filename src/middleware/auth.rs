use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::ROLE_SELLER,
    services::auth_service::decode_token,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub roles: Vec<String>,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if !user.has_role(role) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_seller(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, ROLE_SELLER)
}

#[derive(Debug, Deserialize)]
struct AccessTokenQuery {
    access_token: Option<String>,
}

/// Bearer token from the `Authorization` header, or from `access_token` in the query
/// string for clients such as `EventSource` that cannot set headers.
pub fn bearer_token(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::BadRequest("Invalid Authorization scheme".into()))?;
        return Ok(token.trim().to_string());
    }

    let Query(query) = Query::<AccessTokenQuery>::try_from_uri(&parts.uri)
        .map_err(|_| AppError::BadRequest("Invalid query string".into()))?;
    query
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = decode_token(&state.config.jwt_secret, &token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;
        let jti = Uuid::parse_str(&claims.jti)
            .map_err(|_| AppError::BadRequest("Invalid token id".into()))?;

        let revoked: Option<(Uuid,)> =
            sqlx::query_as("SELECT jti FROM revoked_tokens WHERE jti = $1")
                .bind(jti)
                .fetch_optional(&state.pool)
                .await?;
        if revoked.is_some() {
            return Err(AppError::Unauthorized);
        }

        let changed: Option<(Option<DateTime<Utc>>,)> =
            sqlx::query_as("SELECT password_changed_at FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&state.pool)
                .await?;
        let Some((password_changed_at,)) = changed else {
            return Err(AppError::Unauthorized);
        };
        if password_changed_at.is_some_and(|at| at.timestamp() > claims.iat as i64) {
            return Err(AppError::Unauthorized);
        }

        let expires_at = DateTime::from_timestamp(claims.exp as i64, 0).unwrap_or_else(Utc::now);

        Ok(AuthUser {
            user_id,
            roles: claims.roles,
            jti,
            expires_at,
        })
    }
}
