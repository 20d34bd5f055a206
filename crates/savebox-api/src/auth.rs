use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use savebox_db::Database;
use savebox_types::ObjectId;
use savebox_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::password::{hash_password, verify_password};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

const TOKEN_LIFETIME_DAYS: i64 = 30;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username_chars = req.username.chars().count();
    if !(3..=32).contains(&username_chars) {
        return Err(ApiError::BadRequest("username must be 3-32 characters".into()));
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters".into()));
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(|e| {
            warn!("Password hashing failed: {}", e);
            ApiError::Internal
        })?;

    // Username uniqueness is left to the UNIQUE constraint
    let username = req.username;
    let user = crate::blocking(&state, move |db| db.create_user(&username, &password_hash))
        .await
        .map_err(|e| match e {
            ApiError::Conflict(_) => ApiError::Conflict("username already taken".into()),
            other => other,
        })?;

    let token = create_token(&state.jwt_secret, user.id, &user.username)?;
    info!("Registered user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.clone();
    let user = crate::blocking(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let password = req.password;
    let stored = user.password.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|_| ApiError::Internal)?;
    if !valid {
        warn!("Failed login for {}", user.username);
        return Err(ApiError::Unauthorized);
    }

    let token = create_token(&state.jwt_secret, user.id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        token,
    }))
}

pub fn create_token(secret: &str, user_id: ObjectId, username: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        warn!("Token encoding failed: {}", e);
        ApiError::Internal
    })
}
