use axum::{Extension, Json, extract::State, response::IntoResponse};

use savebox_types::api::{Claims, UserResponse};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let user = crate::blocking(&state, move |db| db.get_user_by_id(&user_id))
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
        role: user.role,
        created_at: user.created_at,
    }))
}
