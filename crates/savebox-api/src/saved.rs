use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};

use savebox_db::saved::SavedOrder;
use savebox_types::ObjectId;
use savebox_types::api::{Claims, SavedEntryResponse, SavedMessageResponse};

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderParam {
    #[default]
    Oldest,
    Newest,
}

#[derive(Debug, Deserialize)]
pub struct SavedQuery {
    #[serde(default)]
    pub order: OrderParam,
}

/// 201 with the new bookmark, 409 if already saved, 404 for an unknown
/// message, 401 if the token's user no longer exists.
pub async fn save_message(
    State(state): State<AppState>,
    Path(message_id): Path<ObjectId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    crate::blocking(&state, move |db| db.get_message(&message_id))
        .await?
        .ok_or(ApiError::NotFound("message"))?;

    // The message was just seen, so a dangling reference here is the user
    let user_id = claims.sub;
    let saved = crate::blocking(&state, move |db| db.create_saved_message(&user_id, &message_id))
        .await
        .map_err(|e| match e {
            ApiError::Conflict(_) => ApiError::Conflict("message already saved".into()),
            ApiError::NotFound(_) => {
                warn!("Save by unknown user {}", user_id);
                ApiError::Unauthorized
            }
            other => other,
        })?;

    info!("User {} saved message {}", claims.username, message_id);

    Ok((
        StatusCode::CREATED,
        Json(SavedMessageResponse {
            id: saved.id,
            user_id: saved.user_id,
            message_id: saved.message_id,
            created_at: saved.created_at,
        }),
    ))
}

/// Always 204, whether or not the bookmark existed.
pub async fn unsave_message(
    State(state): State<AppState>,
    Path(message_id): Path<ObjectId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    crate::blocking(&state, move |db| db.delete_saved_message(&user_id, &message_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_saved(
    State(state): State<AppState>,
    Query(query): Query<SavedQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let order = match query.order {
        OrderParam::Oldest => SavedOrder::Oldest,
        OrderParam::Newest => SavedOrder::Newest,
    };
    let user_id = claims.sub;
    let rows = crate::blocking(&state, move |db| db.find_saved_entries(&user_id, order)).await?;

    let entries: Vec<SavedEntryResponse> = rows
        .into_iter()
        .map(|row| SavedEntryResponse {
            id: row.id,
            message_id: row.message_id,
            author_id: row.author_id,
            body: row.body,
            saved_at: row.saved_at,
        })
        .collect();

    Ok(Json(entries))
}
