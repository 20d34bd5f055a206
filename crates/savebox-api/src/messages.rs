use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::warn;

use savebox_db::models::MessageRow;
use savebox_types::ObjectId;
use savebox_types::api::{Claims, MessageResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::error::ApiError;

const MAX_BODY_LEN: usize = 4000;
const MAX_PAGE: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Id of the oldest message on the previous page.
    pub before: Option<ObjectId>,
}

fn default_limit() -> u32 {
    50
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.body.trim().is_empty() || req.body.len() > MAX_BODY_LEN {
        return Err(ApiError::BadRequest(format!(
            "message body must be 1-{MAX_BODY_LEN} bytes"
        )));
    }

    let author_id = claims.sub;
    let body = req.body;
    let row = crate::blocking(&state, move |db| db.insert_message(&author_id, &body)).await?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.min(MAX_PAGE);
    let before = query.before;

    let rows = crate::blocking(&state, move |db| db.get_messages(limit, before.as_ref())).await?;

    Ok(Json(rows.into_iter().map(to_response).collect::<Vec<_>>()))
}

/// Only the author may delete; the message's saves go with it.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<ObjectId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let message = crate::blocking(&state, move |db| db.get_message(&message_id))
        .await?
        .ok_or(ApiError::NotFound("message"))?;

    if message.author_id != claims.sub {
        warn!("User {} tried to delete message {} by {}", claims.sub, message.id, message.author_id);
        return Err(ApiError::Forbidden);
    }

    crate::blocking(&state, move |db| db.delete_message(&message_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: row.id,
        author_id: row.author_id,
        author_username: row.author_username,
        body: row.body,
        created_at: row.created_at,
    }
}
