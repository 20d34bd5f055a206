use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::object_id::ObjectId;
use crate::role::Role;

// -- JWT Claims --

/// JWT claims issued at login/registration and checked by the auth
/// middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: ObjectId,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: ObjectId,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: ObjectId,
    pub username: String,
    pub token: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: ObjectId,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: ObjectId,
    pub author_id: ObjectId,
    pub author_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// -- Saved messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedMessageResponse {
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub message_id: ObjectId,
    pub created_at: DateTime<Utc>,
}

/// A bookmark together with the message it points at, as listed under
/// `GET /saved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEntryResponse {
    pub id: ObjectId,
    pub message_id: ObjectId,
    pub author_id: ObjectId,
    pub body: String,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
