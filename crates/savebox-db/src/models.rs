//! Database row types. Distinct from the savebox-types API models to keep
//! the DB layer independent of the wire format.

use chrono::{DateTime, Utc};
use savebox_types::{ObjectId, Role};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: ObjectId,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: ObjectId,
    pub author_id: ObjectId,
    pub author_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedMessageRow {
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub message_id: ObjectId,
    pub created_at: DateTime<Utc>,
}

/// A saved message joined with the message it references.
#[derive(Debug, Clone)]
pub struct SavedEntryRow {
    pub id: ObjectId,
    pub message_id: ObjectId,
    pub author_id: ObjectId,
    pub body: String,
    pub saved_at: DateTime<Utc>,
}
