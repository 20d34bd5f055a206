//! Saved-message bookmarks: at most one row per (user, message) pair.
//!
//! Uniqueness is enforced by the `UNIQUE(user_id, message_id)` index, so
//! `create_saved_message` is a single INSERT and concurrent duplicates
//! resolve inside SQLite. Rows are never updated; they go away through
//! `delete_saved_message` or by cascade when the user or message is deleted.

use chrono::Utc;
use rusqlite::Row;
use savebox_types::ObjectId;
use tracing::debug;

use crate::models::{SavedEntryRow, SavedMessageRow};
use crate::queries::{OptionalExt, object_id};
use crate::{Database, Result};

/// Ordering for a user's saved messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SavedOrder {
    /// Insertion order.
    #[default]
    Oldest,
    Newest,
}

impl SavedOrder {
    fn sql(self) -> &'static str {
        match self {
            SavedOrder::Oldest => "ASC",
            SavedOrder::Newest => "DESC",
        }
    }
}

impl Database {
    /// Fails with `DbError::DuplicateKey` if the user already saved this
    /// message, or `DbError::MissingReference` if either side is missing.
    pub fn create_saved_message(
        &self,
        user_id: &ObjectId,
        message_id: &ObjectId,
    ) -> Result<SavedMessageRow> {
        let saved = SavedMessageRow {
            id: ObjectId::new(),
            user_id: *user_id,
            message_id: *message_id,
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO saved_messages (id, user_id, message_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    saved.id.to_hex(),
                    saved.user_id.to_hex(),
                    saved.message_id.to_hex(),
                    saved.created_at
                ],
            )?;
            Ok(())
        })?;

        debug!("User {} saved message {}", user_id, message_id);
        Ok(saved)
    }

    pub fn find_saved_by_user(
        &self,
        user_id: &ObjectId,
        order: SavedOrder,
    ) -> Result<Vec<SavedMessageRow>> {
        let sql = format!(
            "SELECT id, user_id, message_id, created_at FROM saved_messages
             WHERE user_id = ?1
             ORDER BY rowid {}",
            order.sql()
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id.to_hex()], saved_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Like `find_saved_by_user`, joined with the saved message's content.
    pub fn find_saved_entries(
        &self,
        user_id: &ObjectId,
        order: SavedOrder,
    ) -> Result<Vec<SavedEntryRow>> {
        let sql = format!(
            "SELECT s.id, s.message_id, m.author_id, m.body, s.created_at
             FROM saved_messages s
             JOIN messages m ON s.message_id = m.id
             WHERE s.user_id = ?1
             ORDER BY s.rowid {}",
            order.sql()
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id.to_hex()], |row| {
                    Ok(SavedEntryRow {
                        id: object_id(row, 0)?,
                        message_id: object_id(row, 1)?,
                        author_id: object_id(row, 2)?,
                        body: row.get(3)?,
                        saved_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_saved_message(
        &self,
        user_id: &ObjectId,
        message_id: &ObjectId,
    ) -> Result<Option<SavedMessageRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, message_id, created_at FROM saved_messages
                 WHERE user_id = ?1 AND message_id = ?2",
                [user_id.to_hex(), message_id.to_hex()],
                saved_from_row,
            )
            .optional()
        })
    }

    pub fn is_saved(&self, user_id: &ObjectId, message_id: &ObjectId) -> Result<bool> {
        Ok(self.get_saved_message(user_id, message_id)?.is_some())
    }

    pub fn count_saves_for_message(&self, message_id: &ObjectId) -> Result<u64> {
        let count: i64 = self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM saved_messages WHERE message_id = ?1",
                [message_id.to_hex()],
                |row| row.get(0),
            )?)
        })?;
        Ok(count as u64)
    }

    /// Idempotent: removing a bookmark that does not exist is not an error.
    /// Returns whether a row was removed.
    pub fn delete_saved_message(&self, user_id: &ObjectId, message_id: &ObjectId) -> Result<bool> {
        let removed = self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM saved_messages WHERE user_id = ?1 AND message_id = ?2",
                [user_id.to_hex(), message_id.to_hex()],
            )?)
        })?;

        debug!("User {} unsaved message {}: {} row(s)", user_id, message_id, removed);
        Ok(removed > 0)
    }
}

fn saved_from_row(row: &Row<'_>) -> rusqlite::Result<SavedMessageRow> {
    Ok(SavedMessageRow {
        id: object_id(row, 0)?,
        user_id: object_id(row, 1)?,
        message_id: object_id(row, 2)?,
        created_at: row.get(3)?,
    })
}
