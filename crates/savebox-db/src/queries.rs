use chrono::Utc;
use rusqlite::{Connection, Row};
use savebox_types::{ObjectId, Role};
use tracing::debug;

use crate::models::{MessageRow, UserRow};
use crate::{Database, DbError, Result};

impl Database {
    // -- Users --

    /// Fails with `DbError::DuplicateKey` if the username is taken.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<UserRow> {
        let user = UserRow {
            id: ObjectId::new(),
            username: username.to_string(),
            password: password_hash.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    user.id.to_hex(),
                    user.username,
                    user.password,
                    user.role.as_str(),
                    user.created_at
                ],
            )?;
            Ok(())
        })?;

        debug!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password, role, created_at FROM users WHERE username = ?1",
                [username],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn get_user_by_id(&self, id: &ObjectId) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password, role, created_at FROM users WHERE id = ?1",
                [id.to_hex()],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, username, password, role, created_at FROM users ORDER BY rowid")?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no such user exists.
    pub fn update_user_password(&self, id: &ObjectId, password_hash: &str) -> Result<bool> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                (password_hash, id.to_hex()),
            )?)
        })?;
        debug!("Password update for user {}: {} row(s)", id, changed);
        Ok(changed > 0)
    }

    /// Returns false when no such user exists.
    pub fn set_user_role(&self, id: &ObjectId, role: Role) -> Result<bool> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute("UPDATE users SET role = ?1 WHERE id = ?2", (role.as_str(), id.to_hex()))?)
        })?;
        debug!("Role update for user {} to {}: {} row(s)", id, role, changed);
        Ok(changed > 0)
    }

    /// Deleting a user cascades to their messages and saved messages.
    pub fn delete_user(&self, id: &ObjectId) -> Result<bool> {
        let removed =
            self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id.to_hex()])?))?;
        debug!("Deleted user {}: {} row(s)", id, removed);
        Ok(removed > 0)
    }

    // -- Messages --

    /// Fails with `DbError::MissingReference` if the author does not exist.
    pub fn insert_message(&self, author_id: &ObjectId, body: &str) -> Result<MessageRow> {
        let id = ObjectId::new();
        let created_at = Utc::now();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, author_id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id.to_hex(), author_id.to_hex(), body, created_at],
            )?;

            let author_username: String = conn.query_row(
                "SELECT username FROM users WHERE id = ?1",
                [author_id.to_hex()],
                |row| row.get(0),
            )?;

            Ok(MessageRow {
                id,
                author_id: *author_id,
                author_username,
                body: body.to_string(),
                created_at,
            })
        })
    }

    pub fn get_message(&self, id: &ObjectId) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT m.id, m.author_id, u.username, m.body, m.created_at
                 FROM messages m
                 LEFT JOIN users u ON m.author_id = u.id
                 WHERE m.id = ?1",
                [id.to_hex()],
                message_from_row,
            )
            .optional()
        })
    }

    /// Newest first. `before` is the id of the oldest message of the
    /// previous page; an unknown cursor yields an empty page.
    pub fn get_messages(&self, limit: u32, before: Option<&ObjectId>) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, limit, before.map(ObjectId::to_hex)))
    }

    /// Deleting a message cascades to every saved message pointing at it.
    pub fn delete_message(&self, id: &ObjectId) -> Result<bool> {
        let removed = self
            .with_conn(|conn| Ok(conn.execute("DELETE FROM messages WHERE id = ?1", [id.to_hex()])?))?;
        debug!("Deleted message {}: {} row(s)", id, removed);
        Ok(removed > 0)
    }
}

fn query_messages(conn: &Connection, limit: u32, before: Option<String>) -> Result<Vec<MessageRow>> {
    // JOIN users to fetch the author name in the same query
    let mut stmt = conn.prepare(
        "SELECT m.id, m.author_id, u.username, m.body, m.created_at
         FROM messages m
         LEFT JOIN users u ON m.author_id = u.id
         WHERE ?1 IS NULL OR m.rowid < (SELECT rowid FROM messages WHERE id = ?1)
         ORDER BY m.rowid DESC
         LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![before, limit], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: object_id(row, 0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        role: parse_text(row, 3)?,
        created_at: row.get(4)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: object_id(row, 0)?,
        author_id: object_id(row, 1)?,
        author_username: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| "unknown".to_string()),
        body: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Read a TEXT column holding an object id's hex form.
pub(crate) fn object_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<ObjectId> {
    parse_text(row, idx)
}

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "hash").unwrap();

        let err = db.create_user("alice", "other").unwrap_err();
        assert!(err.is_duplicate_key(), "unexpected error: {err:?}");
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn user_lookup_and_password_update() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("bob", "old").unwrap();

        let by_name = db.get_user_by_username("bob").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(db.get_user_by_username("nobody").unwrap().is_none());

        assert!(db.update_user_password(&user.id, "new").unwrap());
        assert_eq!(db.get_user_by_id(&user.id).unwrap().unwrap().password, "new");
        assert!(!db.update_user_password(&ObjectId::new(), "x").unwrap());
    }

    #[test]
    fn users_default_to_user_role() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("erin", "hash").unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(db.get_user_by_id(&user.id).unwrap().unwrap().role, Role::User);

        assert!(db.set_user_role(&user.id, Role::Admin).unwrap());
        assert_eq!(db.get_user_by_username("erin").unwrap().unwrap().role, Role::Admin);
        assert_eq!(db.list_users().unwrap()[0].role, Role::Admin);
        assert!(!db.set_user_role(&ObjectId::new(), Role::Admin).unwrap());
    }

    #[test]
    fn message_requires_existing_author() {
        let db = Database::open_in_memory().unwrap();
        let err = db.insert_message(&ObjectId::new(), "hi").unwrap_err();
        assert!(matches!(err, DbError::MissingReference), "unexpected error: {err:?}");
    }

    #[test]
    fn messages_page_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_user("carol", "hash").unwrap();
        let ids: Vec<ObjectId> = (0..5)
            .map(|i| db.insert_message(&author.id, &format!("m{i}")).unwrap().id)
            .collect();

        let first = db.get_messages(2, None).unwrap();
        assert_eq!(first.iter().map(|m| m.body.as_str()).collect::<Vec<_>>(), ["m4", "m3"]);
        assert_eq!(first[0].author_username, "carol");

        let next = db.get_messages(10, Some(&first[1].id)).unwrap();
        assert_eq!(next.iter().map(|m| m.id).collect::<Vec<_>>(), [ids[2], ids[1], ids[0]]);

        assert!(db.get_messages(10, Some(&ObjectId::new())).unwrap().is_empty());
    }

    #[test]
    fn deleting_user_removes_their_messages() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_user("dave", "hash").unwrap();
        let msg = db.insert_message(&author.id, "bye").unwrap();

        assert!(db.delete_user(&author.id).unwrap());
        assert!(db.get_message(&msg.id).unwrap().is_none());
        assert!(!db.delete_user(&author.id).unwrap());
    }
}
