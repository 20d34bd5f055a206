use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A FOREIGN KEY constraint rejected the write.
    #[error("referenced record does not exist")]
    MissingReference,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, msg) = &err {
            match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return DbError::DuplicateKey(msg.clone().unwrap_or_else(|| e.to_string()));
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return DbError::MissingReference,
                _ => {}
            }
        }
        DbError::Sqlite(err)
    }
}

impl DbError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, DbError::DuplicateKey(_))
    }
}
