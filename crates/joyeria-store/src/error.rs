use thiserror::Error;

/// Failures surfaced by [`Database`](crate::Database) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Creating the database directory failed.
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("No such record")]
    NotFound,

    /// A unique constraint rejected the write. Carries the column name.
    #[error("Duplicate value for {0}")]
    Duplicate(&'static str),

    #[error("Schema upgrade failed: {0}")]
    Migration(String),

    /// JSON column (de)serialization error.
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
