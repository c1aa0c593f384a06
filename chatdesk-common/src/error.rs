// ================================================================
// File: chatdesk-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `send` was called for a session that is absent or not connected.
    #[error("Session for account {0} is not connected")]
    NotConnected(i32),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("Uuid error: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("Event bus error: {0}")]
    EventBus(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}
