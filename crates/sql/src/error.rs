//! Errors

use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by a [`Connection`](crate::Connection).
#[derive(Error, Debug)]
pub enum Error {
    /// A statement expected to return a row returned none.
    #[error("no rows in result set")]
    NoRows,

    /// A unique, foreign-key, not-null or check constraint rejected the
    /// statement.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Any other failure reported by the store or the transport.
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl Error {
    /// Classify a `SQLite` error, attaching `context` to anything that is not a
    /// constraint violation.
    pub(crate) fn sqlite(err: rusqlite::Error, context: &'static str) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &err
            && failure.code == ErrorCode::ConstraintViolation
        {
            return Self::Constraint(message.clone().unwrap_or_else(|| failure.to_string()));
        }
        Self::Database(anyhow::Error::new(err).context(context))
    }
}
