//! Error type for `vigil-store`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("date/time parse error: {0}")]
    DateParse(String),

    #[error("corrupt encoding blob: {0}")]
    CorruptEncoding(String),

    #[error("identity not found: {0}")]
    IdentityNotFound(i64),

    #[error("evidence I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
