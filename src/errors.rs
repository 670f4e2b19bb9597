use crate::types::DocumentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Collection not found: {0}")]
    NoSuchCollection(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(DocumentId),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Log corrupt at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for DbError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Domain failures raised by the students service.
#[derive(Debug, Error)]
pub enum StudentsError {
    #[error("student with id {0} not found")]
    NotFound(i64),

    #[error("student with id {0} already exists")]
    AlreadyExists(i64),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl StudentsError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}
