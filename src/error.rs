use crate::certs::{CourseId, UserId};

/// Which referenced entity could not be found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("user {0} not found")]
    User(UserId),

    #[error("course {0} not found")]
    Course(CourseId),

    #[error("certificate not found")]
    Certificate,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("certificate issuance failed after {attempts} attempts")]
    IssuanceFailed { attempts: u32 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// True for the `NotFound` family, i.e. errors caused by the caller's references.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Carries the fingerprint of the rejected code, never the code itself.
    #[error("validation code already in use ({0})")]
    DuplicateCode(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Query(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

