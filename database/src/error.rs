use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Key already exists: {0}")]
    KeyExists(String),

    #[error("Other error: {0}")]
    Other(String),
}
