/// Failures shared by the SQLite-backed repositories and the cache store.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}
