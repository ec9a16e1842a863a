#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl RepositoryError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, RepositoryError::ConstraintViolation(_))
    }
}
