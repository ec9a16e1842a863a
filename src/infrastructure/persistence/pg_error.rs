use crate::application::ports::RepositoryError;

/// Unique violations surface as `ConstraintViolation` so callers can tell a
/// lost write race from a broken database.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::ConstraintViolation(
                db.constraint().unwrap_or("unique").to_string(),
            )
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::ConnectionFailed(e.to_string())
        }
        _ => RepositoryError::QueryFailed(e.to_string()),
    }
}
