mod locks;
mod pg_error;
mod pg_pool;
mod repositories;

pub use locks::{InMemoryLockStore, PgLockStore};
pub use pg_pool::{create_pool, run_migrations};
pub use repositories::{InMemoryRepository, PgSessionRepository, PgTurnRepository};
