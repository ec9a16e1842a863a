mod in_memory_lock_store;
mod pg_lock_store;

pub use in_memory_lock_store::InMemoryLockStore;
pub use pg_lock_store::PgLockStore;
