mod in_memory_repository;
mod pg_session_repository;
mod pg_turn_repository;

pub use in_memory_repository::InMemoryRepository;
pub use pg_session_repository::PgSessionRepository;
pub use pg_turn_repository::PgTurnRepository;
