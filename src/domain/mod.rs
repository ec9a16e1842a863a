mod candidate_id;
mod catalog;
mod media_path;
mod produced_question;
mod question_id;
pub mod scenarios;
mod session;
mod session_id;
mod session_status;
mod speaker;
mod stage;
mod task;
mod turn;
mod turn_id;

pub use candidate_id::CandidateId;
pub use catalog::{Catalog, CatalogError, CatalogId, CatalogRegistry};
pub use media_path::MediaPath;
pub use produced_question::ProducedQuestion;
pub use question_id::QuestionId;
pub use session::{NewSession, Session};
pub use session_id::SessionId;
pub use session_status::SessionStatus;
pub use speaker::Speaker;
pub use stage::{StageDefinition, StageType};
pub use task::{Lane, Task, TaskEnvelope, TaskKind};
pub use turn::{NewTurn, Turn, TurnLogEntry};
pub use turn_id::TurnId;
