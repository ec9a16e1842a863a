mod completion;
mod finalizer;
pub mod generators;
mod lane_worker;
mod orchestrator;
pub mod scenario_selector;
mod session_service;
mod stage_producer;
mod state_deriver;
mod synthesis_service;
mod task_router;
pub mod task_routes;

pub use completion::CompletionDetector;
pub use finalizer::{FinalizeError, FinalizeOutcome, Finalizer};
pub use lane_worker::LaneWorker;
pub use orchestrator::{
    AdvanceOutcome, Orchestrator, OrchestratorError, OrchestratorSettings, SkipReason,
};
pub use session_service::{SessionOverview, SessionService, SessionServiceError};
pub use stage_producer::StageProducer;
pub use state_deriver::{StateDeriver, derive_last_answered_stage};
pub use synthesis_service::{SpeechRender, SpeechRequest, SynthesisError, SynthesisService};
pub use task_router::{TaskError, TaskHandler, TaskRouter};
