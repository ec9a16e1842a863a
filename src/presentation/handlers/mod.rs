mod advance;
mod answers;
mod error;
mod health;
mod sessions;
mod turns;

pub use advance::{AdvanceResponse, advance_handler};
pub use answers::{submit_answer_handler, submit_audio_answer_handler};
pub use error::ErrorResponse;
pub use health::health_handler;
pub use sessions::{
    CreateSessionRequest, SessionResponse, create_session_handler, get_session_handler,
    start_session_handler,
};
pub use turns::transcript_handler;
