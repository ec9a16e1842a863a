use std::sync::Arc;

use crate::application::services::{Orchestrator, SessionService};
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<SessionService>,
    pub orchestrator: Arc<Orchestrator>,
    pub settings: Settings,
}
