use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{MediaPath, QuestionId, SessionId};

/// Resource-typed work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Transcription, synthesis, template rendering, non-model scoring.
    Light,
    /// Model-backed generation, embedding, report finalization.
    Heavy,
}

impl Lane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Light => "light",
            Lane::Heavy => "heavy",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    AdvanceInterview,
    GenerateQuestion,
    EmbedResume,
    FinalizeSession,
    SynthesizeSpeech,
    TranscribeAnswer,
    RenderTemplate,
    ScoreMedia,
}

impl TaskKind {
    pub const ALL: [TaskKind; 8] = [
        TaskKind::AdvanceInterview,
        TaskKind::GenerateQuestion,
        TaskKind::EmbedResume,
        TaskKind::FinalizeSession,
        TaskKind::SynthesizeSpeech,
        TaskKind::TranscribeAnswer,
        TaskKind::RenderTemplate,
        TaskKind::ScoreMedia,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::AdvanceInterview => "advance_interview",
            TaskKind::GenerateQuestion => "generate_question",
            TaskKind::EmbedResume => "embed_resume",
            TaskKind::FinalizeSession => "finalize_session",
            TaskKind::SynthesizeSpeech => "synthesize_speech",
            TaskKind::TranscribeAnswer => "transcribe_answer",
            TaskKind::RenderTemplate => "render_template",
            TaskKind::ScoreMedia => "score_media",
        }
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("Invalid task kind: {}", s))
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    AdvanceInterview {
        session_id: SessionId,
    },
    SynthesizeSpeech {
        session_id: SessionId,
        question_id: QuestionId,
    },
    TranscribeAnswer {
        session_id: SessionId,
        audio_path: MediaPath,
    },
    FinalizeSession {
        session_id: SessionId,
    },
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::AdvanceInterview { .. } => TaskKind::AdvanceInterview,
            Task::SynthesizeSpeech { .. } => TaskKind::SynthesizeSpeech,
            Task::TranscribeAnswer { .. } => TaskKind::TranscribeAnswer,
            Task::FinalizeSession { .. } => TaskKind::FinalizeSession,
        }
    }

    pub fn session_id(&self) -> SessionId {
        match self {
            Task::AdvanceInterview { session_id }
            | Task::SynthesizeSpeech { session_id, .. }
            | Task::TranscribeAnswer { session_id, .. }
            | Task::FinalizeSession { session_id } => *session_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskEnvelope {
    pub id: Uuid,
    pub lane: Lane,
    pub task: Task,
    pub enqueued_at: DateTime<Utc>,
}

impl TaskEnvelope {
    pub fn new(lane: Lane, task: Task) -> Self {
        Self {
            id: Uuid::new_v4(),
            lane,
            task,
            enqueued_at: Utc::now(),
        }
    }
}
