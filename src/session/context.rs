use serde::{Deserialize, Serialize};

/// Identity and progress of one interview session.
///
/// Created once at session start; `question_number`, `current_level` and
/// `current_question` mutate only on a successful exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub job_role: String,
    pub candidate_name: String,
    pub question_number: u32,
    pub current_level: String,
    pub current_question: String,
}

/// Who produced a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The candidate's transcribed answer
    Candidate,
    /// The server's analysis of an answer
    Analysis,
    /// The AI interviewer's question or feedback
    Interviewer,
}

/// One entry in the append-only conversation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl ConversationEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}
