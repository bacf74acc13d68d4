use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::session::stats::{ProctoringReport, StatsSnapshot};

/// Session bootstrap request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub job_role: String,
    pub candidate_name: String,
}

/// Session bootstrap response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: String,
    /// Opening question text
    pub question: String,
    pub job_role: String,
    pub candidate_name: String,
    #[serde(default)]
    pub max_questions: Option<u32>,
}

/// Next-question request: the recorded answer (when usable) plus the
/// statistics snapshot current at send time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    /// Client timestamp, seconds since the Unix epoch
    pub timestamp: f64,
    /// The question this answer responds to
    pub question: String,
    pub proctoring_stats: ProctoringReport,
    /// Base64-encoded answer clip; omitted when no usable clip exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

/// Raw next-question / end-exchange response body.
///
/// The server answers in one of three shapes (continuation, completion,
/// error); every field is optional here and `interpret` sorts them out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub interview_completed: Option<bool>,
    #[serde(default)]
    pub next_question: Option<String>,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub question_number: Option<u32>,
    #[serde(default)]
    pub current_level: Option<String>,
    #[serde(default)]
    pub proctoring_stats: Option<StatsSnapshot>,
    #[serde(default)]
    pub final_feedback: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A continuation: the interview advances to the next question
#[derive(Debug, Clone)]
pub struct Continuation {
    pub next_question: String,
    pub transcription: Option<String>,
    pub analysis: Option<String>,
    /// Server-authoritative question number; local +1 when absent
    pub question_number: Option<u32>,
    pub current_level: Option<String>,
    pub proctoring_stats: Option<StatsSnapshot>,
}

/// Interpreted exchange outcome
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// The session continues with a new question
    Continuation(Continuation),
    /// The interview is over
    Completed { final_feedback: String },
}

impl AnswerResponse {
    /// Interpret the response: terminal beats continuation; anything else is
    /// an exchange error.
    pub fn interpret(self) -> Result<ExchangeOutcome, SessionError> {
        if self.interview_completed == Some(true) {
            return Ok(ExchangeOutcome::Completed {
                final_feedback: self.final_feedback.unwrap_or_default(),
            });
        }

        if self.success == Some(true) {
            if let Some(next_question) = self.next_question {
                return Ok(ExchangeOutcome::Continuation(Continuation {
                    next_question,
                    transcription: self.transcription,
                    analysis: self.analysis,
                    question_number: self.question_number,
                    current_level: self.current_level,
                    proctoring_stats: self.proctoring_stats,
                }));
            }
            return Err(SessionError::ExchangeFailed(
                "successful response without a next question".to_string(),
            ));
        }

        Err(SessionError::ExchangeFailed(
            self.error
                .unwrap_or_else(|| "unrecognized response shape".to_string()),
        ))
    }
}

/// The interview server's request/response protocol.
///
/// A trait seam so the orchestrator and submission logic are testable with
/// in-process fakes.
#[async_trait::async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Start exchange: create a session and get the opening question
    async fn start_session(&self, request: &StartRequest) -> Result<StartResponse, SessionError>;

    /// Next-question exchange: upload one answer, get the next question or
    /// the completion verdict
    async fn next_question(
        &self,
        session_id: &str,
        request: &AnswerRequest,
    ) -> Result<AnswerResponse, SessionError>;

    /// End exchange: terminate the session server-side
    async fn end_session(&self, session_id: &str) -> Result<AnswerResponse, SessionError>;

    /// Text-to-speech exchange: synthesize audio for a question
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SessionError>;
}
