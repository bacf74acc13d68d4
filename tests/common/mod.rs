// Shared fakes for integration tests: a scripted exchange server and
// session/media configurations with short test durations.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;

use vivavoce::error::SessionError;
use vivavoce::exchange::{AnswerRequest, AnswerResponse, ExchangeApi, StartRequest, StartResponse};
use vivavoce::media::MediaBackendConfig;
use vivavoce::session::SessionConfig;

/// In-process exchange server with scripted next-question responses.
///
/// Records every answer request so tests can assert on request counts and
/// on whether a clip was attached.
pub struct FakeExchangeApi {
    pub opening_question: String,
    pub requests: Mutex<Vec<AnswerRequest>>,
    pub scripted: Mutex<VecDeque<Result<AnswerResponse, SessionError>>>,
    /// Simulated network latency for next-question calls
    pub latency: Duration,
    pub end_feedback: String,
}

impl FakeExchangeApi {
    pub fn new(responses: Vec<Result<AnswerResponse, SessionError>>) -> Self {
        Self {
            opening_question: "Describe X".to_string(),
            requests: Mutex::new(Vec::new()),
            scripted: Mutex::new(responses.into()),
            latency: Duration::from_millis(0),
            end_feedback: "Thanks for interviewing".to_string(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait::async_trait]
impl ExchangeApi for FakeExchangeApi {
    async fn start_session(&self, request: &StartRequest) -> Result<StartResponse, SessionError> {
        Ok(StartResponse {
            session_id: "test-session".to_string(),
            question: self.opening_question.clone(),
            job_role: request.job_role.clone(),
            candidate_name: request.candidate_name.clone(),
            max_questions: Some(9),
        })
    }

    async fn next_question(
        &self,
        _session_id: &str,
        request: &AnswerRequest,
    ) -> Result<AnswerResponse, SessionError> {
        self.requests.lock().await.push(request.clone());
        tokio::time::sleep(self.latency).await;

        self.scripted
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(SessionError::ExchangeFailed("nothing scripted".to_string())))
    }

    async fn end_session(&self, _session_id: &str) -> Result<AnswerResponse, SessionError> {
        Ok(AnswerResponse {
            interview_completed: Some(true),
            final_feedback: Some(self.end_feedback.clone()),
            ..AnswerResponse::default()
        })
    }

    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SessionError> {
        Ok(vec![0u8; 16])
    }
}

/// A continuation response advancing to `next_question`
pub fn continuation(next_question: &str, question_number: u32) -> Result<AnswerResponse, SessionError> {
    Ok(AnswerResponse {
        success: Some(true),
        next_question: Some(next_question.to_string()),
        question_number: Some(question_number),
        current_level: Some("easy".to_string()),
        ..AnswerResponse::default()
    })
}

/// A terminal response completing the interview
pub fn completed(final_feedback: &str) -> Result<AnswerResponse, SessionError> {
    Ok(AnswerResponse {
        interview_completed: Some(true),
        final_feedback: Some(final_feedback.to_string()),
        ..AnswerResponse::default()
    })
}

/// A simulated network failure
pub fn network_error() -> Result<AnswerResponse, SessionError> {
    Err(SessionError::ExchangeFailed("connection refused".to_string()))
}

/// Session configuration with durations short enough for tests
pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        job_role: "software engineer".to_string(),
        candidate_name: "Test Candidate".to_string(),
        ws_base_url: None,
        warning_display: Duration::from_millis(50),
        drain_grace: Duration::from_millis(10),
        completion_notice_delay: Duration::from_millis(10),
        ..SessionConfig::default()
    }
}

/// Media configuration producing chunks quickly
pub fn test_media_config() -> MediaBackendConfig {
    MediaBackendConfig {
        chunk_interval: Duration::from_millis(20),
        ..MediaBackendConfig::default()
    }
}
