use serde_json::json;
use tracing::info;

use super::api::{AnswerRequest, AnswerResponse, ExchangeApi, StartRequest, StartResponse};
use crate::error::SessionError;

/// HTTP implementation of the interview exchange protocol
pub struct HttpExchangeClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExchangeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, SessionError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| SessionError::ExchangeFailed(format!("POST {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::ExchangeFailed(format!(
                "POST {url}: status {status}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SessionError::ExchangeFailed(format!("POST {url}: malformed body: {e}")))
    }
}

#[async_trait::async_trait]
impl ExchangeApi for HttpExchangeClient {
    async fn start_session(&self, request: &StartRequest) -> Result<StartResponse, SessionError> {
        let url = self.url("/api/interview/start");
        info!("Starting interview session for role '{}'", request.job_role);
        self.post_json(&url, request).await
    }

    async fn next_question(
        &self,
        session_id: &str,
        request: &AnswerRequest,
    ) -> Result<AnswerResponse, SessionError> {
        let url = self.url(&format!("/api/interview/{session_id}/next-question"));
        info!(
            "Submitting answer for session {} (clip attached: {})",
            session_id,
            request.video.is_some()
        );
        self.post_json(&url, request).await
    }

    async fn end_session(&self, session_id: &str) -> Result<AnswerResponse, SessionError> {
        let url = self.url(&format!("/api/interview/{session_id}/end"));
        info!("Requesting server-side end for session {}", session_id);
        self.post_json(&url, &json!({})).await
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SessionError> {
        let url = self.url("/api/tts");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| SessionError::PlaybackFailed(format!("tts request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::PlaybackFailed(format!("tts status {status}")));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SessionError::PlaybackFailed(format!("tts body: {e}")))?;

        Ok(audio.to_vec())
    }
}
