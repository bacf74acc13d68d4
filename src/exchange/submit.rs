use base64::Engine;
use tracing::{info, warn};

use super::api::{AnswerRequest, ExchangeApi, ExchangeOutcome};
use crate::channels::messages::wire_timestamp;
use crate::error::SessionError;
use crate::media::Clip;
use crate::session::stats::ProctoringReport;

/// Everything the next-question exchange needs for one answer
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    /// The question being answered
    pub question: String,
    /// The drained clip, when one of usable size exists
    pub clip: Option<Clip>,
    /// Statistics snapshot copied at send time
    pub report: ProctoringReport,
}

/// Assemble the next-question request.
///
/// The clip is attached base64-encoded when present; absence of a usable
/// answer never stalls the interview, the request simply omits the field.
pub fn assemble_request(submission: &AnswerSubmission) -> AnswerRequest {
    let video = submission
        .clip
        .as_ref()
        .map(|clip| base64::engine::general_purpose::STANDARD.encode(&clip.data));

    AnswerRequest {
        timestamp: wire_timestamp(),
        question: submission.question.clone(),
        proctoring_stats: submission.report.clone(),
        video,
    }
}

/// Run the next-question exchange: one request, one response.
///
/// On error, exactly one fallback request without the clip is attempted to
/// still obtain a next question. A second failure is surfaced to the caller;
/// there is no retry loop.
pub async fn submit_answer(
    api: &dyn ExchangeApi,
    session_id: &str,
    submission: AnswerSubmission,
) -> Result<ExchangeOutcome, SessionError> {
    let request = assemble_request(&submission);

    match api.next_question(session_id, &request).await {
        Ok(response) => match response.interpret() {
            Ok(outcome) => return Ok(outcome),
            Err(e) => warn!("Answer exchange rejected: {}", e),
        },
        Err(e) => warn!("Answer exchange failed: {}", e),
    }

    info!("Attempting fallback exchange without clip");

    let fallback = AnswerRequest {
        timestamp: wire_timestamp(),
        question: submission.question,
        proctoring_stats: submission.report,
        video: None,
    };

    api.next_question(session_id, &fallback)
        .await
        .and_then(|response| response.interpret())
        .map_err(|e| SessionError::ExchangeFailed(format!("fallback also failed: {e}")))
}
