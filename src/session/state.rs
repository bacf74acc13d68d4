use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use super::context::{ConversationEntry, SessionContext, Speaker};
use super::stats::{CalibrationState, ProctoringStatistics};
use crate::channels::messages::ProctoringResult;
use crate::exchange::api::{Continuation, StartResponse};

/// Phase of the interview state machine.
///
/// All transitions are guarded on this enum; there are no standalone flags
/// to drift out of sync. `Submitting { in_flight: false }` means the last
/// exchange failed and a fresh advance is possible again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Session not yet started
    Idle,
    /// The current question is being spoken
    AwaitingPlayback,
    /// The candidate's answer is being recorded
    Recording,
    /// The answer exchange is running (or failed and awaits re-advance)
    Submitting { in_flight: bool },
    /// The interview finished normally
    Completed,
    /// The session was explicitly terminated
    Ended,
}

/// A consolidated proctoring warning with a display lifetime independent of
/// the statistics it may have caused
#[derive(Debug, Clone)]
pub struct ActiveWarning {
    pub alerts: Vec<String>,
    pub raised_at: Instant,
}

/// The orchestrator's working state: context, conversation log, aggregated
/// proctoring signals, and the phase machine.
///
/// All mutation goes through the methods below so the transition table stays
/// auditable and testable in isolation from any IO.
#[derive(Debug)]
pub struct InterviewState {
    pub phase: Phase,
    pub context: SessionContext,
    pub conversation: Vec<ConversationEntry>,
    pub stats: ProctoringStatistics,
    pub calibration: CalibrationState,
    /// Server-authoritative; replaced, never incremented locally
    pub tab_switch_count: u64,
    pub last_tab_message: Option<String>,
    pub face_detected: bool,
    pub warning: Option<ActiveWarning>,
    pub last_error: Option<String>,
}

impl InterviewState {
    pub fn new(start: &StartResponse) -> Self {
        Self {
            phase: Phase::Idle,
            context: SessionContext {
                session_id: start.session_id.clone(),
                job_role: start.job_role.clone(),
                candidate_name: start.candidate_name.clone(),
                question_number: 1,
                current_level: "easy".to_string(),
                current_question: start.question.clone(),
            },
            conversation: vec![ConversationEntry::new(Speaker::Interviewer, &start.question)],
            stats: ProctoringStatistics::default(),
            calibration: CalibrationState::default(),
            tab_switch_count: 0,
            last_tab_message: None,
            face_detected: true,
            warning: None,
            last_error: None,
        }
    }

    /// `Idle → AwaitingPlayback` on session start
    pub fn begin(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.phase = Phase::AwaitingPlayback;
        true
    }

    /// `AwaitingPlayback → Recording` on the playback signal.
    ///
    /// Returns false for stale signals arriving in any other phase.
    pub fn playback_finished(&mut self) -> bool {
        if self.phase != Phase::AwaitingPlayback {
            debug!("Ignoring playback signal in phase {:?}", self.phase);
            return false;
        }
        self.phase = Phase::Recording;
        true
    }

    /// `Recording → Submitting` on the operator's advance action.
    ///
    /// This guard is the re-entrancy protection: an advance while an
    /// exchange is in flight, or in any phase other than `Recording` or a
    /// failed submission, is dropped.
    pub fn begin_submission(&mut self) -> bool {
        match self.phase {
            Phase::Recording | Phase::Submitting { in_flight: false } => {
                self.phase = Phase::Submitting { in_flight: true };
                true
            }
            _ => {
                debug!("Ignoring advance in phase {:?}", self.phase);
                false
            }
        }
    }

    /// The exchange (and its fallback) failed; the session stays in
    /// `Submitting` but is re-advanceable.
    pub fn submission_failed(&mut self, error: String) {
        if self.phase == (Phase::Submitting { in_flight: true }) {
            self.phase = Phase::Submitting { in_flight: false };
        }
        self.last_error = Some(error);
    }

    /// `Submitting → AwaitingPlayback` on a continuation response.
    ///
    /// Appends candidate text, optional analysis and the next question in
    /// that order, then updates the context. Returns the next question text
    /// for playback.
    pub fn apply_continuation(&mut self, continuation: Continuation) -> String {
        self.conversation.push(ConversationEntry::new(
            Speaker::Candidate,
            continuation.transcription.unwrap_or_default(),
        ));
        if let Some(analysis) = continuation.analysis.filter(|a| !a.is_empty()) {
            self.conversation
                .push(ConversationEntry::new(Speaker::Analysis, analysis));
        }
        self.conversation.push(ConversationEntry::new(
            Speaker::Interviewer,
            &continuation.next_question,
        ));

        self.context.question_number = continuation
            .question_number
            .unwrap_or(self.context.question_number + 1);
        if let Some(level) = continuation.current_level {
            self.context.current_level = level;
        }
        self.context.current_question = continuation.next_question.clone();

        if let Some(snapshot) = &continuation.proctoring_stats {
            self.stats = self.stats.merged(snapshot);
            if let Some(tabs) = snapshot.tab_switch_count {
                self.tab_switch_count = tabs;
            }
        }

        self.last_error = None;
        self.phase = Phase::AwaitingPlayback;

        info!(
            "Advanced to question {} ({} level)",
            self.context.question_number, self.context.current_level
        );

        continuation.next_question
    }

    /// Terminal transition: append the final feedback and freeze the session
    pub fn apply_completion(&mut self, final_feedback: &str, terminal: Phase) {
        if !final_feedback.is_empty() {
            self.conversation
                .push(ConversationEntry::new(Speaker::Interviewer, final_feedback));
        }
        self.last_error = None;
        self.phase = terminal;
        info!("Interview over ({:?})", terminal);
    }

    /// Merge one proctoring result: detection flag and alert list are
    /// replaced unconditionally, calibration is overwritten wholesale when
    /// present, statistics are shallow-merged.
    pub fn apply_proctoring(&mut self, result: &ProctoringResult, now: Instant) {
        self.face_detected = result.detected;

        if let Some(snapshot) = &result.proctoring_data {
            self.calibration.replace_with(snapshot);
        }

        if let Some(snapshot) = &result.session_stats {
            self.stats = self.stats.merged(snapshot);
            if let Some(tabs) = snapshot.tab_switch_count {
                self.tab_switch_count = tabs;
            }
        }

        // One consolidated warning per message, however many alerts arrived
        if result.alerts.is_empty() {
            return;
        }
        self.warning = Some(ActiveWarning {
            alerts: result.alerts.clone(),
            raised_at: now,
        });
    }

    /// Replace the tab-switch count with the server's running total
    pub fn apply_tab_warning(&mut self, count: u64, message: String) {
        self.tab_switch_count = count;
        self.last_tab_message = Some(message);
    }

    pub fn clear_warning(&mut self) {
        self.warning = None;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Completed | Phase::Ended)
    }
}
