use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::context::ConversationEntry;
use super::state::{InterviewState, Phase};
use super::stats::{CalibrationState, ProctoringReport, ProctoringStatistics};
use crate::channels::proctoring::{FrameSamplerConfig, ProctoringChannel};
use crate::channels::tab::TabChannel;
use crate::channels::ChannelEvent;
use crate::error::SessionError;
use crate::exchange::api::{ExchangeApi, ExchangeOutcome, StartRequest};
use crate::exchange::submit::{submit_answer, AnswerSubmission};
use crate::media::{AnswerRecorder, MediaBackend, MediaStream};
use crate::speech::{PlaybackOutcome, SpeechDriver};

/// Operator actions on a running session
#[derive(Debug, Clone, Copy)]
pub enum SessionCommand {
    /// Submit the current answer and move to the next question
    Advance,
    /// Terminate the interview
    End,
    /// The host page transitioned into the hidden state
    TabHidden,
}

/// Events delivered back into the orchestrator loop from its own tasks
enum InternalEvent {
    PlaybackFinished(PlaybackOutcome),
    SubmissionDone(Result<ExchangeOutcome, SessionError>),
}

/// Read-only snapshot of the session for operator-facing surfaces
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub question_number: u32,
    pub current_level: String,
    pub current_question: String,
    pub conversation: Vec<ConversationEntry>,
    pub stats: ProctoringStatistics,
    pub calibration: CalibrationState,
    pub tab_switch_count: u64,
    pub face_detected: bool,
    /// Alerts currently on display; cleared automatically
    pub active_alerts: Vec<String>,
    pub last_tab_message: Option<String>,
    pub last_error: Option<String>,
}

/// Handle for driving a running session from the outside
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    channel: mpsc::Sender<ChannelEvent>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub async fn advance(&self) {
        let _ = self.commands.send(SessionCommand::Advance).await;
    }

    pub async fn end(&self) {
        let _ = self.commands.send(SessionCommand::End).await;
    }

    /// Feed the host environment's visibility-change signal
    pub async fn tab_hidden(&self) {
        let _ = self.commands.send(SessionCommand::TabHidden).await;
    }

    /// Deliver a channel event into the session mailbox.
    ///
    /// For hosts that bridge proctoring or tab signals over their own
    /// transport instead of the built-in WebSocket clients.
    pub async fn deliver(&self, event: ChannelEvent) {
        let _ = self.channel.send(event).await;
    }

    /// Latest session snapshot
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Subscribe to snapshot updates
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }
}

/// What the session ends with
#[derive(Debug, Clone)]
pub struct FinalSummary {
    pub final_feedback: Option<String>,
    pub questions_reached: u32,
    pub conversation: Vec<ConversationEntry>,
    pub report: ProctoringReport,
}

/// The interview session orchestrator.
///
/// Sequences playback → recording → submission → next question while the
/// proctoring and tab channels merge their signals asynchronously. Runs as a
/// single event loop; spawned tasks (playback, submission, channel IO) report
/// back through mailboxes, so channel events keep merging while an exchange
/// is in flight.
pub struct InterviewSession {
    config: SessionConfig,
    api: Arc<dyn ExchangeApi>,
    speech: Arc<dyn SpeechDriver>,
    stream: Arc<dyn MediaStream>,
    recorder: AnswerRecorder,
    state: InterviewState,
    proctoring: Option<ProctoringChannel>,
    tab: Option<TabChannel>,
    commands_rx: mpsc::Receiver<SessionCommand>,
    channel_rx: mpsc::Receiver<ChannelEvent>,
    internal_rx: mpsc::Receiver<InternalEvent>,
    internal_tx: mpsc::Sender<InternalEvent>,
    view_tx: watch::Sender<SessionView>,
    final_feedback: Option<String>,
}

impl InterviewSession {
    /// Acquire the device, bootstrap the session, connect the channels, and
    /// start playback of the opening question.
    ///
    /// Only a device failure or a failed start exchange aborts; unavailable
    /// channels degrade to a session without their signals.
    pub async fn begin(
        config: SessionConfig,
        backend: Arc<dyn MediaBackend>,
        speech: Arc<dyn SpeechDriver>,
        api: Arc<dyn ExchangeApi>,
    ) -> Result<(Self, SessionHandle), SessionError> {
        info!(
            "Beginning interview session: role='{}' candidate='{}'",
            config.job_role, config.candidate_name
        );

        let stream = backend.acquire().await?;

        let start = match api
            .start_session(&StartRequest {
                job_role: config.job_role.clone(),
                candidate_name: config.candidate_name.clone(),
            })
            .await
        {
            Ok(start) => start,
            Err(e) => {
                stream.release();
                return Err(e);
            }
        };

        info!("Session {} created", start.session_id);

        let mut state = InterviewState::new(&start);

        let (channel_tx, channel_rx) = mpsc::channel(64);

        let proctoring = match &config.ws_base_url {
            Some(base) => {
                let url = format!(
                    "{}/ws/video/{}",
                    base.trim_end_matches('/'),
                    start.session_id
                );
                let sampler = FrameSamplerConfig {
                    interval: config.frame_interval,
                    width: config.frame_width,
                    height: config.frame_height,
                };
                match ProctoringChannel::connect(
                    &url,
                    Arc::clone(&stream),
                    channel_tx.clone(),
                    sampler,
                )
                .await
                {
                    Ok(channel) => Some(channel),
                    Err(e) => {
                        warn!("Proctoring channel unavailable: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        let tab = match &config.ws_base_url {
            Some(base) => {
                let url = format!(
                    "{}/ws/monitor/{}",
                    base.trim_end_matches('/'),
                    start.session_id
                );
                match TabChannel::connect(&url, channel_tx.clone()).await {
                    Ok(channel) => Some(channel),
                    Err(e) => {
                        warn!("Tab-activity channel unavailable: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        let (internal_tx, internal_rx) = mpsc::channel(16);
        let (commands_tx, commands_rx) = mpsc::channel(16);

        state.begin();
        Self::spawn_speak(
            Arc::clone(&speech),
            internal_tx.clone(),
            state.context.current_question.clone(),
        );

        let recorder = AnswerRecorder::new(config.min_clip_bytes);
        let (view_tx, view_rx) = watch::channel(Self::snapshot(&state));

        let session = Self {
            config,
            api,
            speech,
            stream,
            recorder,
            state,
            proctoring,
            tab,
            commands_rx,
            channel_rx,
            internal_rx,
            internal_tx,
            view_tx,
            final_feedback: None,
        };

        let handle = SessionHandle {
            commands: commands_tx,
            channel: channel_tx,
            view: view_rx,
        };

        Ok((session, handle))
    }

    /// Drive the session to completion.
    ///
    /// Returns after the interview completes, is explicitly ended, or the
    /// handle is dropped; resources are torn down on every exit path.
    pub async fn run(mut self) -> Result<FinalSummary, SessionError> {
        loop {
            let warning_deadline = self
                .state
                .warning
                .as_ref()
                .map(|w| w.raised_at + self.config.warning_display);

            tokio::select! {
                maybe_command = self.commands_rx.recv() => match maybe_command {
                    Some(SessionCommand::Advance) => self.on_advance(),
                    Some(SessionCommand::End) => {
                        self.on_end().await;
                        break;
                    }
                    Some(SessionCommand::TabHidden) => {
                        if let Some(tab) = &self.tab {
                            tab.report_hidden();
                        }
                    }
                    // Every handle gone: nobody can drive the session anymore
                    None => {
                        info!("Session handle dropped; ending session");
                        break;
                    }
                },
                Some(event) = self.channel_rx.recv() => self.on_channel_event(event),
                Some(event) = self.internal_rx.recv() => {
                    if self.on_internal_event(event).await {
                        break;
                    }
                }
                _ = sleep_until(warning_deadline.unwrap_or_else(Instant::now)),
                        if warning_deadline.is_some() => {
                    self.state.clear_warning();
                    self.publish_view();
                }
            }
        }

        // Hold the final feedback on screen before handing off teardown
        if self.state.is_terminal() {
            sleep(self.config.completion_notice_delay).await;
        }

        self.teardown().await;
        Ok(self.summary())
    }

    /// `Recording → Submitting`: stop capture, wait out the drain grace
    /// period, drain the clip, and run the exchange in a task so channel
    /// events keep merging meanwhile.
    fn on_advance(&mut self) {
        if !self.state.begin_submission() {
            return;
        }
        self.publish_view();

        let recorder = self.recorder.clone();
        let api = Arc::clone(&self.api);
        let grace = self.config.drain_grace;
        let session_id = self.state.context.session_id.clone();
        let question = self.state.context.current_question.clone();
        // Copied at send time, not referenced live
        let report = self.report();
        let tx = self.internal_tx.clone();

        tokio::spawn(async move {
            recorder.stop().await;
            // Let the device flush pending chunks before draining
            sleep(grace).await;
            let clip = match recorder.drain_clip().await {
                Ok(clip) => Some(clip),
                Err(e) => {
                    info!("{}; submitting without video", e);
                    None
                }
            };

            let submission = AnswerSubmission {
                question,
                clip,
                report,
            };
            let result = submit_answer(api.as_ref(), &session_id, submission).await;
            let _ = tx.send(InternalEvent::SubmissionDone(result)).await;
        });
    }

    async fn on_internal_event(&mut self, event: InternalEvent) -> bool {
        match event {
            InternalEvent::PlaybackFinished(outcome) => {
                if !self.state.playback_finished() {
                    return false;
                }
                if outcome == PlaybackOutcome::Failed {
                    debug!("Playback failed; starting capture anyway");
                }
                if let Err(e) = self
                    .recorder
                    .start(Arc::clone(&self.stream), &self.config.preferred_encodings)
                    .await
                {
                    if !e.is_recoverable() {
                        warn!("Capture unavailable with no way back: {}", e);
                        self.on_end().await;
                        return true;
                    }
                    // Recoverable: the answer exchange tolerates a missing clip
                    warn!("Could not start capture: {}", e);
                    self.state.last_error = Some(e.to_string());
                }
                self.publish_view();
                false
            }
            InternalEvent::SubmissionDone(Ok(ExchangeOutcome::Continuation(continuation))) => {
                let next_question = self.state.apply_continuation(continuation);
                self.publish_view();
                Self::spawn_speak(
                    Arc::clone(&self.speech),
                    self.internal_tx.clone(),
                    next_question,
                );
                false
            }
            InternalEvent::SubmissionDone(Ok(ExchangeOutcome::Completed { final_feedback })) => {
                self.complete(final_feedback, Phase::Completed);
                true
            }
            InternalEvent::SubmissionDone(Err(e)) => {
                warn!("Answer exchange failed; awaiting a fresh advance: {}", e);
                self.state.submission_failed(e.to_string());
                self.publish_view();
                false
            }
        }
    }

    fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Proctoring(result) => {
                self.state.apply_proctoring(&result, Instant::now());
            }
            ChannelEvent::TabWarning { count, message } => {
                info!("Tab warning: {} (count {})", message, count);
                self.state.apply_tab_warning(count, message);
            }
            ChannelEvent::Closed(kind) => {
                info!("{} channel closed; continuing without its signals", kind);
            }
        }
        self.publish_view();
    }

    /// Explicit termination from any phase
    async fn on_end(&mut self) {
        info!("Explicit end requested");
        self.recorder.stop().await;

        let feedback = match self.api.end_session(&self.state.context.session_id).await {
            Ok(response) => response.final_feedback.unwrap_or_default(),
            Err(e) => {
                warn!("End exchange failed: {}", e);
                String::new()
            }
        };

        self.complete(feedback, Phase::Ended);
    }

    fn complete(&mut self, final_feedback: String, terminal: Phase) {
        self.state.apply_completion(&final_feedback, terminal);
        self.publish_view();

        if !final_feedback.is_empty() {
            self.final_feedback = Some(final_feedback.clone());
            // Speak the feedback; the outcome no longer matters
            let speech = Arc::clone(&self.speech);
            tokio::spawn(async move {
                let _ = speech.speak(&final_feedback).await;
            });
        }
    }

    /// Release every session resource. Safe to call with parts already
    /// stopped or closed.
    async fn teardown(&mut self) {
        info!("Tearing down session resources");
        self.recorder.stop().await;
        if let Some(channel) = self.proctoring.take() {
            channel.close().await;
        }
        if let Some(channel) = self.tab.take() {
            channel.close().await;
        }
        self.stream.release();
    }

    fn report(&self) -> ProctoringReport {
        ProctoringReport {
            tab_switch_count: self.state.tab_switch_count,
            stats: self.state.stats.clone(),
        }
    }

    fn summary(&self) -> FinalSummary {
        FinalSummary {
            final_feedback: self.final_feedback.clone(),
            questions_reached: self.state.context.question_number,
            conversation: self.state.conversation.clone(),
            report: self.report(),
        }
    }

    fn spawn_speak(speech: Arc<dyn SpeechDriver>, tx: mpsc::Sender<InternalEvent>, text: String) {
        tokio::spawn(async move {
            let outcome = speech.speak(&text).await;
            let _ = tx.send(InternalEvent::PlaybackFinished(outcome)).await;
        });
    }

    fn snapshot(state: &InterviewState) -> SessionView {
        SessionView {
            phase: state.phase,
            question_number: state.context.question_number,
            current_level: state.context.current_level.clone(),
            current_question: state.context.current_question.clone(),
            conversation: state.conversation.clone(),
            stats: state.stats.clone(),
            calibration: state.calibration.clone(),
            tab_switch_count: state.tab_switch_count,
            face_detected: state.face_detected,
            active_alerts: state
                .warning
                .as_ref()
                .map(|w| w.alerts.clone())
                .unwrap_or_default(),
            last_tab_message: state.last_tab_message.clone(),
            last_error: state.last_error.clone(),
        }
    }

    fn publish_view(&self) {
        self.view_tx.send_replace(Self::snapshot(&self.state));
    }
}
