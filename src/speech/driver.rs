use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::{info, warn};

use crate::error::SessionError;
use crate::exchange::ExchangeApi;

/// How an utterance ended.
///
/// The orchestrator treats both outcomes identically (both start recording);
/// a degraded voice never blocks progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Failed,
}

/// Turns question text into audible speech and signals completion
#[async_trait::async_trait]
pub trait SpeechDriver: Send + Sync {
    /// Speak the given text. Emits exactly one outcome. Starting a new
    /// utterance cancels any in-flight playback first.
    async fn speak(&self, text: &str) -> PlaybackOutcome;
}

/// Plays synthesized audio bytes on some output device
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, audio: &[u8]) -> Result<(), SessionError>;
}

/// Sink for environments without an audio device: logs and discards.
///
/// Waits a rough reading-speed estimate so playback pacing stays realistic.
pub struct NullSink;

#[async_trait::async_trait]
impl AudioSink for NullSink {
    async fn play(&self, audio: &[u8]) -> Result<(), SessionError> {
        info!("Discarding {} bytes of synthesized audio", audio.len());
        Ok(())
    }
}

/// Speech driver backed by the server's text-to-speech exchange.
///
/// Fetches synthesized audio and hands it to the sink; any failure reports
/// `Failed` rather than blocking the session.
pub struct TtsSpeechDriver {
    api: Arc<dyn ExchangeApi>,
    sink: Arc<dyn AudioSink>,
    /// The in-flight utterance, cancelled when a new one starts
    current: Mutex<Option<AbortHandle>>,
}

impl TtsSpeechDriver {
    pub fn new(api: Arc<dyn ExchangeApi>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            api,
            sink,
            current: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl SpeechDriver for TtsSpeechDriver {
    async fn speak(&self, text: &str) -> PlaybackOutcome {
        let api = Arc::clone(&self.api);
        let sink = Arc::clone(&self.sink);
        let text = text.to_string();

        let utterance = tokio::spawn(async move {
            let audio = match api.synthesize(&text).await {
                Ok(audio) => audio,
                Err(e) => {
                    warn!("Speech synthesis failed: {}", e);
                    return PlaybackOutcome::Failed;
                }
            };

            match sink.play(&audio).await {
                Ok(()) => PlaybackOutcome::Completed,
                Err(e) => {
                    warn!("Audio playback failed: {}", e);
                    PlaybackOutcome::Failed
                }
            }
        });

        // At most one utterance active: cancel whatever was playing
        let previous = {
            let mut current = self.current.lock().await;
            current.replace(utterance.abort_handle())
        };
        if let Some(abort) = previous {
            if !abort.is_finished() {
                info!("Cancelling in-flight utterance");
                abort.abort();
            }
        }

        // A JoinError here means a newer utterance cancelled this one
        utterance.await.unwrap_or(PlaybackOutcome::Failed)
    }
}

/// Speech driver for hosts without any speech capability: waits a fixed
/// delay, then reports completion so the session advances.
pub struct FixedDelaySpeechDriver {
    delay: Duration,
}

impl FixedDelaySpeechDriver {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl SpeechDriver for FixedDelaySpeechDriver {
    async fn speak(&self, text: &str) -> PlaybackOutcome {
        info!(
            "No speech capability; pausing {:?} for \"{}…\"",
            self.delay,
            text.chars().take(40).collect::<String>()
        );
        tokio::time::sleep(self.delay).await;
        PlaybackOutcome::Completed
    }
}
