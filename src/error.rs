use thiserror::Error;

/// Error taxonomy for an interview session.
///
/// Only `PermissionDenied` is fatal to starting a session. Everything else is
/// recoverable: channels simply stop contributing signals, playback failures
/// advance the session anyway, and a failed exchange leaves the session
/// waiting for a fresh advance action.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Camera/microphone permission was refused by the host environment.
    #[error("camera/microphone permission denied")]
    PermissionDenied,

    /// The capture device could not be opened or went away.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A proctoring or tab-activity channel closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// Speech playback did not complete.
    #[error("speech playback failed: {0}")]
    PlaybackFailed(String),

    /// No usable answer clip was collected for this question.
    #[error("no usable answer clip")]
    EmptyAnswer,

    /// A request/response exchange failed (network, non-2xx, malformed body).
    #[error("exchange failed: {0}")]
    ExchangeFailed(String),
}

impl SessionError {
    /// Whether the session can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SessionError::PermissionDenied)
    }
}
