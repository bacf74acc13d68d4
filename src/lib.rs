pub mod channels;
pub mod config;
pub mod error;
pub mod exchange;
pub mod media;
pub mod session;
pub mod speech;

pub use channels::{
    ChannelEvent, ChannelKind, ProctoringChannel, ProctoringResult, TabChannel,
};
pub use config::Config;
pub use error::SessionError;
pub use exchange::{ExchangeApi, ExchangeOutcome, HttpExchangeClient};
pub use media::{
    AnswerRecorder, Clip, MediaBackend, MediaBackendConfig, MediaBackendFactory, MediaSource,
    MediaStream, SyntheticBackend,
};
pub use session::{
    FinalSummary, InterviewSession, Phase, ProctoringStatistics, SessionConfig, SessionHandle,
    SessionView,
};
pub use speech::{FixedDelaySpeechDriver, PlaybackOutcome, SpeechDriver, TtsSpeechDriver};
