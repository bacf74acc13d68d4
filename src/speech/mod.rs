//! Speech playback: question text to audible speech, with completion
//! signaling and a fixed-delay fallback for hosts without speech capability.

pub mod driver;

pub use driver::{
    AudioSink, FixedDelaySpeechDriver, NullSink, PlaybackOutcome, SpeechDriver, TtsSpeechDriver,
};
