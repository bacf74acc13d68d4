//! Media capture: camera/microphone acquisition, chunked answer recording,
//! and still-frame sampling for the proctoring channel.

pub mod backend;
pub mod recorder;
pub mod synthetic;

pub use backend::{
    select_encoding, MediaBackend, MediaBackendConfig, MediaBackendFactory, MediaChunk,
    MediaSource, MediaStream,
};
pub use recorder::{AnswerRecorder, Clip};
pub use synthetic::SyntheticBackend;
