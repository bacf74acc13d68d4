use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::SessionError;

/// One chunk of encoded answer video collected during capture
#[derive(Debug, Clone)]
pub struct MediaChunk {
    /// Encoded bytes for this interval
    pub data: Vec<u8>,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for a media backend
#[derive(Debug, Clone)]
pub struct MediaBackendConfig {
    /// Interval between capture chunks (chunking exists for progressive
    /// upload; chunks are concatenated into one clip at drain time)
    pub chunk_interval: Duration,

    /// Encodings to try for the answer clip, in preference order.
    /// Falls back to the device default when none are supported.
    pub preferred_encodings: Vec<String>,
}

impl Default for MediaBackendConfig {
    fn default() -> Self {
        Self {
            chunk_interval: Duration::from_secs(1),
            preferred_encodings: vec![
                "video/webm;codecs=vp9,opus".to_string(),
                "video/webm;codecs=vp8,opus".to_string(),
                "video/webm".to_string(),
            ],
        }
    }
}

/// Camera/microphone device abstraction
///
/// Implementations:
/// - Synthetic: deterministic in-process device (tests, demo runs)
/// - Platform camera backends plug in behind the same trait
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Acquire the camera/microphone and return a live stream.
    ///
    /// Fails with `PermissionDenied` or `DeviceUnavailable`. The returned
    /// stream is shared read-only by the answer recorder and the proctoring
    /// frame sampler; only the session orchestrator acquires or releases it.
    async fn acquire(&self) -> Result<Arc<dyn MediaStream>, SessionError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// A live camera/microphone stream
#[async_trait::async_trait]
pub trait MediaStream: Send + Sync {
    /// Start chunked capture.
    ///
    /// Returns a channel receiver that will receive one encoded chunk per
    /// chunk interval until capture is stopped.
    async fn start_capture(&self) -> Result<mpsc::Receiver<MediaChunk>, SessionError>;

    /// Stop capture. Idempotent: calling while not capturing is a no-op.
    /// Returns once the device has acknowledged the stop, so pending chunks
    /// have been flushed to the receiver.
    async fn stop_capture(&self);

    /// Whether capture is currently running
    fn is_capturing(&self) -> bool;

    /// Sample one downscaled still frame, encoded as an image, for the
    /// proctoring channel. Returns `None` once the stream is released.
    fn still_frame(&self, width: u32, height: u32) -> Option<Vec<u8>>;

    /// Whether the device can record in the given encoding
    fn supports_encoding(&self, mime: &str) -> bool;

    /// Release the device. Idempotent; no frames may be read afterwards.
    fn release(&self);
}

/// Pick the first supported encoding from the preference list.
///
/// Advisory quality selection only: `None` means record with the device
/// default.
pub fn select_encoding(stream: &dyn MediaStream, preferred: &[String]) -> Option<String> {
    preferred
        .iter()
        .find(|mime| stream.supports_encoding(mime))
        .cloned()
}

/// Media source type
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// Physical camera/microphone
    Camera,
    /// Deterministic in-process device (tests, demo runs)
    Synthetic,
}

/// Media backend factory
pub struct MediaBackendFactory;

impl MediaBackendFactory {
    /// Create a media backend for the given source
    pub fn create(
        source: MediaSource,
        config: MediaBackendConfig,
    ) -> Result<Arc<dyn MediaBackend>, SessionError> {
        match source {
            MediaSource::Synthetic => Ok(Arc::new(super::synthetic::SyntheticBackend::new(config))),
            MediaSource::Camera => Err(SessionError::DeviceUnavailable(
                "no camera backend on this platform".to_string(),
            )),
        }
    }
}
