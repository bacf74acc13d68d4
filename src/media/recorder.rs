use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::backend::{select_encoding, MediaStream};
use crate::error::SessionError;

/// A finalized answer recording: all chunks from one answer interval
/// concatenated into a single clip
#[derive(Debug, Clone)]
pub struct Clip {
    pub data: Vec<u8>,
    /// Encoding the clip was recorded with, when one was selected
    pub mime_type: Option<String>,
}

/// Collects capture chunks for one answer at a time.
///
/// Exactly one recording may be active; starting while active is a no-op.
/// `stop` is idempotent, and `drain_clip` consumes the buffer so a double
/// stop/drain produces one clip, not two.
#[derive(Clone)]
pub struct AnswerRecorder {
    /// Minimum clip size; smaller drains are treated as empty/corrupt
    min_clip_bytes: usize,

    active: Arc<AtomicBool>,

    /// Chunks concatenated as they arrive
    buffer: Arc<Mutex<Vec<u8>>>,

    /// Encoding selected for the recording in progress
    mime_type: Arc<Mutex<Option<String>>>,

    /// Stream the current recording reads from
    stream: Arc<Mutex<Option<Arc<dyn MediaStream>>>>,

    /// Handle for the chunk collection task
    collect_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AnswerRecorder {
    pub fn new(min_clip_bytes: usize) -> Self {
        Self {
            min_clip_bytes,
            active: Arc::new(AtomicBool::new(false)),
            buffer: Arc::new(Mutex::new(Vec::new())),
            mime_type: Arc::new(Mutex::new(None)),
            stream: Arc::new(Mutex::new(None)),
            collect_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Start recording from the given stream.
    ///
    /// A recording that is already active is left untouched: the previous
    /// clip must be consumed before a new one may begin.
    pub async fn start(
        &self,
        stream: Arc<dyn MediaStream>,
        preferred_encodings: &[String],
    ) -> Result<(), SessionError> {
        if self.active.swap(true, Ordering::SeqCst) {
            warn!("Recording already active; ignoring start");
            return Ok(());
        }

        // Reset the buffer for the new answer interval
        self.buffer.lock().await.clear();

        let encoding = select_encoding(stream.as_ref(), preferred_encodings);
        match &encoding {
            Some(mime) => info!("Recording with encoding {}", mime),
            None => info!("No preferred encoding supported; using device default"),
        }
        *self.mime_type.lock().await = encoding;

        let mut chunk_rx = match stream.start_capture().await {
            Ok(rx) => rx,
            Err(e) => {
                self.active.store(false, Ordering::SeqCst);
                error!("Failed to start capture: {}", e);
                return Err(e);
            }
        };

        *self.stream.lock().await = Some(Arc::clone(&stream));

        let buffer = Arc::clone(&self.buffer);
        let task = tokio::spawn(async move {
            let mut chunks = 0usize;
            while let Some(chunk) = chunk_rx.recv().await {
                let mut buf = buffer.lock().await;
                buf.extend_from_slice(&chunk.data);
                chunks += 1;
            }
            info!("Chunk collection finished ({} chunks)", chunks);
        });

        {
            let mut handle = self.collect_task.lock().await;
            *handle = Some(task);
        }

        info!("Recording started");
        Ok(())
    }

    /// Stop recording. Safe to call when not recording.
    ///
    /// Returns once the device acknowledged the stop and the collection task
    /// drained; only then is `drain_clip` guaranteed complete.
    pub async fn stop(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Stopping recording");

        if let Some(stream) = self.stream.lock().await.take() {
            stream.stop_capture().await;
        }

        let mut handle = self.collect_task.lock().await;
        if let Some(task) = handle.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("Chunk collection task panicked: {}", e);
                }
            }
        }
    }

    /// Whether a recording is currently active
    pub fn is_recording(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Consume the buffer into a clip.
    ///
    /// Must be called after `stop` has returned. Fails with `EmptyAnswer`
    /// when fewer than the minimum bytes were collected, filtering empty or
    /// corrupt captures.
    pub async fn drain_clip(&self) -> Result<Clip, SessionError> {
        let data = std::mem::take(&mut *self.buffer.lock().await);
        let mime_type = self.mime_type.lock().await.take();

        if data.len() < self.min_clip_bytes {
            if !data.is_empty() {
                warn!(
                    "Clip too small ({} bytes < {} minimum); discarding",
                    data.len(),
                    self.min_clip_bytes
                );
            }
            return Err(SessionError::EmptyAnswer);
        }

        info!("Drained clip: {} bytes", data.len());
        Ok(Clip { data, mime_type })
    }
}
