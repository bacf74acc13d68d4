use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{MediaBackend, MediaBackendConfig, MediaChunk, MediaStream};
use crate::error::SessionError;

/// Deterministic in-process media device.
///
/// Produces one chunk of synthetic bytes per chunk interval and fixed-pattern
/// still frames, so sessions can run end to end without a physical camera.
pub struct SyntheticBackend {
    config: MediaBackendConfig,
    /// Bytes per capture chunk
    chunk_bytes: usize,
}

impl SyntheticBackend {
    pub fn new(config: MediaBackendConfig) -> Self {
        Self {
            config,
            chunk_bytes: 4096,
        }
    }

    /// Override the per-chunk payload size
    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes;
        self
    }
}

#[async_trait::async_trait]
impl MediaBackend for SyntheticBackend {
    async fn acquire(&self) -> Result<Arc<dyn MediaStream>, SessionError> {
        info!("Acquiring synthetic media device");
        Ok(Arc::new(SyntheticStream {
            config: self.config.clone(),
            chunk_bytes: self.chunk_bytes,
            capturing: AtomicBool::new(false),
            released: AtomicBool::new(false),
            capture_task: Mutex::new(None),
        }))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

pub struct SyntheticStream {
    config: MediaBackendConfig,
    chunk_bytes: usize,
    capturing: AtomicBool,
    released: AtomicBool,
    capture_task: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait::async_trait]
impl MediaStream for SyntheticStream {
    async fn start_capture(&self) -> Result<mpsc::Receiver<MediaChunk>, SessionError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(SessionError::DeviceUnavailable(
                "stream already released".to_string(),
            ));
        }

        if self.capturing.swap(true, Ordering::SeqCst) {
            return Err(SessionError::DeviceUnavailable(
                "capture already active".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(64);
        let interval = self.config.chunk_interval;
        let chunk_bytes = self.chunk_bytes;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately; skip it so chunks pace correctly
            ticker.tick().await;

            let mut elapsed_ms: u64 = 0;
            let mut sequence: u8 = 0;

            loop {
                ticker.tick().await;
                elapsed_ms += interval.as_millis() as u64;

                let chunk = MediaChunk {
                    data: vec![sequence; chunk_bytes],
                    timestamp_ms: elapsed_ms,
                };
                sequence = sequence.wrapping_add(1);

                if tx.send(chunk).await.is_err() {
                    // Receiver dropped; capture is over
                    break;
                }
            }
        });

        {
            let mut handle = self.capture_task.lock().await;
            *handle = Some(task);
        }

        info!(
            "Synthetic capture started ({}B chunks every {:?})",
            self.chunk_bytes, interval
        );

        Ok(rx)
    }

    async fn stop_capture(&self) {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return;
        }

        let mut handle = self.capture_task.lock().await;
        if let Some(task) = handle.take() {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Capture task ended abnormally: {}", e);
                }
            }
        }

        info!("Synthetic capture stopped");
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn still_frame(&self, width: u32, height: u32) -> Option<Vec<u8>> {
        if self.released.load(Ordering::SeqCst) {
            return None;
        }

        // Fixed gray pattern sized to the requested resolution, stamped with
        // a minimal JPEG-style prefix so the payload is recognizably an image
        let mut frame = vec![0xFFu8, 0xD8, 0xFF, 0xE0];
        frame.resize((width * height / 128) as usize + 4, 0x80);
        Some(frame)
    }

    fn supports_encoding(&self, mime: &str) -> bool {
        mime.starts_with("video/webm")
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.capturing.store(false, Ordering::SeqCst);
        if let Ok(mut handle) = self.capture_task.try_lock() {
            if let Some(task) = handle.take() {
                task.abort();
            }
        }
        info!("Synthetic media device released");
    }
}
