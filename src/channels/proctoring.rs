use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::messages::{wire_timestamp, ProctoringClientMessage, ProctoringServerMessage};
use super::{ChannelEvent, ChannelKind};
use crate::error::SessionError;
use crate::media::MediaStream;

/// Frame sampler settings for the proctoring channel
#[derive(Debug, Clone)]
pub struct FrameSamplerConfig {
    /// Interval between sampled frames
    pub interval: Duration,
    /// Downscaled frame resolution
    pub width: u32,
    pub height: u32,
}

impl Default for FrameSamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            width: 320,
            height: 240,
        }
    }
}

/// Client for the face-proctoring channel.
///
/// While open, samples one downscaled still frame per interval from the
/// shared live stream and sends it; frames are best-effort and may be lost.
/// Incoming proctoring results are delivered to the session mailbox. On
/// close (either end) the sampler stops and no reconnection is attempted.
pub struct ProctoringChannel {
    open: Arc<AtomicBool>,
    send_task: JoinHandle<()>,
    recv_task: JoinHandle<()>,
    sampler_task: JoinHandle<()>,
}

impl ProctoringChannel {
    pub async fn connect(
        url: &str,
        stream: Arc<dyn MediaStream>,
        events: mpsc::Sender<ChannelEvent>,
        config: FrameSamplerConfig,
    ) -> Result<Self, SessionError> {
        info!("Connecting proctoring channel: {}", url);

        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| SessionError::ChannelClosed(format!("proctoring connect: {e}")))?;

        let (mut write, mut read) = ws.split();
        let open = Arc::new(AtomicBool::new(true));

        // Outbound frames; a shallow queue because frames are disposable
        let (out_tx, mut out_rx) = mpsc::channel::<ProctoringClientMessage>(16);

        let send_open = Arc::clone(&open);
        let send_task = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match serde_json::to_string(&msg) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            warn!("Proctoring send failed: {}", e);
                            break;
                        }
                    }
                    Err(e) => error!("Failed to serialize frame message: {}", e),
                }
            }
            send_open.store(false, Ordering::SeqCst);
        });

        let sampler_open = Arc::clone(&open);
        let sampler_cfg = config.clone();
        let sampler_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sampler_cfg.interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if !sampler_open.load(Ordering::SeqCst) {
                    break;
                }

                let Some(image) = stream.still_frame(sampler_cfg.width, sampler_cfg.height) else {
                    continue;
                };

                let frame = ProctoringClientMessage::VideoFrame {
                    data: base64::engine::general_purpose::STANDARD.encode(image),
                    timestamp: wire_timestamp(),
                    width: sampler_cfg.width,
                    height: sampler_cfg.height,
                };

                // No queueing, no backpressure: a frame that cannot be sent
                // right now is dropped
                if out_tx.try_send(frame).is_err() {
                    debug!("Dropped proctoring frame (channel busy or closed)");
                }
            }

            info!("Proctoring frame sampler stopped");
        });

        let recv_open = Arc::clone(&open);
        let recv_task = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Proctoring channel read failed: {}", e);
                        break;
                    }
                };

                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<ProctoringServerMessage>(&text) {
                            Ok(ProctoringServerMessage::ProctoringResult(result)) => {
                                if events.send(ChannelEvent::Proctoring(result)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => debug!("Ignoring unrecognized proctoring message: {}", e),
                        }
                    }
                    Message::Close(reason) => {
                        info!("Proctoring channel closed by server: {:?}", reason);
                        break;
                    }
                    _ => {}
                }
            }

            recv_open.store(false, Ordering::SeqCst);
            let _ = events.send(ChannelEvent::Closed(ChannelKind::Proctoring)).await;
        });

        info!("Proctoring channel open");

        Ok(Self {
            open,
            send_task,
            recv_task,
            sampler_task,
        })
    }

    /// Close the channel and cancel the frame sampler
    pub async fn close(self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!("Closing proctoring channel");
        }
        self.sampler_task.abort();
        self.send_task.abort();
        self.recv_task.abort();
    }
}
