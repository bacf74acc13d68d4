use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::messages::{wire_timestamp, TabClientMessage, TabServerMessage};
use super::{ChannelEvent, ChannelKind};
use crate::error::SessionError;

/// Client for the tab-activity channel.
///
/// The host visibility signal is the only outbound trigger: each transition
/// into the hidden state sends one timestamped event, with no acknowledgment
/// required. Inbound warnings carry the server's authoritative running count.
pub struct TabChannel {
    open: Arc<AtomicBool>,
    out_tx: mpsc::Sender<TabClientMessage>,
    send_task: JoinHandle<()>,
    recv_task: JoinHandle<()>,
}

impl TabChannel {
    pub async fn connect(
        url: &str,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<Self, SessionError> {
        info!("Connecting tab-activity channel: {}", url);

        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| SessionError::ChannelClosed(format!("tab-activity connect: {e}")))?;

        let (mut write, mut read) = ws.split();
        let open = Arc::new(AtomicBool::new(true));

        let (out_tx, mut out_rx) = mpsc::channel::<TabClientMessage>(16);

        let send_open = Arc::clone(&open);
        let send_task = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match serde_json::to_string(&msg) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            warn!("Tab-activity send failed: {}", e);
                            break;
                        }
                    }
                    Err(e) => error!("Failed to serialize tab event: {}", e),
                }
            }
            send_open.store(false, Ordering::SeqCst);
        });

        let recv_open = Arc::clone(&open);
        let recv_task = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Tab-activity channel read failed: {}", e);
                        break;
                    }
                };

                match message {
                    Message::Text(text) => match serde_json::from_str::<TabServerMessage>(&text) {
                        Ok(TabServerMessage::TabWarning { count, message }) => {
                            if events
                                .send(ChannelEvent::TabWarning { count, message })
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(e) => debug!("Ignoring unrecognized tab message: {}", e),
                    },
                    Message::Close(reason) => {
                        info!("Tab-activity channel closed by server: {:?}", reason);
                        break;
                    }
                    _ => {}
                }
            }

            recv_open.store(false, Ordering::SeqCst);
            let _ = events.send(ChannelEvent::Closed(ChannelKind::TabActivity)).await;
        });

        info!("Tab-activity channel open");

        Ok(Self {
            open,
            out_tx,
            send_task,
            recv_task,
        })
    }

    /// Report a transition into the hidden state.
    ///
    /// Dropped silently when the channel is not open; the send is considered
    /// successful without acknowledgment.
    pub fn report_hidden(&self) {
        if !self.open.load(Ordering::SeqCst) {
            debug!("Tab-activity channel closed; dropping visibility event");
            return;
        }

        let event = TabClientMessage::TabSwitch {
            timestamp: wire_timestamp(),
        };

        if self.out_tx.try_send(event).is_err() {
            debug!("Dropped tab visibility event (channel busy or closed)");
        }
    }

    /// Close the channel
    pub async fn close(self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!("Closing tab-activity channel");
        }
        self.send_task.abort();
        self.recv_task.abort();
    }
}
