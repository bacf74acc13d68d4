use serde::{Deserialize, Serialize};

use crate::session::stats::{CalibrationSnapshot, StatsSnapshot};

/// Messages sent on the proctoring channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProctoringClientMessage {
    /// One downscaled still frame from the live stream
    VideoFrame {
        /// Base64-encoded image bytes
        data: String,
        /// Client timestamp, seconds since the Unix epoch
        timestamp: f64,
        width: u32,
        height: u32,
    },
}

/// One face-proctoring result from the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProctoringResult {
    /// Whether a face was detected in the analyzed frame
    pub detected: bool,

    /// Alert strings for this frame; each delivery replaces the previous
    /// list, it does not append
    #[serde(default)]
    pub alerts: Vec<String>,

    /// Calibration snapshot; replaces the local state wholesale when present
    #[serde(default)]
    pub proctoring_data: Option<CalibrationSnapshot>,

    /// Statistics snapshot; shallow-merged into the running totals
    #[serde(default)]
    pub session_stats: Option<StatsSnapshot>,

    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Messages received on the proctoring channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProctoringServerMessage {
    ProctoringResult(ProctoringResult),
}

/// Messages sent on the tab-activity channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabClientMessage {
    /// The page transitioned into the hidden state
    TabSwitch {
        /// Client timestamp, seconds since the Unix epoch
        timestamp: f64,
    },
}

/// Messages received on the tab-activity channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabServerMessage {
    /// Authoritative running tab-switch count; the client replaces its local
    /// count, it never increments
    TabWarning { count: u64, message: String },
}

/// Client timestamp in the wire format both channels use
pub fn wire_timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
