use serde::{Deserialize, Serialize};

/// Aggregated proctoring statistics for one session.
///
/// All counts are non-negative and non-decreasing over a session; the server
/// is the source of truth and the client replaces, never sums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProctoringStatistics {
    pub multiple_faces: u64,
    pub face_coverings: u64,
    pub eye_coverings: u64,
    pub no_face_count: u64,
    pub total_alerts: u64,
}

impl ProctoringStatistics {
    /// Shallow-merge an incoming snapshot: fields present in the snapshot
    /// overwrite, absent fields retain their prior value.
    ///
    /// This is field-wise last-write-wins, not a sum, so duplicate delivery
    /// of the same snapshot is idempotent.
    pub fn merged(&self, incoming: &StatsSnapshot) -> Self {
        Self {
            multiple_faces: incoming.multiple_faces.unwrap_or(self.multiple_faces),
            face_coverings: incoming.face_coverings.unwrap_or(self.face_coverings),
            eye_coverings: incoming.eye_coverings.unwrap_or(self.eye_coverings),
            no_face_count: incoming.no_face_count.unwrap_or(self.no_face_count),
            total_alerts: incoming.total_alerts.unwrap_or(self.total_alerts),
        }
    }
}

/// Partial statistics snapshot as delivered on the wire.
///
/// Every field is optional; the server may send any subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_faces: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_coverings: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_coverings: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_face_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_alerts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_switch_count: Option<u64>,
}

/// Server-side face calibration progress.
///
/// The server completes calibration after a fixed frame count (30); the
/// client treats every snapshot as an authoritative replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationState {
    pub complete: bool,
    pub frames_seen: u32,
    pub face_cover_counter: u32,
    pub eye_cover_counter: u32,
}

impl CalibrationState {
    /// Replace wholesale with the latest snapshot
    pub fn replace_with(&mut self, snapshot: &CalibrationSnapshot) {
        self.complete = snapshot.calibration_complete;
        self.frames_seen = snapshot.calibration_frames;
        self.face_cover_counter = snapshot.face_cover_counter;
        self.eye_cover_counter = snapshot.eye_cover_counter;
    }
}

/// Calibration snapshot as delivered on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationSnapshot {
    #[serde(default)]
    pub calibration_complete: bool,
    #[serde(default)]
    pub calibration_frames: u32,
    #[serde(default)]
    pub face_cover_counter: u32,
    #[serde(default)]
    pub eye_cover_counter: u32,
}

/// Full statistics report attached to exchange requests: the aggregated
/// proctoring counts plus the server-authoritative tab switch count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProctoringReport {
    pub tab_switch_count: u64,
    #[serde(flatten)]
    pub stats: ProctoringStatistics,
}
