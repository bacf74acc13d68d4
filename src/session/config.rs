use std::time::Duration;

/// Configuration for an interview session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Role the candidate is interviewing for
    pub job_role: String,

    /// Candidate display name
    pub candidate_name: String,

    /// Base URL for the proctoring/tab channels; `None` runs the session
    /// without channels (signals simply never arrive)
    pub ws_base_url: Option<String>,

    /// Interval between proctoring still frames
    pub frame_interval: Duration,

    /// Still-frame resolution sent on the proctoring channel
    pub frame_width: u32,
    pub frame_height: u32,

    /// How long a consolidated proctoring warning stays visible
    pub warning_display: Duration,

    /// Grace period between stopping capture and draining the clip, letting
    /// the device flush pending chunks
    pub drain_grace: Duration,

    /// Delay between final feedback and notifying session teardown
    pub completion_notice_delay: Duration,

    /// Minimum clip size; smaller drains are sent as no-answer
    pub min_clip_bytes: usize,

    /// Answer clip encodings in preference order
    pub preferred_encodings: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            job_role: "default".to_string(),
            candidate_name: String::new(),
            ws_base_url: None,
            frame_interval: Duration::from_secs(1),
            frame_width: 320,
            frame_height: 240,
            warning_display: Duration::from_secs(3),
            drain_grace: Duration::from_millis(1500),
            completion_notice_delay: Duration::from_secs(5),
            min_clip_bytes: 100,
            preferred_encodings: vec![
                "video/webm;codecs=vp9,opus".to_string(),
                "video/webm;codecs=vp8,opus".to_string(),
                "video/webm".to_string(),
            ],
        }
    }
}
