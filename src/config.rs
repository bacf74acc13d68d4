use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Base URL for the interview exchange API (e.g. "http://localhost:8000")
    pub http_url: String,

    /// Base URL for the proctoring/tab channels (e.g. "ws://localhost:8000")
    pub ws_url: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaConfig {
    /// Still-frame width sent on the proctoring channel
    pub frame_width: u32,

    /// Still-frame height sent on the proctoring channel
    pub frame_height: u32,

    /// Seconds between recording chunks and between proctoring frames
    pub chunk_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    /// Whether to fetch synthesized audio from the server's TTS endpoint
    pub tts_enabled: bool,

    /// Delay before reporting playback complete when no TTS is available
    pub fallback_delay_secs: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
