//! Interview session management
//!
//! This module provides the session orchestrator and its supporting state:
//! - The phase machine sequencing playback, recording and submission
//! - Conversation history and session context
//! - Aggregated proctoring statistics and calibration state
//! - Session configuration

pub mod config;
pub mod context;
pub mod orchestrator;
pub mod state;
pub mod stats;

pub use config::SessionConfig;
pub use context::{ConversationEntry, SessionContext, Speaker};
pub use orchestrator::{FinalSummary, InterviewSession, SessionCommand, SessionHandle, SessionView};
pub use state::{ActiveWarning, InterviewState, Phase};
pub use stats::{
    CalibrationSnapshot, CalibrationState, ProctoringReport, ProctoringStatistics, StatsSnapshot,
};
