//! WebSocket channel clients: face proctoring (frames out, detection results
//! in) and tab activity (visibility events out, warning counts in).
//!
//! Both channels deliver their events into one mailbox owned by the session
//! orchestrator; a closed channel stops contributing signals but never fails
//! the interview.

pub mod messages;
pub mod proctoring;
pub mod tab;

pub use messages::{
    ProctoringClientMessage, ProctoringResult, ProctoringServerMessage, TabClientMessage,
    TabServerMessage,
};
pub use proctoring::ProctoringChannel;
pub use tab::TabChannel;

/// Which channel an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Proctoring,
    TabActivity,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Proctoring => write!(f, "proctoring"),
            ChannelKind::TabActivity => write!(f, "tab-activity"),
        }
    }
}

/// Event delivered from a channel client to the orchestrator mailbox
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// A face-proctoring result arrived
    Proctoring(messages::ProctoringResult),

    /// The server reported an updated tab-switch count
    TabWarning { count: u64, message: String },

    /// The channel closed (either end); no reconnection is attempted
    Closed(ChannelKind),
}
