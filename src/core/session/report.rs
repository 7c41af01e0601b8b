use serde::{Deserialize, Serialize};
use std::fmt;

/// How a session loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The peer sent the sentinel line
    SentinelReceived,
    /// The local side sent the sentinel line
    SentinelSent,
    /// The peer closed the stream without the sentinel
    PeerClosed,
    /// The server was shut down while the session was still open
    Interrupted,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::SentinelReceived => write!(f, "sentinel received"),
            SessionOutcome::SentinelSent => write!(f, "sentinel sent"),
            SessionOutcome::PeerClosed => write!(f, "peer closed"),
            SessionOutcome::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    /// Lines echoed by the server or replies printed by the client
    pub lines_exchanged: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}
