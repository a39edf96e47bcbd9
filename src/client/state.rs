//! Connection lifecycle of a live session

use std::fmt;

/// State of a [`LiveSession`](super::LiveSession)
///
/// Transitions only move forward: `Connecting → Open → Closed` or
/// `Connecting → Closed`. A closed session is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting,
    /// Requests may be sent
    Open,
    /// Terminal
    Closed,
}

impl ConnectionState {
    /// Whether requests may be sent
    pub fn is_open(self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Whether the session has ended
    pub fn is_closed(self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}
