//! Sensor-session lifecycle states.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of a sensor session.
///
/// Owned exclusively by the session controller; every transition goes
/// through its methods. `Ended` and `Failed` are terminal: monitoring again
/// requires an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session exists and none is being set up.
    Idle,
    /// Authorization and session begin are in flight.
    Authorizing,
    /// The sensor is collecting samples.
    Active,
    /// Collection is suspended but the session is still open.
    Paused,
    /// The session was finalized deliberately.
    Ended,
    /// The session was lost to a denial, a start error, or a sensor fault.
    Failed,
}

impl SessionState {
    /// Whether the state admits no further transitions except reset.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Ended | SessionState::Failed)
    }

    /// Whether an open sensor session exists (samples may arrive and an
    /// alarm may sound).
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Active | SessionState::Paused)
    }

    /// String representation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Authorizing => "authorizing",
            SessionState::Active => "active",
            SessionState::Paused => "paused",
            SessionState::Ended => "ended",
            SessionState::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
