//! Read-only projections broadcast to subscribers.

use serde::Serialize;
use uuid::Uuid;

use pulsewatch_core::{HeartRateSample, SessionState, Timestamp};

use crate::coordinator::AlarmState;

/// Why a session is in `Failed`.
///
/// Kept distinguishable so a retry path can be offered for denials and
/// start failures but not conflated with mid-collection interruptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    /// Access to heart-rate data was refused.
    AuthorizationDenied,
    /// The sensor session could not be opened.
    StartFailure,
    /// The sensor failed asynchronously mid-collection.
    Interrupted,
}

/// Value emitted when a critical alarm raises.
#[derive(Debug, Clone, Serialize)]
pub struct AlarmEvent {
    pub id: Uuid,
    /// The reading that tripped the alarm.
    pub bpm: f64,
    /// When that reading was recorded.
    pub timestamp: Timestamp,
}

impl AlarmEvent {
    pub fn new(sample: &HeartRateSample) -> Self {
        Self {
            id: Uuid::new_v4(),
            bpm: sample.bpm,
            timestamp: sample.timestamp,
        }
    }
}

/// Projection of the monitor's observable state.
///
/// Rebuilt and broadcast on every sample and every state transition; it has
/// no lifecycle of its own.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSnapshot {
    /// Most recent reading, `0.0` when no session is collecting.
    pub current_bpm: f64,
    pub session_state: SessionState,
    pub alarm_state: AlarmState,
    /// Present iff `session_state` is `Failed`.
    pub fault: Option<Fault>,
    /// When this projection was built (UTC).
    pub timestamp: Timestamp,
}
