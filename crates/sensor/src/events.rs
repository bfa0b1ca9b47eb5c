//! Push events delivered by a live sensor session.

use serde::Serialize;

use pulsewatch_core::Timestamp;

/// An event pushed by the sensor over the channel registered at
/// [`begin_session`](crate::capability::SensorCapability::begin_session).
///
/// The stream for one session is ordered; after `Ended` or `Errored` no
/// further events arrive for that session.
#[derive(Debug, Clone, Serialize)]
pub enum SensorEvent {
    /// A new heart-rate reading. A `bpm` of `0.0` means no signal.
    Sample { bpm: f64, timestamp: Timestamp },

    /// The sensor closed the session from its side.
    Ended,

    /// The session was lost to a device fault mid-collection.
    Errored {
        /// Human-readable fault description.
        message: String,
    },
}
