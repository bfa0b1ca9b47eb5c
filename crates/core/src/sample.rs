//! Heart-rate telemetry values.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

/// A single heart-rate reading delivered by the sensor.
///
/// Immutable once constructed. A `bpm` of exactly `0.0` means the sensor
/// produced no signal for this interval, not that the heart stopped; the
/// alarm policy treats it as [`Verdict::Normal`](crate::policy::Verdict).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeartRateSample {
    /// Heart rate in beats per minute. Finite and non-negative.
    pub bpm: f64,
    /// When the sensor recorded the reading (UTC).
    pub timestamp: Timestamp,
}

impl HeartRateSample {
    /// Create a sample, rejecting non-finite or negative readings.
    pub fn new(bpm: f64, timestamp: Timestamp) -> Result<Self, CoreError> {
        if !bpm.is_finite() {
            return Err(CoreError::Validation(format!(
                "bpm must be finite, got {bpm}"
            )));
        }
        if bpm < 0.0 {
            return Err(CoreError::Validation(format!(
                "bpm must not be negative, got {bpm}"
            )));
        }
        Ok(Self { bpm, timestamp })
    }

    /// Whether this reading represents sensor dropout rather than a
    /// physiological measurement.
    pub fn is_no_signal(&self) -> bool {
        self.bpm == 0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
