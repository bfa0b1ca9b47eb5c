//! Critical-threshold evaluation of heart-rate samples.
//!
//! The policy is a pure function of the sample and a configured threshold.
//! Two named tiers exist because the acceptable floor differs between an
//! ambient (watch worn through the day) and a supervised (clinical
//! observation) context; the threshold is always explicit configuration,
//! never a literal at a call site.

use serde::Serialize;

use crate::error::CoreError;
use crate::sample::HeartRateSample;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Critical floor for the ambient tier: a waking heart rate at or below
/// this is treated as an emergency.
pub const AMBIENT_THRESHOLD_BPM: f64 = 60.0;

/// Critical floor for the supervised tier. Far stricter than ambient;
/// intended for contexts where low resting rates are expected and only a
/// collapse should alarm.
pub const SUPERVISED_THRESHOLD_BPM: f64 = 25.0;

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Per-sample classification produced by [`AlarmPolicy::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The reading is above the threshold, or the sensor produced no signal.
    Normal,
    /// The reading is at or below the critical threshold.
    Critical,
}

// ---------------------------------------------------------------------------
// ThresholdTier
// ---------------------------------------------------------------------------

/// Named monitoring contexts with predefined critical thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdTier {
    /// Everyday wear; alarms at [`AMBIENT_THRESHOLD_BPM`].
    Ambient,
    /// Supervised observation; alarms at [`SUPERVISED_THRESHOLD_BPM`].
    Supervised,
}

impl ThresholdTier {
    /// The critical threshold for this tier, in beats per minute.
    pub fn threshold_bpm(&self) -> f64 {
        match self {
            ThresholdTier::Ambient => AMBIENT_THRESHOLD_BPM,
            ThresholdTier::Supervised => SUPERVISED_THRESHOLD_BPM,
        }
    }

    /// String representation for configuration and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdTier::Ambient => "ambient",
            ThresholdTier::Supervised => "supervised",
        }
    }

    /// Parse from a configuration string, defaulting to `Ambient` for
    /// unknown values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "supervised" => ThresholdTier::Supervised,
            _ => ThresholdTier::Ambient,
        }
    }
}

// ---------------------------------------------------------------------------
// AlarmPolicy
// ---------------------------------------------------------------------------

/// Stateless critical-threshold policy.
///
/// A sample is `Critical` iff `0.0 < bpm <= threshold`. A `bpm` of exactly
/// zero is sensor dropout and never alarms.
#[derive(Debug, Clone)]
pub struct AlarmPolicy {
    threshold_bpm: f64,
}

impl AlarmPolicy {
    /// Build a policy for a named tier.
    pub fn for_tier(tier: ThresholdTier) -> Self {
        Self {
            threshold_bpm: tier.threshold_bpm(),
        }
    }

    /// Build a policy with a custom threshold.
    ///
    /// The threshold must be finite and positive. A value that matches
    /// neither named tier is accepted but logged, so a drifting
    /// configuration is visible instead of silently absorbed.
    pub fn with_threshold(threshold_bpm: f64) -> Result<Self, CoreError> {
        if !threshold_bpm.is_finite() || threshold_bpm <= 0.0 {
            return Err(CoreError::Validation(format!(
                "threshold_bpm must be finite and positive, got {threshold_bpm}"
            )));
        }
        if threshold_bpm != AMBIENT_THRESHOLD_BPM && threshold_bpm != SUPERVISED_THRESHOLD_BPM {
            tracing::warn!(
                threshold_bpm,
                ambient = AMBIENT_THRESHOLD_BPM,
                supervised = SUPERVISED_THRESHOLD_BPM,
                "Custom alarm threshold matches neither named tier",
            );
        }
        Ok(Self { threshold_bpm })
    }

    /// The configured critical threshold in beats per minute.
    pub fn threshold_bpm(&self) -> f64 {
        self.threshold_bpm
    }

    /// Classify a single sample.
    pub fn evaluate(&self, sample: &HeartRateSample) -> Verdict {
        if sample.is_no_signal() {
            return Verdict::Normal;
        }
        if sample.bpm <= self.threshold_bpm {
            Verdict::Critical
        } else {
            Verdict::Normal
        }
    }
}

impl Default for AlarmPolicy {
    fn default() -> Self {
        Self::for_tier(ThresholdTier::Ambient)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
