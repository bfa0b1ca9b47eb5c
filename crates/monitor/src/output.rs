//! The audio/haptic output boundary.
//!
//! The alarm coordinator is the only writer to the sink, which keeps
//! double-start races structurally impossible. Implementations are expected
//! to be idempotent: a second `start_alert` while sounding, or a
//! `stop_alert` while silent, must be harmless.

/// Kind of haptic pulse to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticKind {
    /// Played once when a critical alarm raises.
    Notification,
    /// Played once when an acknowledgment gesture commits.
    Success,
}

impl HapticKind {
    /// String representation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            HapticKind::Notification => "notification",
            HapticKind::Success => "success",
        }
    }
}

/// Fire-and-forget alert output (looping audio plus discrete haptics).
pub trait OutputSink: Send + Sync {
    /// Begin the sustained (looping) critical alert.
    fn start_alert(&self);

    /// Stop the sustained alert.
    fn stop_alert(&self);

    /// Play a single haptic pulse.
    fn pulse_haptic(&self, kind: HapticKind);
}

/// Sink that logs instead of driving hardware. Used by the daemon and as a
/// stand-in wherever no playback device is wired up.
pub struct LogSink;

impl OutputSink for LogSink {
    fn start_alert(&self) {
        tracing::info!("Critical alert output started");
    }

    fn stop_alert(&self) {
        tracing::info!("Critical alert output stopped");
    }

    fn pulse_haptic(&self, kind: HapticKind) {
        tracing::info!(kind = kind.as_str(), "Haptic pulse");
    }
}
