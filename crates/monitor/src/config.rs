//! Tunable parameters for a [`Monitor`](crate::facade::Monitor).

use pulsewatch_core::AlarmPolicy;

/// Configuration handed to [`Monitor::start`](crate::facade::Monitor::start).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// The critical-threshold policy applied to every sample.
    pub policy: AlarmPolicy,
    /// Buffer size of the command/event stream feeding the control loop.
    pub command_capacity: usize,
    /// Buffer size of the per-session sensor event channel.
    pub sensor_capacity: usize,
    /// Buffer size of the snapshot broadcast channel. Slow subscribers
    /// beyond this observe `Lagged`, never block the loop.
    pub snapshot_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            policy: AlarmPolicy::default(),
            command_capacity: 64,
            sensor_capacity: 256,
            snapshot_capacity: 256,
        }
    }
}
