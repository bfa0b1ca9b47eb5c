//! Session lifecycle, alarm coordination, and the monitoring facade.
//!
//! This crate composes the pulsewatch core into a running monitor:
//!
//! - [`SessionController`] — owns the sensor-session state machine.
//! - [`AlarmCoordinator`] — owns the alarm state and sequences the output
//!   sink on raise/clear edges.
//! - [`Monitor`] — the facade: one control-loop task serializes every
//!   transition and broadcasts [`MonitoringSnapshot`]s to subscribers.
//! - [`OutputSink`] — the injected audio/haptic boundary.

pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod facade;
pub mod output;
pub mod snapshot;

pub use config::MonitorConfig;
pub use controller::SessionController;
pub use coordinator::{AlarmCoordinator, AlarmState};
pub use error::MonitorError;
pub use facade::Monitor;
pub use output::{HapticKind, LogSink, OutputSink};
pub use snapshot::{AlarmEvent, Fault, MonitoringSnapshot};
