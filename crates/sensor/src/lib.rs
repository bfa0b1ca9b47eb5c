//! The sensor-capability boundary of the pulsewatch core.
//!
//! The monitoring core never talks to sensor hardware directly; it consumes
//! the [`SensorCapability`] trait:
//!
//! - [`SensorCapability`] — authorize, begin, and end a sensor session.
//! - [`SensorEvent`] — the push stream a live session delivers (samples,
//!   session end, async faults) over a channel registered at begin time.
//! - [`ScriptedSensor`] — a deterministic in-process implementation used by
//!   tests and the daemon.

pub mod capability;
pub mod error;
pub mod events;
pub mod scripted;

pub use capability::{SensorCapability, SessionHandle};
pub use error::SensorError;
pub use events::SensorEvent;
pub use scripted::{ScriptedSensor, ScriptedSensorConfig};
