//! The sensor-session state machine.
//!
//! [`SessionController`] is the exclusive owner of the [`SessionState`] and
//! of the live [`SessionHandle`]; no other component may start or stop the
//! sensor session. All methods are invoked from the facade's control loop,
//! so transitions never race.
//!
//! Authorization and session begin run outside the controller (the loop
//! spawns them and posts the outcome back); the controller only records
//! the `Authorizing` phase and consumes the resolution via
//! [`complete_start`](SessionController::complete_start). Calling
//! [`end`](SessionController::end) while a start is in flight defers
//! finalization: the state converges to `Ended` as soon as the in-flight
//! operation resolves, and any session it opened is closed immediately.

use std::sync::Arc;

use pulsewatch_core::SessionState;
use pulsewatch_sensor::{SensorCapability, SensorError, SessionHandle};

use crate::error::MonitorError;
use crate::snapshot::Fault;

pub struct SessionController {
    capability: Arc<dyn SensorCapability>,
    state: SessionState,
    handle: Option<SessionHandle>,
    current_bpm: f64,
    fault: Option<Fault>,
    end_requested: bool,
}

impl SessionController {
    pub fn new(capability: Arc<dyn SensorCapability>) -> Self {
        Self {
            capability,
            state: SessionState::Idle,
            handle: None,
            current_bpm: 0.0,
            fault: None,
            end_requested: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_bpm(&self) -> f64 {
        self.current_bpm
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// A clone of the sensor capability, for spawning the start sequence.
    pub fn capability(&self) -> Arc<dyn SensorCapability> {
        Arc::clone(&self.capability)
    }

    /// Enter `Authorizing` from `Idle`.
    ///
    /// Returns `Ok(true)` when the caller should run the authorization and
    /// begin sequence, `Ok(false)` when a start is already under way or the
    /// session is already live (idempotent no-op). Terminal states require
    /// [`reset`](SessionController::reset) first.
    pub fn begin_authorizing(&mut self) -> Result<bool, MonitorError> {
        match self.state {
            SessionState::Idle => {
                self.fault = None;
                self.state = SessionState::Authorizing;
                tracing::info!("Requesting sensor authorization");
                Ok(true)
            }
            SessionState::Authorizing | SessionState::Active | SessionState::Paused => {
                tracing::debug!(state = %self.state, "request_start with session under way");
                Ok(false)
            }
            SessionState::Ended | SessionState::Failed => Err(MonitorError::InvalidTransition {
                from: self.state,
                attempted: "request_start",
            }),
        }
    }

    /// Consume the outcome of the authorization and begin sequence.
    ///
    /// Returns `Ok(true)` when the observable state changed. A resolution
    /// arriving after the session already left `Authorizing` is stale; any
    /// handle it carries is closed and nothing else changes. A deferred
    /// `end` request finalizes here.
    pub async fn complete_start(
        &mut self,
        result: Result<SessionHandle, SensorError>,
    ) -> Result<bool, MonitorError> {
        if self.state != SessionState::Authorizing {
            if let Ok(handle) = result {
                tracing::debug!(session_id = %handle.id(), "Stale start resolution, closing session");
                self.capability.end_session(&handle).await;
            }
            return Ok(false);
        }

        if self.end_requested {
            self.end_requested = false;
            if let Ok(handle) = result {
                self.capability.end_session(&handle).await;
            }
            self.current_bpm = 0.0;
            self.state = SessionState::Ended;
            tracing::info!("Deferred end applied after start resolved");
            return Ok(true);
        }

        match result {
            Ok(handle) => {
                tracing::info!(session_id = %handle.id(), "Sensor session active");
                self.handle = Some(handle);
                self.state = SessionState::Active;
                Ok(true)
            }
            Err(SensorError::AuthorizationDenied) => {
                self.current_bpm = 0.0;
                self.fault = Some(Fault::AuthorizationDenied);
                self.state = SessionState::Failed;
                Err(MonitorError::AuthorizationDenied)
            }
            Err(e) => {
                self.current_bpm = 0.0;
                self.fault = Some(Fault::StartFailure);
                self.state = SessionState::Failed;
                Err(MonitorError::SessionStartFailure(e.to_string()))
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), MonitorError> {
        if self.state != SessionState::Active {
            return Err(MonitorError::InvalidTransition {
                from: self.state,
                attempted: "pause",
            });
        }
        self.state = SessionState::Paused;
        tracing::info!("Session paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), MonitorError> {
        if self.state != SessionState::Paused {
            return Err(MonitorError::InvalidTransition {
                from: self.state,
                attempted: "resume",
            });
        }
        self.state = SessionState::Active;
        tracing::info!("Session resumed");
        Ok(())
    }

    /// Pause when active, resume when paused.
    pub fn toggle_pause(&mut self) -> Result<(), MonitorError> {
        match self.state {
            SessionState::Active => self.pause(),
            SessionState::Paused => self.resume(),
            _ => Err(MonitorError::InvalidTransition {
                from: self.state,
                attempted: "toggle_pause",
            }),
        }
    }

    /// Finalize the session and transition to `Ended`.
    ///
    /// Idempotent from terminal states. While a start is in flight the end
    /// is deferred (see [`complete_start`](SessionController::complete_start)).
    /// Returns `true` when the observable state changed.
    pub async fn end(&mut self) -> bool {
        match self.state {
            SessionState::Ended | SessionState::Failed => {
                tracing::debug!(state = %self.state, "end() in a terminal state is a no-op");
                false
            }
            SessionState::Authorizing => {
                if !self.end_requested {
                    self.end_requested = true;
                    tracing::info!("End requested while start in flight, deferring");
                }
                false
            }
            SessionState::Idle | SessionState::Active | SessionState::Paused => {
                if let Some(handle) = self.handle.take() {
                    self.capability.end_session(&handle).await;
                }
                self.current_bpm = 0.0;
                self.state = SessionState::Ended;
                tracing::info!("Session ended");
                true
            }
        }
    }

    /// Force the session into `Failed`, releasing all session resources.
    ///
    /// The release runs unconditionally, including mid-collection; closing
    /// the handle is idempotent at the capability.
    pub async fn fail(&mut self, fault: Fault) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        if let Some(handle) = self.handle.take() {
            self.capability.end_session(&handle).await;
        }
        self.current_bpm = 0.0;
        self.fault = Some(fault);
        self.state = SessionState::Failed;
        tracing::warn!(fault = ?fault, "Session failed");
        true
    }

    /// Leave a terminal state and return to `Idle` for a fresh episode.
    pub fn reset(&mut self) -> Result<(), MonitorError> {
        if !self.state.is_terminal() {
            return Err(MonitorError::InvalidTransition {
                from: self.state,
                attempted: "reset",
            });
        }
        self.state = SessionState::Idle;
        self.current_bpm = 0.0;
        self.fault = None;
        self.end_requested = false;
        tracing::info!("Controller reset to idle");
        Ok(())
    }

    /// Record the latest reading. The caller gates on a live session.
    pub fn record_bpm(&mut self, bpm: f64) {
        self.current_bpm = bpm;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
