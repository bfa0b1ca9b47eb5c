//! The monitoring facade.
//!
//! [`Monitor`] composes the session controller, alarm coordinator, and
//! alarm policy behind a subscribe/start/stop surface. A single control
//! loop task owns both state machines; sensor callbacks, lifecycle
//! commands, the acknowledgment gesture, and the on-body presence signal
//! all arrive over one command stream, so transitions are serialized and
//! each sample is fully evaluated and published before the next is
//! processed.
//!
//! Lifecycle methods are non-blocking sends; completion and failure are
//! observed through the broadcast [`MonitoringSnapshot`] stream.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use pulsewatch_core::{AlarmPolicy, HeartRateSample, SessionState, SlideGesture};
use pulsewatch_sensor::{SensorCapability, SensorError, SensorEvent, SessionHandle};

use crate::config::MonitorConfig;
use crate::controller::SessionController;
use crate::coordinator::AlarmCoordinator;
use crate::error::MonitorError;
use crate::output::OutputSink;
use crate::snapshot::{Fault, MonitoringSnapshot};

/// How long `shutdown` waits for the control loop to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the control loop can be asked to do.
enum Command {
    RequestStart,
    Pause,
    Resume,
    TogglePause,
    End,
    Reset,
    Acknowledge(SlideGesture),
    SetWorn(bool),
    /// Outcome of the spawned authorization + begin sequence.
    StartResolved(Result<SessionHandle, SensorError>),
    /// A push event forwarded from the live sensor session.
    Sensor(SensorEvent),
}

/// Handle to a running monitor.
///
/// Created once via [`Monitor::start`]; the returned `Arc` can be cheaply
/// cloned into UI handlers and signal bridges.
pub struct Monitor {
    cmd_tx: mpsc::Sender<Command>,
    snapshot_tx: broadcast::Sender<MonitoringSnapshot>,
    cancel: CancellationToken,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Monitor {
    /// Spawn the control loop and return the facade handle.
    pub fn start(
        config: MonitorConfig,
        capability: Arc<dyn SensorCapability>,
        sink: Arc<dyn OutputSink>,
    ) -> Arc<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity);
        let (snapshot_tx, _) = broadcast::channel(config.snapshot_capacity);
        let cancel = CancellationToken::new();

        let state = ControlLoop {
            controller: SessionController::new(capability),
            coordinator: AlarmCoordinator::new(sink),
            policy: config.policy,
            sensor_capacity: config.sensor_capacity,
            cmd_tx: cmd_tx.clone(),
            snapshot_tx: snapshot_tx.clone(),
            worn: None,
        };

        let loop_handle = tokio::spawn(run_control_loop(state, cmd_rx, cancel.clone()));

        Arc::new(Self {
            cmd_tx,
            snapshot_tx,
            cancel,
            loop_handle: Mutex::new(Some(loop_handle)),
        })
    }

    /// Subscribe to the snapshot stream.
    ///
    /// A snapshot is broadcast on every sample and every state transition.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitoringSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Begin monitoring: authorize, open the sensor session, go active.
    pub async fn request_start(&self) {
        self.send(Command::RequestStart).await;
    }

    pub async fn pause(&self) {
        self.send(Command::Pause).await;
    }

    pub async fn resume(&self) {
        self.send(Command::Resume).await;
    }

    /// Pause when active, resume when paused.
    pub async fn toggle_pause(&self) {
        self.send(Command::TogglePause).await;
    }

    /// End the monitoring episode. Safe to call at any time.
    pub async fn end(&self) {
        self.send(Command::End).await;
    }

    /// Return from a terminal state to idle for a fresh episode.
    pub async fn reset(&self) {
        self.send(Command::Reset).await;
    }

    /// Feed an acknowledgment gesture. A committed gesture silences the
    /// alarm and ends the episode; anything short of the commit ratio is
    /// ignored.
    pub async fn acknowledge(&self, gesture: SlideGesture) {
        self.send(Command::Acknowledge(gesture)).await;
    }

    /// Feed the on-body presence signal. A flip to removed forces `end`;
    /// a flip to worn while idle triggers `request_start`.
    pub async fn set_worn(&self, worn: bool) {
        self.send(Command::SetWorn(worn)).await;
    }

    /// Stop the control loop, ending any live session and silencing the
    /// alarm first.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.loop_handle.lock().await.take() {
            let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await;
        }
    }

    async fn send(&self, command: Command) {
        // A failed send only means the loop has already shut down.
        let _ = self.cmd_tx.send(command).await;
    }
}

// ---------------------------------------------------------------------------
// Control loop
// ---------------------------------------------------------------------------

/// State owned by the control loop task.
struct ControlLoop {
    controller: SessionController,
    coordinator: AlarmCoordinator,
    policy: AlarmPolicy,
    sensor_capacity: usize,
    cmd_tx: mpsc::Sender<Command>,
    snapshot_tx: broadcast::Sender<MonitoringSnapshot>,
    /// Last observed presence value, for edge detection.
    worn: Option<bool>,
}

async fn run_control_loop(
    mut state: ControlLoop,
    mut cmd_rx: mpsc::Receiver<Command>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                state.coordinator.force_quiescent();
                state.controller.end().await;
                state.publish();
                tracing::info!("Monitor control loop shut down");
                return;
            }
            command = cmd_rx.recv() => {
                let Some(command) = command else {
                    state.coordinator.force_quiescent();
                    state.controller.end().await;
                    return;
                };
                if state.handle_command(command).await {
                    state.publish();
                }
            }
        }
    }
}

impl ControlLoop {
    /// Apply one command. Returns `true` when the observable state changed
    /// and a snapshot should be published.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::RequestStart => self.handle_request_start(),
            Command::Pause => log_invalid(self.controller.pause()),
            Command::Resume => log_invalid(self.controller.resume()),
            Command::TogglePause => log_invalid(self.controller.toggle_pause()),
            Command::End => {
                let cleared = self.coordinator.force_quiescent();
                let ended = self.controller.end().await;
                cleared || ended
            }
            Command::Reset => log_invalid(self.controller.reset()),
            Command::Acknowledge(gesture) => {
                if self.coordinator.acknowledge(&gesture) {
                    self.controller.end().await;
                    true
                } else {
                    false
                }
            }
            Command::SetWorn(worn) => self.handle_set_worn(worn).await,
            Command::StartResolved(result) => {
                match self.controller.complete_start(result).await {
                    Ok(changed) => changed,
                    Err(e) => {
                        tracing::warn!(error = %e, "Session start failed");
                        true
                    }
                }
            }
            Command::Sensor(event) => self.handle_sensor_event(event).await,
        }
    }

    fn handle_request_start(&mut self) -> bool {
        match self.controller.begin_authorizing() {
            Ok(true) => {
                self.spawn_start();
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring start request");
                false
            }
        }
    }

    /// Run authorization and session begin off the loop, then forward the
    /// session's events onto the command stream.
    ///
    /// The resolution is sent before any forwarding begins, so no sample
    /// can outrun the activation on the (ordered) command stream.
    fn spawn_start(&self) {
        let capability = self.controller.capability();
        let cmd_tx = self.cmd_tx.clone();
        let sensor_capacity = self.sensor_capacity;

        tokio::spawn(async move {
            let result = match capability.request_authorization().await {
                Ok(()) => {
                    let (sensor_tx, sensor_rx) = mpsc::channel(sensor_capacity);
                    capability
                        .begin_session(sensor_tx)
                        .await
                        .map(|handle| (handle, sensor_rx))
                }
                Err(e) => Err(e),
            };

            match result {
                Ok((handle, mut sensor_rx)) => {
                    if cmd_tx
                        .send(Command::StartResolved(Ok(handle.clone())))
                        .await
                        .is_err()
                    {
                        // The loop is gone; do not leave the session open.
                        capability.end_session(&handle).await;
                        return;
                    }
                    while let Some(event) = sensor_rx.recv().await {
                        if cmd_tx.send(Command::Sensor(event)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    let _ = cmd_tx.send(Command::StartResolved(Err(e))).await;
                }
            }
        });
    }

    async fn handle_set_worn(&mut self, worn: bool) -> bool {
        if self.worn.replace(worn) == Some(worn) {
            return false;
        }
        if worn {
            if self.controller.state() == SessionState::Idle {
                tracing::info!("Presence signal: worn, starting monitoring");
                self.handle_request_start()
            } else {
                false
            }
        } else {
            match self.controller.state() {
                SessionState::Authorizing | SessionState::Active | SessionState::Paused => {
                    tracing::info!("Presence signal: removed, ending session");
                    let cleared = self.coordinator.force_quiescent();
                    let ended = self.controller.end().await;
                    cleared || ended
                }
                _ => false,
            }
        }
    }

    async fn handle_sensor_event(&mut self, event: SensorEvent) -> bool {
        match event {
            SensorEvent::Sample { bpm, timestamp } => {
                if !self.controller.state().is_live() {
                    tracing::debug!(
                        bpm,
                        state = %self.controller.state(),
                        "Dropping sample outside a live session",
                    );
                    return false;
                }
                let sample = match HeartRateSample::new(bpm, timestamp) {
                    Ok(sample) => sample,
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping malformed sample");
                        return false;
                    }
                };
                self.controller.record_bpm(sample.bpm);
                let verdict = self.policy.evaluate(&sample);
                if let Some(alarm) = self.coordinator.apply_verdict(verdict, &sample) {
                    tracing::warn!(
                        alarm_id = %alarm.id,
                        bpm = alarm.bpm,
                        "Critical alarm raised",
                    );
                }
                true
            }
            SensorEvent::Ended => {
                tracing::info!("Sensor closed the session");
                let cleared = self.coordinator.force_quiescent();
                let ended = self.controller.end().await;
                cleared || ended
            }
            SensorEvent::Errored { message } => {
                let error = MonitorError::SessionInterrupted(message);
                tracing::error!(error = %error, "Sensor session interrupted");
                let cleared = self.coordinator.force_quiescent();
                let failed = self.controller.fail(Fault::Interrupted).await;
                cleared || failed
            }
        }
    }

    fn publish(&self) {
        let snapshot = MonitoringSnapshot {
            current_bpm: self.controller.current_bpm(),
            session_state: self.controller.state(),
            alarm_state: self.coordinator.state(),
            fault: self.controller.fault(),
            timestamp: Utc::now(),
        };
        // A send error only means there are no subscribers right now.
        let _ = self.snapshot_tx.send(snapshot);
    }
}

/// Log and swallow an `InvalidTransition`; report whether state changed.
fn log_invalid(result: Result<(), MonitorError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring lifecycle command");
            false
        }
    }
}
