//! A deterministic, in-process sensor capability.
//!
//! [`ScriptedSensor`] replays a fixed list of bpm readings at a configured
//! cadence, optionally failing partway through. It backs the crate-level
//! integration tests and the daemon's demo session, so the whole monitoring
//! stack can run without sensor hardware.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::capability::{SensorCapability, SessionHandle};
use crate::error::SensorError;
use crate::events::SensorEvent;

/// Tunable behaviour of a [`ScriptedSensor`].
#[derive(Debug, Clone)]
pub struct ScriptedSensorConfig {
    /// Whether authorization requests are granted.
    pub authorize: bool,
    /// The bpm readings to replay, in order.
    pub script: Vec<f64>,
    /// Delay before each reading.
    pub sample_interval: Duration,
    /// When `Some(n)`, the feed delivers the first `n` readings and then
    /// fails with a device fault instead of delivering the rest.
    pub interrupt_after: Option<usize>,
}

impl Default for ScriptedSensorConfig {
    fn default() -> Self {
        Self {
            authorize: true,
            script: Vec::new(),
            sample_interval: Duration::from_millis(10),
            interrupt_after: None,
        }
    }
}

/// Internal bookkeeping for the one live feed.
struct ActiveFeed {
    handle: SessionHandle,
    cancel: CancellationToken,
}

/// Scripted [`SensorCapability`] implementation.
pub struct ScriptedSensor {
    config: ScriptedSensorConfig,
    active: Arc<Mutex<Option<ActiveFeed>>>,
}

impl ScriptedSensor {
    pub fn new(config: ScriptedSensorConfig) -> Self {
        Self {
            config,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a session is currently live.
    pub async fn has_live_session(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

#[async_trait]
impl SensorCapability for ScriptedSensor {
    async fn request_authorization(&self) -> Result<(), SensorError> {
        if self.config.authorize {
            Ok(())
        } else {
            Err(SensorError::AuthorizationDenied)
        }
    }

    async fn begin_session(
        &self,
        events: mpsc::Sender<SensorEvent>,
    ) -> Result<SessionHandle, SensorError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(SensorError::Busy);
        }

        let handle = SessionHandle::new();
        let cancel = CancellationToken::new();
        *active = Some(ActiveFeed {
            handle: handle.clone(),
            cancel: cancel.clone(),
        });

        tracing::info!(session_id = %handle.id(), "Scripted sensor session started");

        tokio::spawn(run_feed(
            self.config.clone(),
            events,
            cancel,
            Arc::clone(&self.active),
            handle.clone(),
        ));

        Ok(handle)
    }

    async fn end_session(&self, handle: &SessionHandle) {
        let mut active = self.active.lock().await;
        match active.as_ref() {
            Some(feed) if feed.handle == *handle => {
                feed.cancel.cancel();
                *active = None;
                tracing::info!(session_id = %handle.id(), "Scripted sensor session ended");
            }
            _ => {
                tracing::debug!(
                    session_id = %handle.id(),
                    "end_session for unknown or already-ended session",
                );
            }
        }
    }
}

/// Replay the script, then close the session from the sensor side.
///
/// Exits silently when cancelled (the controller ended the session) or when
/// the receiver is gone.
async fn run_feed(
    config: ScriptedSensorConfig,
    events: mpsc::Sender<SensorEvent>,
    cancel: CancellationToken,
    active: Arc<Mutex<Option<ActiveFeed>>>,
    handle: SessionHandle,
) {
    for (index, &bpm) in config.script.iter().enumerate() {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.sample_interval) => {}
        }

        if config.interrupt_after == Some(index) {
            tracing::warn!(session_id = %handle.id(), index, "Scripted sensor fault");
            let _ = events
                .send(SensorEvent::Errored {
                    message: format!("scripted device fault after {index} samples"),
                })
                .await;
            release_slot(&active, &handle).await;
            return;
        }

        if events
            .send(SensorEvent::Sample {
                bpm,
                timestamp: Utc::now(),
            })
            .await
            .is_err()
        {
            // Receiver gone; free the slot so a later begin is not Busy.
            release_slot(&active, &handle).await;
            return;
        }
    }

    let _ = events.send(SensorEvent::Ended).await;
    release_slot(&active, &handle).await;
}

/// Clear the live-session slot if it still belongs to `handle`.
async fn release_slot(active: &Mutex<Option<ActiveFeed>>, handle: &SessionHandle) {
    let mut slot = active.lock().await;
    if matches!(slot.as_ref(), Some(feed) if feed.handle == *handle) {
        *slot = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn fast_config(script: Vec<f64>) -> ScriptedSensorConfig {
        ScriptedSensorConfig {
            script,
            sample_interval: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn denied_authorization_is_reported() {
        let sensor = ScriptedSensor::new(ScriptedSensorConfig {
            authorize: false,
            ..Default::default()
        });
        assert_matches!(
            sensor.request_authorization().await,
            Err(SensorError::AuthorizationDenied)
        );
    }

    #[tokio::test]
    async fn granted_authorization_succeeds() {
        let sensor = ScriptedSensor::new(ScriptedSensorConfig::default());
        assert!(sensor.request_authorization().await.is_ok());
    }

    #[tokio::test]
    async fn script_is_delivered_in_order_then_ended() {
        let sensor = ScriptedSensor::new(fast_config(vec![72.0, 58.0, 61.0]));
        let (tx, mut rx) = mpsc::channel(16);

        sensor.begin_session(tx).await.unwrap();

        let mut readings = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                SensorEvent::Sample { bpm, .. } => readings.push(bpm),
                SensorEvent::Ended => break,
                SensorEvent::Errored { message } => panic!("unexpected fault: {message}"),
            }
        }

        assert_eq!(readings, vec![72.0, 58.0, 61.0]);
        assert!(!sensor.has_live_session().await);
    }

    #[tokio::test]
    async fn second_begin_while_live_is_busy() {
        let sensor = ScriptedSensor::new(fast_config(vec![70.0; 50]));
        let (tx1, _rx1) = mpsc::channel(64);
        let (tx2, _rx2) = mpsc::channel(64);

        sensor.begin_session(tx1).await.unwrap();
        assert_matches!(sensor.begin_session(tx2).await, Err(SensorError::Busy));
    }

    #[tokio::test]
    async fn end_session_stops_the_feed() {
        let sensor = ScriptedSensor::new(fast_config(vec![70.0; 1000]));
        let (tx, mut rx) = mpsc::channel(16);

        let handle = sensor.begin_session(tx).await.unwrap();

        // Let at least one sample through, then end from the caller side.
        let first = rx.recv().await.expect("feed should deliver a sample");
        assert_matches!(first, SensorEvent::Sample { .. });

        sensor.end_session(&handle).await;
        assert!(!sensor.has_live_session().await);

        // Drain whatever was in flight; the channel must close without an
        // `Ended` marker since the caller ended the session itself.
        while let Some(event) = rx.recv().await {
            assert_matches!(event, SensorEvent::Sample { .. });
        }
    }

    #[tokio::test]
    async fn ending_twice_is_a_noop() {
        let sensor = ScriptedSensor::new(fast_config(vec![70.0]));
        let (tx, _rx) = mpsc::channel(16);

        let handle = sensor.begin_session(tx).await.unwrap();
        sensor.end_session(&handle).await;
        sensor.end_session(&handle).await;
        assert!(!sensor.has_live_session().await);
    }

    #[tokio::test]
    async fn interrupt_emits_device_fault() {
        let sensor = ScriptedSensor::new(ScriptedSensorConfig {
            interrupt_after: Some(2),
            ..fast_config(vec![70.0, 71.0, 72.0, 73.0])
        });
        let (tx, mut rx) = mpsc::channel(16);

        sensor.begin_session(tx).await.unwrap();

        let mut readings = Vec::new();
        let mut fault = None;
        while let Some(event) = rx.recv().await {
            match event {
                SensorEvent::Sample { bpm, .. } => readings.push(bpm),
                SensorEvent::Errored { message } => {
                    fault = Some(message);
                    break;
                }
                SensorEvent::Ended => panic!("feed should fault, not end"),
            }
        }

        assert_eq!(readings, vec![70.0, 71.0]);
        assert!(fault.is_some());
        assert!(!sensor.has_live_session().await);
    }
}
