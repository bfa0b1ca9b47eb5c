//! Thin binary shell around the monitoring facade.
//!
//! Wires a scripted sensor through a [`Monitor`] with a logging output
//! sink and follows the snapshot stream until the episode ends. Threshold
//! configuration comes from the environment:
//!
//! - `PULSEWATCH_THRESHOLD_BPM` — explicit threshold override.
//! - `PULSEWATCH_TIER` — `ambient` (default) or `supervised`.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulsewatch_core::{AlarmPolicy, ThresholdTier};
use pulsewatch_monitor::{LogSink, Monitor, MonitorConfig};
use pulsewatch_sensor::{ScriptedSensor, ScriptedSensorConfig};

/// Demo feed: a dip below the ambient threshold, a dropout, then recovery.
const DEMO_SCRIPT: [f64; 8] = [78.0, 74.0, 66.0, 58.0, 52.0, 0.0, 64.0, 71.0];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pulsewatch_daemon=debug,pulsewatch_monitor=debug,pulsewatch_sensor=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let policy = policy_from_env()?;
    tracing::info!(threshold_bpm = policy.threshold_bpm(), "Monitor starting");

    let sensor = Arc::new(ScriptedSensor::new(ScriptedSensorConfig {
        script: DEMO_SCRIPT.to_vec(),
        sample_interval: Duration::from_millis(500),
        ..Default::default()
    }));

    let monitor = Monitor::start(
        MonitorConfig {
            policy,
            ..Default::default()
        },
        sensor,
        Arc::new(LogSink),
    );

    let mut snapshots = monitor.subscribe();

    // The presence signal drives the lifecycle, as on the wrist.
    monitor.set_worn(true).await;

    loop {
        match snapshots.recv().await {
            Ok(snapshot) => {
                tracing::info!(
                    bpm = snapshot.current_bpm,
                    session = %snapshot.session_state,
                    alarm = ?snapshot.alarm_state,
                    "Snapshot",
                );
                if snapshot.session_state.is_terminal() {
                    match serde_json::to_string(&snapshot) {
                        Ok(summary) => tracing::info!(%summary, "Episode finished"),
                        Err(e) => tracing::warn!(error = %e, "Could not serialize snapshot"),
                    }
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot stream interrupted");
                break;
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}

/// Resolve the alarm policy from the environment.
fn policy_from_env() -> anyhow::Result<AlarmPolicy> {
    if let Ok(raw) = std::env::var("PULSEWATCH_THRESHOLD_BPM") {
        let bpm: f64 = raw.parse()?;
        return Ok(AlarmPolicy::with_threshold(bpm)?);
    }
    let tier = std::env::var("PULSEWATCH_TIER")
        .map(|raw| ThresholdTier::from_str(&raw))
        .unwrap_or(ThresholdTier::Ambient);
    Ok(AlarmPolicy::for_tier(tier))
}
