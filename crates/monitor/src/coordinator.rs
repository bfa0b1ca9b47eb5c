//! Alarm lifecycle: raise, sustain, cancel.
//!
//! [`AlarmCoordinator`] owns the [`AlarmState`] and is the single writer to
//! the output sink. Side effects fire only on edge transitions, so repeated
//! identical verdicts never double-start the alert. Every path that leaves
//! a live session runs [`force_quiescent`](AlarmCoordinator::force_quiescent),
//! which makes a sounding alert without a live session structurally
//! impossible.

use std::sync::Arc;

use serde::Serialize;

use pulsewatch_core::{HeartRateSample, SlideGesture, Verdict};

use crate::output::{HapticKind, OutputSink};
use crate::snapshot::AlarmEvent;

/// Whether a critical alarm is currently sustained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    /// No alarm; output silent.
    Quiescent,
    /// A critical alarm is sounding until acknowledged or the condition
    /// clears.
    Critical,
}

/// Owns alarm state and sequences the output sink.
pub struct AlarmCoordinator {
    state: AlarmState,
    sink: Arc<dyn OutputSink>,
    last_alarm: Option<AlarmEvent>,
}

impl AlarmCoordinator {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self {
            state: AlarmState::Quiescent,
            sink,
            last_alarm: None,
        }
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    /// The raise event of the most recent alarm, if any has fired.
    pub fn last_alarm(&self) -> Option<&AlarmEvent> {
        self.last_alarm.as_ref()
    }

    /// Apply a per-sample verdict.
    ///
    /// On the `Quiescent` to `Critical` edge: starts the sustained alert,
    /// plays one notification haptic, and returns the raise event. On the
    /// `Critical` to `Normal` edge (the condition cleared on its own):
    /// stops the alert. Identical consecutive verdicts change nothing.
    pub fn apply_verdict(
        &mut self,
        verdict: Verdict,
        sample: &HeartRateSample,
    ) -> Option<AlarmEvent> {
        match (self.state, verdict) {
            (AlarmState::Quiescent, Verdict::Critical) => {
                self.state = AlarmState::Critical;
                self.sink.start_alert();
                self.sink.pulse_haptic(HapticKind::Notification);
                let event = AlarmEvent::new(sample);
                self.last_alarm = Some(event.clone());
                Some(event)
            }
            (AlarmState::Critical, Verdict::Normal) => {
                self.state = AlarmState::Quiescent;
                self.sink.stop_alert();
                tracing::info!(bpm = sample.bpm, "Alarm cleared, signal recovered");
                None
            }
            _ => None,
        }
    }

    /// Process an acknowledgment gesture.
    ///
    /// Returns `true` iff the gesture committed against a sounding alarm;
    /// the caller then ends the monitoring episode. A gesture short of the
    /// commit ratio, or one arriving while quiescent, changes nothing.
    pub fn acknowledge(&mut self, gesture: &SlideGesture) -> bool {
        if !gesture.is_committed() {
            tracing::debug!(
                progress = gesture.progress(),
                "Acknowledgment gesture snapped back",
            );
            return false;
        }
        if self.state != AlarmState::Critical {
            tracing::debug!("Acknowledgment gesture with no alarm sounding");
            return false;
        }

        self.state = AlarmState::Quiescent;
        self.sink.stop_alert();
        self.sink.pulse_haptic(HapticKind::Success);
        tracing::info!("Alarm acknowledged");
        true
    }

    /// Unconditionally return to `Quiescent`, stopping output if sounding.
    ///
    /// Called on session end, session failure, and shutdown. Returns `true`
    /// if an alarm was actually cleared.
    pub fn force_quiescent(&mut self) -> bool {
        if self.state != AlarmState::Critical {
            return false;
        }
        self.state = AlarmState::Quiescent;
        self.sink.stop_alert();
        tracing::info!("Alarm forced quiescent");
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use pulsewatch_core::{AlarmPolicy, ThresholdTier};

    use super::*;

    /// Records every sink call for assertion.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum SinkCall {
        Start,
        Stop,
        Haptic(HapticKind),
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<SinkCall>>,
    }

    impl RecordingSink {
        fn calls(&self) -> Vec<SinkCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl OutputSink for RecordingSink {
        fn start_alert(&self) {
            self.calls.lock().unwrap().push(SinkCall::Start);
        }

        fn stop_alert(&self) {
            self.calls.lock().unwrap().push(SinkCall::Stop);
        }

        fn pulse_haptic(&self, kind: HapticKind) {
            self.calls.lock().unwrap().push(SinkCall::Haptic(kind));
        }
    }

    fn sample(bpm: f64) -> HeartRateSample {
        HeartRateSample::new(bpm, Utc::now()).unwrap()
    }

    fn committed_gesture() -> SlideGesture {
        SlideGesture::new(61.0, 100.0).unwrap()
    }

    fn partial_gesture() -> SlideGesture {
        SlideGesture::new(59.0, 100.0).unwrap()
    }

    // -- apply_verdict --------------------------------------------------------

    #[test]
    fn raises_once_on_critical_edge() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());

        let event = coordinator.apply_verdict(Verdict::Critical, &sample(55.0));

        assert!(event.is_some());
        assert_eq!(coordinator.state(), AlarmState::Critical);
        assert_eq!(
            sink.calls(),
            vec![SinkCall::Start, SinkCall::Haptic(HapticKind::Notification)]
        );
    }

    #[test]
    fn repeated_critical_verdicts_do_not_restart_output() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());

        coordinator.apply_verdict(Verdict::Critical, &sample(55.0));
        let second = coordinator.apply_verdict(Verdict::Critical, &sample(54.0));

        assert!(second.is_none());
        assert_eq!(
            sink.calls(),
            vec![SinkCall::Start, SinkCall::Haptic(HapticKind::Notification)]
        );
    }

    #[test]
    fn clears_on_normal_edge() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());

        coordinator.apply_verdict(Verdict::Critical, &sample(55.0));
        coordinator.apply_verdict(Verdict::Normal, &sample(75.0));

        assert_eq!(coordinator.state(), AlarmState::Quiescent);
        assert_eq!(sink.calls().last(), Some(&SinkCall::Stop));
    }

    #[test]
    fn repeated_normal_verdicts_are_noops() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());

        coordinator.apply_verdict(Verdict::Normal, &sample(75.0));
        coordinator.apply_verdict(Verdict::Normal, &sample(76.0));

        assert_eq!(coordinator.state(), AlarmState::Quiescent);
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn scenario_stream_starts_once_stops_once() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());
        let policy = AlarmPolicy::for_tier(ThresholdTier::Ambient);

        for bpm in [72.0, 58.0, 55.0, 0.0, 62.0] {
            let s = sample(bpm);
            coordinator.apply_verdict(policy.evaluate(&s), &s);
        }

        let calls = sink.calls();
        let starts = calls.iter().filter(|c| **c == SinkCall::Start).count();
        let stops = calls.iter().filter(|c| **c == SinkCall::Stop).count();
        assert_eq!(starts, 1);
        assert_eq!(stops, 1);
        assert_eq!(coordinator.state(), AlarmState::Quiescent);
    }

    #[test]
    fn raise_event_carries_the_tripping_reading() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink);

        let event = coordinator
            .apply_verdict(Verdict::Critical, &sample(42.0))
            .unwrap();

        assert_eq!(event.bpm, 42.0);
        assert_eq!(coordinator.last_alarm().unwrap().id, event.id);
    }

    // -- acknowledge ----------------------------------------------------------

    #[test]
    fn partial_gesture_leaves_alarm_sounding() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());

        coordinator.apply_verdict(Verdict::Critical, &sample(55.0));
        let committed = coordinator.acknowledge(&partial_gesture());

        assert!(!committed);
        assert_eq!(coordinator.state(), AlarmState::Critical);
        assert_eq!(
            sink.calls(),
            vec![SinkCall::Start, SinkCall::Haptic(HapticKind::Notification)]
        );
    }

    #[test]
    fn committed_gesture_silences_and_reports() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());

        coordinator.apply_verdict(Verdict::Critical, &sample(55.0));
        let committed = coordinator.acknowledge(&committed_gesture());

        assert!(committed);
        assert_eq!(coordinator.state(), AlarmState::Quiescent);
        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Start,
                SinkCall::Haptic(HapticKind::Notification),
                SinkCall::Stop,
                SinkCall::Haptic(HapticKind::Success),
            ]
        );
    }

    #[test]
    fn committed_gesture_while_quiescent_is_a_noop() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());

        let committed = coordinator.acknowledge(&committed_gesture());

        assert!(!committed);
        assert!(sink.calls().is_empty());
    }

    // -- force_quiescent ------------------------------------------------------

    #[test]
    fn force_quiescent_stops_a_sounding_alarm() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());

        coordinator.apply_verdict(Verdict::Critical, &sample(55.0));
        let changed = coordinator.force_quiescent();

        assert!(changed);
        assert_eq!(coordinator.state(), AlarmState::Quiescent);
        assert_eq!(sink.calls().last(), Some(&SinkCall::Stop));
    }

    #[test]
    fn force_quiescent_when_silent_touches_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let mut coordinator = AlarmCoordinator::new(sink.clone());

        let changed = coordinator.force_quiescent();

        assert!(!changed);
        assert!(sink.calls().is_empty());
    }
}
