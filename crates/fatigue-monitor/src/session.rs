//! Session engine
//!
//! Drives one subject session through `Idle -> Calibrating -> Monitoring -> Idle`,
//! feeding each frame to the calibration accumulator or to the detectors and
//! the fatigue scorer.

use alerting::FatigueEvent;
use face_landmarks::{EyeMouthMetrics, LandmarkFrame};
use metrics::{counter, gauge};
use tracing::{debug, info, warn};

use crate::blink::{BlinkDetector, BlinkTransition};
use crate::calibration::{BaselineProfile, CalibrationAccumulator};
use crate::config::{CheckpointPolicy, MonitorConfig, MonitoringStart};
use crate::gaze::GazeVelocityTracker;
use crate::scorer::{FatigueIndicators, FatigueScorer, ScoringRule};
use crate::state::{SessionClock, SessionState};
use crate::summary::{LiveMetrics, SessionSummary};
use crate::yawn::{YawnDetector, YawnTransition};
use crate::MonitorError;

/// Result of processing one frame
#[derive(Debug, Clone)]
pub struct FrameUpdate {
    /// Fields for live display
    pub live: LiveMetrics,
    /// Set on the frame where calibration completed
    pub baseline: Option<BaselineProfile>,
    /// Periodic summary due on this frame
    pub checkpoint: Option<SessionSummary>,
}

/// Detector state for one monitoring phase.
///
/// Detectors run on session time: seconds since monitoring began with paused
/// spans removed, so a pause never stretches a yawn, a blink gap or the alert
/// cooldown.
#[derive(Debug)]
struct MonitoringPhase {
    baseline: BaselineProfile,
    blink: BlinkDetector,
    yawn: YawnDetector,
    gaze: GazeVelocityTracker,
    ear_sum: f64,
    ear_frames: u64,
    last_checkpoint_secs: f64,
}

impl MonitoringPhase {
    fn new(baseline: BaselineProfile, config: &MonitorConfig) -> Self {
        Self {
            blink: BlinkDetector::new(baseline.thres_close, baseline.thres_open, &config.blink, 0.0),
            yawn: YawnDetector::new(baseline.thres_yawn, &config.yawn),
            gaze: GazeVelocityTracker::new(&config.gaze),
            baseline,
            ear_sum: 0.0,
            ear_frames: 0,
            last_checkpoint_secs: 0.0,
        }
    }

    fn observe(&mut self, metrics: &EyeMouthMetrics, t: f64, delta: f64) {
        if let BlinkTransition::Completed { .. } = self.blink.update(metrics.ear, t, delta) {
            counter!("fatigue_blinks_total").increment(1);
        }
        if let YawnTransition::Closed { counted: true, .. } = self.yawn.update(metrics.mar, t) {
            counter!("fatigue_yawns_total").increment(1);
        }
        self.gaze.observe(metrics.eye_ref);
        self.ear_sum += metrics.ear;
        self.ear_frames += 1;
    }

    fn indicators(&self, elapsed_secs: f64) -> FatigueIndicators {
        FatigueIndicators::from_state(
            self.blink.state(),
            self.yawn.yawn_count(),
            self.gaze.average_velocity(),
            elapsed_secs,
        )
    }

    fn average_ear(&self) -> f64 {
        if self.ear_frames == 0 {
            return 0.0;
        }
        self.ear_sum / self.ear_frames as f64
    }
}

/// Fatigue monitoring session state machine.
///
/// Not internally synchronized: a host delivering frames from another thread
/// must hand them over one at a time (see the `frame-slot` crate).
#[derive(Debug)]
pub struct SessionEngine {
    config: MonitorConfig,
    state: SessionState,
    clock: SessionClock,
    calibration: CalibrationAccumulator,
    monitoring: Option<MonitoringPhase>,
    scorer: FatigueScorer,
    final_summary: Option<SessionSummary>,
}

impl SessionEngine {
    /// Create an engine using the configured rule table for scoring
    pub fn new(config: MonitorConfig) -> Result<Self, MonitorError> {
        let rule = Box::new(config.scoring.clone());
        Self::with_rule(config, rule)
    }

    /// Create an engine with a custom scoring rule
    pub fn with_rule(
        config: MonitorConfig,
        rule: Box<dyn ScoringRule>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        Ok(Self {
            calibration: CalibrationAccumulator::new(config.calibration.clone(), 0.0),
            scorer: FatigueScorer::new(rule, config.alert.clone()),
            state: SessionState::Idle,
            clock: SessionClock::default(),
            monitoring: None,
            final_summary: None,
            config,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Baseline of the current (or last) session, once calibration completed
    pub fn baseline(&self) -> Option<&BaselineProfile> {
        self.monitoring.as_ref().map(|m| &m.baseline)
    }

    /// Begin a new session. Ignored unless idle.
    pub fn start(&mut self, now: f64) -> bool {
        if self.state != SessionState::Idle {
            warn!("Session already active ({:?}), start ignored", self.state);
            return false;
        }

        self.clock = SessionClock::start(now);
        self.calibration.reset(now);
        self.monitoring = None;
        self.scorer.reset();
        self.final_summary = None;
        self.state = SessionState::Calibrating;

        info!(
            "Session started, calibrating for {}s",
            self.config.calibration.window_secs
        );
        true
    }

    /// Process one tick of the frame source. `frame` is `None` when the
    /// detector found no face.
    ///
    /// Returns `Ok(None)` when idle or paused. A calibration failure aborts the
    /// session (the engine returns to idle) and is returned as an error.
    pub fn process(
        &mut self,
        now: f64,
        frame: Option<&LandmarkFrame>,
    ) -> Result<Option<FrameUpdate>, MonitorError> {
        match self.state {
            SessionState::Idle | SessionState::Paused => Ok(None),
            SessionState::Calibrating => self.process_calibration(now, frame).map(Some),
            SessionState::Monitoring => Ok(Some(self.process_monitoring(now, frame))),
        }
    }

    fn process_calibration(
        &mut self,
        now: f64,
        frame: Option<&LandmarkFrame>,
    ) -> Result<FrameUpdate, MonitorError> {
        self.clock.tick(now);
        if let Some(frame) = frame {
            self.calibration.observe(&EyeMouthMetrics::from_frame(frame));
        }

        let baseline = if self.config.monitoring_start == MonitoringStart::CalibrationTimer
            && self.calibration.is_window_elapsed(now)
        {
            Some(self.enter_monitoring(now)?)
        } else {
            None
        };

        Ok(FrameUpdate {
            live: self.live(None),
            baseline,
            checkpoint: None,
        })
    }

    fn process_monitoring(&mut self, now: f64, frame: Option<&LandmarkFrame>) -> FrameUpdate {
        let delta = self.clock.tick(now);
        let elapsed = self.clock.monitoring_elapsed();

        let mut alert = None;
        let mut checkpoint_due = false;

        if let Some(phase) = self.monitoring.as_mut() {
            if let Some(frame) = frame {
                phase.observe(&EyeMouthMetrics::from_frame(frame), elapsed, delta);

                let indicators = phase.indicators(elapsed);
                gauge!("fatigue_perclos_percent").set(indicators.perclos);

                alert = self.scorer.evaluate(&indicators, elapsed);
                if alert.is_some() {
                    counter!("fatigue_alerts_total").increment(1);
                }
            }

            if let CheckpointPolicy::Interval { interval_secs } = self.config.checkpoint {
                if elapsed - phase.last_checkpoint_secs >= interval_secs {
                    phase.last_checkpoint_secs = elapsed;
                    checkpoint_due = true;
                }
            }
        }

        let checkpoint = checkpoint_due.then(|| {
            debug!("Periodic checkpoint at {:.1}s", elapsed);
            self.build_summary(None)
        });

        FrameUpdate {
            live: self.live(alert),
            baseline: None,
            checkpoint,
        }
    }

    /// Start monitoring on an external signal (e.g. content started playing).
    ///
    /// Finalizes calibration with the samples collected so far. Returns
    /// `Ok(None)` if the session is not calibrating.
    pub fn begin_monitoring(&mut self, now: f64) -> Result<Option<BaselineProfile>, MonitorError> {
        if self.state != SessionState::Calibrating {
            debug!("begin_monitoring ignored in state {:?}", self.state);
            return Ok(None);
        }
        self.clock.advance(now);
        self.enter_monitoring(now).map(Some)
    }

    fn enter_monitoring(&mut self, now: f64) -> Result<BaselineProfile, MonitorError> {
        let baseline = match self.calibration.finalize() {
            Ok(baseline) => baseline,
            Err(e) => {
                warn!("{}; session aborted", e);
                self.state = SessionState::Idle;
                self.calibration.reset(now);
                return Err(e);
            }
        };

        self.monitoring = Some(MonitoringPhase::new(baseline, &self.config));
        self.scorer.reset();
        self.clock.begin_monitoring(now);
        self.state = SessionState::Monitoring;

        info!("Monitoring started at {:.2}", now);
        Ok(baseline)
    }

    /// Suspend monitoring; frames are ignored until `resume`
    pub fn pause(&mut self, now: f64) -> bool {
        if self.state != SessionState::Monitoring {
            return false;
        }
        self.clock.pause(now);
        self.state = SessionState::Paused;
        info!("Monitoring paused at {:.1}s", self.clock.monitoring_elapsed());
        true
    }

    pub fn resume(&mut self, now: f64) -> bool {
        if self.state != SessionState::Paused {
            return false;
        }
        self.clock.resume(now);
        self.state = SessionState::Monitoring;
        info!("Monitoring resumed");
        true
    }

    /// End the session, producing the final summary.
    ///
    /// `sleepiness` is an optional subjective score (1-9) collected from the
    /// subject. Returns `None` if no session is active.
    pub fn stop(&mut self, now: f64, sleepiness: Option<u8>) -> Option<SessionSummary> {
        if self.state == SessionState::Idle {
            debug!("stop ignored: no active session");
            return None;
        }

        self.clock.advance(now);
        let summary = self.build_summary(sleepiness);
        self.state = SessionState::Idle;

        info!(
            "Session stopped after {:.1}s: {} blinks, {} yawns, PERCLOS {:.2}%, {} alerts, fatigued: {}",
            summary.elapsed_secs,
            summary.blink_count,
            summary.yawn_count,
            summary.perclos,
            summary.alert_count,
            summary.is_fatigued
        );

        self.final_summary = Some(summary.clone());
        Some(summary)
    }

    /// Current summary of the active session, or the final summary of the
    /// last one. Does not change any state.
    pub fn summary(&self) -> Option<SessionSummary> {
        if self.state == SessionState::Idle {
            self.final_summary.clone()
        } else {
            Some(self.build_summary(None))
        }
    }

    fn build_summary(&self, sleepiness: Option<u8>) -> SessionSummary {
        let alert_count = self.scorer.alert_count();
        let verdict = &self.config.verdict;

        let Some(phase) = self.monitoring.as_ref() else {
            return SessionSummary::empty(
                sleepiness,
                verdict.is_fatigued(0.0, alert_count, sleepiness),
            );
        };

        let elapsed = self.clock.monitoring_elapsed();
        let indicators = phase.indicators(elapsed);
        let blink = phase.blink.state();

        SessionSummary {
            elapsed_secs: elapsed,
            perclos: indicators.perclos,
            blink_count: blink.blink_count,
            incomplete_blink_count: blink.incomplete_blink_count,
            average_ear: phase.average_ear(),
            blink_rate_per_min: indicators.blink_rate_per_min,
            incomplete_blink_pct: indicators.incomplete_pct,
            yawn_count: indicators.yawn_count,
            closed_time_secs: indicators.closed_time_secs,
            gaze_velocity: indicators.gaze_velocity,
            max_time_without_blink: blink.max_time_without_blink,
            alert_count,
            fatigue_events: self.scorer.events().to_vec(),
            sleepiness_score: sleepiness,
            is_fatigued: verdict.is_fatigued(indicators.perclos, alert_count, sleepiness),
            baseline: Some(phase.baseline),
        }
    }

    fn live(&self, alert: Option<FatigueEvent>) -> LiveMetrics {
        let (blink_count, yawn_count, perclos) = self.monitoring.as_ref().map_or((0, 0, 0.0), |m| {
            (m.blink.state().blink_count, m.yawn.yawn_count(), m.blink.state().perclos())
        });

        LiveMetrics {
            state: self.state,
            calibration_remaining_secs: (self.state == SessionState::Calibrating)
                .then(|| self.calibration.remaining(self.clock.now())),
            elapsed_secs: self.clock.monitoring_elapsed(),
            blink_count,
            yawn_count,
            perclos,
            fatigue_score: self.scorer.last_score(),
            alert_count: self.scorer.alert_count(),
            alert,
        }
    }
}
