//! Fatigue monitor configuration
//!
//! Every threshold here is an empirically chosen default, not an invariant.

use alerting::AlertConfig;
use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// Fatigue monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub calibration: CalibrationConfig,
    pub blink: BlinkConfig,
    pub yawn: YawnConfig,
    pub gaze: GazeConfig,
    pub scoring: ScoringTable,
    pub alert: AlertConfig,
    pub verdict: VerdictConfig,
    pub checkpoint: CheckpointPolicy,
    pub monitoring_start: MonitoringStart,
}

/// Baseline capture and threshold derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Calibration window length (seconds)
    pub window_secs: f64,
    /// Eye-closed threshold as a fraction of baseline EAR
    pub close_factor: f64,
    /// Eye-reopened threshold as a fraction of baseline EAR
    pub open_factor: f64,
    /// Yawn threshold margin above baseline MAR
    pub yawn_margin: f64,
    /// Lowest allowed yawn threshold
    pub yawn_floor: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            window_secs: 10.0,
            close_factor: 0.55,
            open_factor: 0.85,
            yawn_margin: 0.30,
            yawn_floor: 0.50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// A blink whose minimum EAR stays above `thres_close * incomplete_factor`
    /// is incomplete
    pub incomplete_factor: f64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            incomplete_factor: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YawnConfig {
    /// Mouth must stay open strictly longer than this to count (seconds)
    pub min_duration_secs: f64,
}

impl Default for YawnConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Average velocity reads zero until more than this many samples exist
    pub min_samples: u64,
    /// Multiplier applied to mean per-frame displacement
    pub velocity_scale: f64,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            velocity_scale: 100.0,
        }
    }
}

/// Rule table for the composite fatigue score. Each row adds its weight
/// independently when its condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTable {
    /// PERCLOS (%) at or above which the row fires
    pub perclos_pct: f64,
    pub perclos_weight: u32,
    /// Blinks per minute at or below which the row fires
    pub blink_rate_per_min: f64,
    pub blink_rate_weight: u32,
    /// Incomplete blinks (%) at or above which the row fires
    pub incomplete_pct: f64,
    pub incomplete_weight: u32,
    /// Yawn count at or above which the row fires
    pub yawn_count: u32,
    pub yawn_weight: u32,
    /// Average gaze velocity strictly below which the row fires
    pub gaze_velocity: f64,
    pub gaze_weight: u32,
    /// Accumulated eye-closed time (seconds) at or above which the row fires
    pub closed_time_secs: f64,
    pub closed_time_weight: u32,
}

impl Default for ScoringTable {
    fn default() -> Self {
        Self {
            perclos_pct: 28.0,
            perclos_weight: 3,
            blink_rate_per_min: 5.0,
            blink_rate_weight: 3,
            incomplete_pct: 20.0,
            incomplete_weight: 2,
            yawn_count: 1,
            yawn_weight: 1,
            gaze_velocity: 0.02,
            gaze_weight: 1,
            closed_time_secs: 3.0,
            closed_time_weight: 1,
        }
    }
}

/// Session-level fatigue verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// PERCLOS (%) at or above which the session is fatigued
    pub perclos_pct: f64,
    /// Alert count at or above which the session is fatigued
    pub alert_count: usize,
    /// Subjective sleepiness (1-9) at or above which the session is fatigued
    pub sleepiness_score: u8,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            perclos_pct: 15.0,
            alert_count: 2,
            sleepiness_score: 7,
        }
    }
}

impl VerdictConfig {
    pub fn is_fatigued(&self, perclos: f64, alert_count: usize, sleepiness: Option<u8>) -> bool {
        perclos >= self.perclos_pct
            || alert_count >= self.alert_count
            || sleepiness.is_some_and(|s| s >= self.sleepiness_score)
    }
}

/// When the engine emits a summary checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CheckpointPolicy {
    /// Every `interval_secs` of elapsed monitoring time, plus the final summary
    Interval { interval_secs: f64 },
    /// Only the final summary at `stop`
    FinalOnly,
    /// Never emitted automatically; the host pulls `SessionEngine::summary`
    /// when its own trigger fires. The final summary is still produced.
    External,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        CheckpointPolicy::Interval {
            interval_secs: 60.0,
        }
    }
}

/// What moves the session from calibration to monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringStart {
    /// As soon as the calibration window has elapsed
    #[default]
    CalibrationTimer,
    /// When the host signals that content started playing
    External,
}

impl MonitorConfig {
    /// Reject settings that would break threshold ordering or timing
    pub fn validate(&self) -> Result<(), MonitorError> {
        let c = &self.calibration;
        if !(c.window_secs > 0.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "calibration.window_secs must be positive, got {}",
                c.window_secs
            )));
        }
        if !(c.close_factor > 0.0 && c.close_factor < c.open_factor) {
            return Err(MonitorError::InvalidConfig(format!(
                "calibration factors must satisfy 0 < close_factor < open_factor, got {} / {}",
                c.close_factor, c.open_factor
            )));
        }
        if !(self.blink.incomplete_factor > 0.0 && self.blink.incomplete_factor <= 1.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "blink.incomplete_factor must be in (0, 1], got {}",
                self.blink.incomplete_factor
            )));
        }
        if self.yawn.min_duration_secs < 0.0 || self.alert.cooldown_secs < 0.0 {
            return Err(MonitorError::InvalidConfig(
                "durations must not be negative".into(),
            ));
        }
        if self.alert.severe_score < self.alert.alert_score {
            return Err(MonitorError::InvalidConfig(format!(
                "alert.severe_score ({}) below alert.alert_score ({})",
                self.alert.severe_score, self.alert.alert_score
            )));
        }
        if let CheckpointPolicy::Interval { interval_secs } = self.checkpoint {
            if !(interval_secs > 0.0) {
                return Err(MonitorError::InvalidConfig(format!(
                    "checkpoint interval must be positive, got {}",
                    interval_secs
                )));
            }
        }
        Ok(())
    }
}
