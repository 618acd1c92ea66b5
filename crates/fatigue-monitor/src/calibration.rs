//! Per-subject baseline calibration

use face_landmarks::EyeMouthMetrics;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CalibrationConfig;
use crate::MonitorError;

/// Personalized thresholds, fixed for the rest of a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineProfile {
    pub baseline_ear: f64,
    pub baseline_mar: f64,
    /// Eye counts as closed below this EAR
    pub thres_close: f64,
    /// Eye counts as reopened above this EAR
    pub thres_open: f64,
    /// Mouth counts as yawning above this MAR
    pub thres_yawn: f64,
}

impl BaselineProfile {
    /// Derive thresholds from baseline ratios
    pub fn from_baseline(
        baseline_ear: f64,
        baseline_mar: f64,
        config: &CalibrationConfig,
    ) -> Self {
        Self {
            baseline_ear,
            baseline_mar,
            thres_close: baseline_ear * config.close_factor,
            thres_open: baseline_ear * config.open_factor,
            thres_yawn: (baseline_mar + config.yawn_margin).max(config.yawn_floor),
        }
    }
}

/// Collects ratio samples over the calibration window
#[derive(Debug, Clone)]
pub struct CalibrationAccumulator {
    config: CalibrationConfig,
    started_at: f64,
    ear_samples: Vec<f64>,
    mar_samples: Vec<f64>,
}

impl CalibrationAccumulator {
    pub fn new(config: CalibrationConfig, started_at: f64) -> Self {
        Self {
            config,
            started_at,
            ear_samples: Vec::new(),
            mar_samples: Vec::new(),
        }
    }

    /// Drop all samples and restart the window
    pub fn reset(&mut self, started_at: f64) {
        self.started_at = started_at;
        self.ear_samples.clear();
        self.mar_samples.clear();
    }

    pub fn observe(&mut self, metrics: &EyeMouthMetrics) {
        self.ear_samples.push(metrics.ear);
        self.mar_samples.push(metrics.mar);
    }

    pub fn sample_count(&self) -> usize {
        self.ear_samples.len()
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        (now - self.started_at).max(0.0)
    }

    /// Seconds left in the window
    pub fn remaining(&self, now: f64) -> f64 {
        (self.config.window_secs - self.elapsed(now)).max(0.0)
    }

    pub fn is_window_elapsed(&self, now: f64) -> bool {
        self.elapsed(now) >= self.config.window_secs
    }

    /// Reduce the collected samples to a baseline profile
    pub fn finalize(&self) -> Result<BaselineProfile, MonitorError> {
        let samples = self.sample_count();
        if samples == 0 {
            return Err(MonitorError::CalibrationFailed {
                samples,
                reason: "no face observed during calibration".into(),
            });
        }

        let baseline_ear = mean(&self.ear_samples);
        let baseline_mar = mean(&self.mar_samples);

        // thres_close < thres_open only holds for a positive baseline
        if !(baseline_ear > 0.0) {
            return Err(MonitorError::CalibrationFailed {
                samples,
                reason: format!("baseline eye ratio {baseline_ear} is not positive"),
            });
        }

        let profile = BaselineProfile::from_baseline(baseline_ear, baseline_mar, &self.config);
        info!(
            "Calibration complete ({} samples): EAR {:.4}, MAR {:.4}, close < {:.4}, open > {:.4}, yawn > {:.4}",
            samples,
            profile.baseline_ear,
            profile.baseline_mar,
            profile.thres_close,
            profile.thres_open,
            profile.thres_yawn
        );
        Ok(profile)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
