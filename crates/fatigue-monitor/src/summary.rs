//! Session summaries, live updates, and the persistence report

use alerting::FatigueEvent;
use serde::{Deserialize, Serialize};

use crate::calibration::BaselineProfile;
use crate::state::SessionState;

/// Read-only projection of the running aggregates.
///
/// Values are unrounded; see [`FatigueReport`] for the boundary form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Monitoring time excluding pauses (seconds)
    pub elapsed_secs: f64,
    pub perclos: f64,
    pub blink_count: u32,
    pub incomplete_blink_count: u32,
    /// Mean EAR over monitored frames
    pub average_ear: f64,
    pub blink_rate_per_min: f64,
    pub incomplete_blink_pct: f64,
    pub yawn_count: u32,
    pub closed_time_secs: f64,
    pub gaze_velocity: f64,
    pub max_time_without_blink: f64,
    pub alert_count: usize,
    pub fatigue_events: Vec<FatigueEvent>,
    /// Subjective sleepiness (1-9) reported at session end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleepiness_score: Option<u8>,
    pub is_fatigued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BaselineProfile>,
}

impl SessionSummary {
    /// Summary of a session that never reached monitoring
    pub fn empty(sleepiness_score: Option<u8>, is_fatigued: bool) -> Self {
        Self {
            elapsed_secs: 0.0,
            perclos: 0.0,
            blink_count: 0,
            incomplete_blink_count: 0,
            average_ear: 0.0,
            blink_rate_per_min: 0.0,
            incomplete_blink_pct: 0.0,
            yawn_count: 0,
            closed_time_secs: 0.0,
            gaze_velocity: 0.0,
            max_time_without_blink: 0.0,
            alert_count: 0,
            fatigue_events: Vec::new(),
            sleepiness_score,
            is_fatigued,
            baseline: None,
        }
    }

    /// Round for the persistence collaborator
    pub fn to_report(&self) -> FatigueReport {
        FatigueReport {
            elapsed_seconds: self.elapsed_secs.max(0.0).round() as u64,
            perclos: round_to(self.perclos, 2),
            blink_count: self.blink_count,
            average_ear: round_to(self.average_ear, 4),
            blink_rate_per_min: round_to(self.blink_rate_per_min, 2),
            incomplete_blink_pct: round_to(self.incomplete_blink_pct, 2),
            yawn_count: self.yawn_count,
            closed_time_secs: round_to(self.closed_time_secs, 2),
            gaze_velocity: round_to(self.gaze_velocity, 4),
            max_without_blink_secs: self.max_time_without_blink.max(0.0).round() as u64,
            sleepiness_score: self.sleepiness_score,
            alert_count: self.alert_count,
            fatigue_moments: self
                .fatigue_events
                .iter()
                .map(|e| FatigueMoment {
                    t: e.elapsed_seconds,
                    reason: e.severity.reason().to_string(),
                })
                .collect(),
            is_fatigued: self.is_fatigued,
        }
    }
}

/// Logged fatigue moment in report form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatigueMoment {
    pub t: u64,
    pub reason: String,
}

/// Rounded session metrics as handed to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueReport {
    pub elapsed_seconds: u64,
    pub perclos: f64,
    pub blink_count: u32,
    pub average_ear: f64,
    pub blink_rate_per_min: f64,
    pub incomplete_blink_pct: f64,
    pub yawn_count: u32,
    pub closed_time_secs: f64,
    pub gaze_velocity: f64,
    pub max_without_blink_secs: u64,
    pub sleepiness_score: Option<u8>,
    pub alert_count: usize,
    pub fatigue_moments: Vec<FatigueMoment>,
    pub is_fatigued: bool,
}

/// Per-frame fields for live display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveMetrics {
    pub state: SessionState,
    /// Seconds left while calibrating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration_remaining_secs: Option<f64>,
    pub elapsed_secs: f64,
    pub blink_count: u32,
    pub yawn_count: u32,
    pub perclos: f64,
    pub fatigue_score: u32,
    pub alert_count: usize,
    /// Alert raised on this frame (banner trigger)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<FatigueEvent>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::Severity;

    #[test]
    fn test_report_rounding() {
        let summary = SessionSummary {
            elapsed_secs: 61.6,
            perclos: 12.3456,
            blink_count: 14,
            average_ear: 0.287654,
            blink_rate_per_min: 13.63636,
            incomplete_blink_pct: 21.428571,
            closed_time_secs: 1.23456,
            gaze_velocity: 0.123456,
            max_time_without_blink: 9.4,
            alert_count: 1,
            fatigue_events: vec![FatigueEvent {
                elapsed_seconds: 3,
                severity: Severity::Severe,
            }],
            ..SessionSummary::empty(Some(5), false)
        };

        let report = summary.to_report();
        assert_eq!(report.elapsed_seconds, 62);
        assert_eq!(report.perclos, 12.35);
        assert_eq!(report.average_ear, 0.2877);
        assert_eq!(report.blink_rate_per_min, 13.64);
        assert_eq!(report.incomplete_blink_pct, 21.43);
        assert_eq!(report.closed_time_secs, 1.23);
        assert_eq!(report.gaze_velocity, 0.1235);
        assert_eq!(report.max_without_blink_secs, 9);
        assert_eq!(report.sleepiness_score, Some(5));
        assert_eq!(report.fatigue_moments[0].t, 3);
        assert_eq!(report.fatigue_moments[0].reason, Severity::Severe.reason());
    }

    #[test]
    fn test_report_missing_sleepiness_is_null() {
        let report = SessionSummary::empty(None, false).to_report();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["sleepiness_score"].is_null());
        assert_eq!(json["fatigue_moments"], serde_json::json!([]));
    }
}
