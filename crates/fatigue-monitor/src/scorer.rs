//! Composite fatigue score and alert raising

use std::fmt;

use alerting::{AlertConfig, AlertManager, FatigueEvent};
use serde::{Deserialize, Serialize};

use crate::blink::BlinkState;
use crate::config::ScoringTable;

/// Running aggregates the score is computed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FatigueIndicators {
    /// Percentage of frames with eyes closed
    pub perclos: f64,
    pub blink_rate_per_min: f64,
    /// Percentage of blinks that were incomplete
    pub incomplete_pct: f64,
    pub yawn_count: u32,
    pub gaze_velocity: f64,
    pub closed_time_secs: f64,
}

impl FatigueIndicators {
    /// Derive indicators from detector state after `elapsed_secs` of monitoring
    pub fn from_state(
        blink: &BlinkState,
        yawn_count: u32,
        gaze_velocity: f64,
        elapsed_secs: f64,
    ) -> Self {
        let blink_rate_per_min = if elapsed_secs > 0.0 {
            blink.blink_count as f64 / (elapsed_secs / 60.0)
        } else {
            0.0
        };

        Self {
            perclos: blink.perclos(),
            blink_rate_per_min,
            incomplete_pct: blink.incomplete_pct(),
            yawn_count,
            gaze_velocity,
            closed_time_secs: blink.accumulated_closed_time,
        }
    }
}

/// A fatigue scoring function. Swap implementations to retune or replace
/// the rule table without touching the detectors.
pub trait ScoringRule: fmt::Debug + Send + Sync {
    fn score(&self, indicators: &FatigueIndicators) -> u32;
}

impl ScoringRule for ScoringTable {
    fn score(&self, ind: &FatigueIndicators) -> u32 {
        let rows = [
            (ind.perclos >= self.perclos_pct, self.perclos_weight),
            (ind.blink_rate_per_min <= self.blink_rate_per_min, self.blink_rate_weight),
            (ind.incomplete_pct >= self.incomplete_pct, self.incomplete_weight),
            (ind.yawn_count >= self.yawn_count, self.yawn_weight),
            (ind.gaze_velocity < self.gaze_velocity, self.gaze_weight),
            (ind.closed_time_secs >= self.closed_time_secs, self.closed_time_weight),
        ];

        rows.iter()
            .filter(|(hit, _)| *hit)
            .map(|(_, weight)| weight)
            .sum()
    }
}

/// Scores every monitoring frame and raises cooldown-gated alerts
#[derive(Debug)]
pub struct FatigueScorer {
    rule: Box<dyn ScoringRule>,
    alerts: AlertManager,
    last_score: u32,
}

impl FatigueScorer {
    pub fn new(rule: Box<dyn ScoringRule>, alert: AlertConfig) -> Self {
        Self {
            rule,
            alerts: AlertManager::new(alert),
            last_score: 0,
        }
    }

    /// Score the current frame at `elapsed_secs` of monitoring (pauses
    /// excluded); returns the alert raised, if any.
    ///
    /// The cooldown runs on the same timeline, so time spent paused never
    /// counts toward it.
    pub fn evaluate(
        &mut self,
        indicators: &FatigueIndicators,
        elapsed_secs: f64,
    ) -> Option<FatigueEvent> {
        let score = self.rule.score(indicators);
        self.last_score = score;
        self.alerts.evaluate(score, elapsed_secs, elapsed_secs)
    }

    /// Score of the most recent frame
    pub fn last_score(&self) -> u32 {
        self.last_score
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.alert_count()
    }

    pub fn events(&self) -> &[FatigueEvent] {
        self.alerts.events()
    }

    /// Forget alerts and cooldown for a new monitoring phase
    pub fn reset(&mut self) {
        self.alerts.clear();
        self.last_score = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::Severity;

    /// Indicators of a rested subject: score 0
    fn rested() -> FatigueIndicators {
        FatigueIndicators {
            perclos: 2.0,
            blink_rate_per_min: 15.0,
            incomplete_pct: 0.0,
            yawn_count: 0,
            gaze_velocity: 0.5,
            closed_time_secs: 0.5,
        }
    }

    #[test]
    fn test_rested_scores_zero() {
        assert_eq!(ScoringTable::default().score(&rested()), 0);
    }

    #[test]
    fn test_each_row_adds_weight() {
        let table = ScoringTable::default();
        let cases = [
            (FatigueIndicators { perclos: 28.0, ..rested() }, 3),
            (FatigueIndicators { blink_rate_per_min: 5.0, ..rested() }, 3),
            (FatigueIndicators { incomplete_pct: 20.0, ..rested() }, 2),
            (FatigueIndicators { yawn_count: 1, ..rested() }, 1),
            (FatigueIndicators { gaze_velocity: 0.019, ..rested() }, 1),
            (FatigueIndicators { closed_time_secs: 3.0, ..rested() }, 1),
        ];
        for (indicators, expected) in cases {
            assert_eq!(table.score(&indicators), expected, "{:?}", indicators);
        }
    }

    #[test]
    fn test_rows_are_additive() {
        let all = FatigueIndicators {
            perclos: 40.0,
            blink_rate_per_min: 2.0,
            incomplete_pct: 50.0,
            yawn_count: 3,
            gaze_velocity: 0.0,
            closed_time_secs: 10.0,
        };
        assert_eq!(ScoringTable::default().score(&all), 11);
    }

    #[test]
    fn test_indicators_from_state() {
        let blink = BlinkState {
            is_blinking: false,
            min_ear_in_blink: 1.0,
            blink_count: 10,
            incomplete_blink_count: 3,
            accumulated_closed_time: 1.2,
            last_blink_timestamp: 0.0,
            max_time_without_blink: 0.0,
            closed_frames: 30,
            total_frames: 600,
        };
        let ind = FatigueIndicators::from_state(&blink, 1, 0.3, 120.0);
        assert!((ind.perclos - 5.0).abs() < 1e-12);
        assert!((ind.blink_rate_per_min - 5.0).abs() < 1e-12);
        assert!((ind.incomplete_pct - 30.0).abs() < 1e-12);
        assert_eq!(ind.yawn_count, 1);
        assert!((ind.closed_time_secs - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_cooldown_between_triggers() {
        let tired = FatigueIndicators { perclos: 30.0, ..rested() };

        let mut scorer = FatigueScorer::new(Box::new(ScoringTable::default()), AlertConfig::default());
        assert!(scorer.evaluate(&tired, 5.0).is_some());
        assert!(scorer.evaluate(&tired, 15.0).is_none());
        assert_eq!(scorer.alert_count(), 1);

        let mut scorer = FatigueScorer::new(Box::new(ScoringTable::default()), AlertConfig::default());
        assert!(scorer.evaluate(&tired, 5.0).is_some());
        assert!(scorer.evaluate(&tired, 45.0).is_some());
        assert_eq!(scorer.alert_count(), 2);
    }

    #[test]
    fn test_score_recomputed_during_cooldown() {
        let mut scorer = FatigueScorer::new(Box::new(ScoringTable::default()), AlertConfig::default());
        scorer.evaluate(&FatigueIndicators { perclos: 30.0, ..rested() }, 0.0);
        scorer.evaluate(&rested(), 1.0);
        assert_eq!(scorer.last_score(), 0);
    }

    #[test]
    fn test_severe_alert() {
        let severe = FatigueIndicators {
            perclos: 30.0,
            blink_rate_per_min: 3.0,
            ..rested()
        };
        let mut scorer = FatigueScorer::new(Box::new(ScoringTable::default()), AlertConfig::default());
        let event = scorer.evaluate(&severe, 12.4).unwrap();
        assert_eq!(event.severity, Severity::Severe);
        assert_eq!(event.elapsed_seconds, 12);
    }

    #[derive(Debug)]
    struct YawnsOnly;

    impl ScoringRule for YawnsOnly {
        fn score(&self, indicators: &FatigueIndicators) -> u32 {
            indicators.yawn_count * 3
        }
    }

    #[test]
    fn test_custom_rule() {
        let mut scorer = FatigueScorer::new(Box::new(YawnsOnly), AlertConfig::default());
        assert!(scorer.evaluate(&FatigueIndicators { perclos: 90.0, ..rested() }, 0.0).is_none());
        assert!(scorer.evaluate(&FatigueIndicators { yawn_count: 1, ..rested() }, 1.0).is_some());
    }
}
