//! Alert Manager Implementation

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Alert configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum fatigue score that raises an alert (default: 3)
    pub alert_score: u32,
    /// Minimum fatigue score classified as severe (default: 5)
    pub severe_score: u32,
    /// Minimum time between alerts, in seconds (default: 30)
    pub cooldown_secs: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            alert_score: 3,
            severe_score: 5,
            cooldown_secs: 30.0,
        }
    }
}

/// Fatigue alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Moderate,
    Severe,
}

impl Severity {
    /// Human-readable reason stored with each fatigue moment
    pub fn reason(&self) -> &'static str {
        match self {
            Severity::Moderate => "Moderate fatigue",
            Severity::Severe => "Severe fatigue",
        }
    }
}

/// A logged fatigue moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatigueEvent {
    /// Whole seconds since monitoring started
    pub elapsed_seconds: u64,
    pub severity: Severity,
}

/// Cooldown-gated alert manager.
///
/// The score itself is recomputed every frame elsewhere; this only debounces
/// the alert channel.
#[derive(Debug, Clone)]
pub struct AlertManager {
    config: AlertConfig,
    /// Session time of the last alert (seconds)
    last_fired: Option<f64>,
    /// Ordered by non-decreasing `elapsed_seconds`
    events: Vec<FatigueEvent>,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        debug!("Creating alert manager with config: {:?}", config);
        Self {
            config,
            last_fired: None,
            events: Vec::new(),
        }
    }

    /// Check whether a score at `now` should raise an alert
    pub fn should_fire(&self, score: u32, now: f64) -> bool {
        if score < self.config.alert_score {
            return false;
        }

        match self.last_fired {
            Some(last) if now - last <= self.config.cooldown_secs => {
                debug!("Alert suppressed: in cooldown period ({:.1}s since last)", now - last);
                false
            }
            _ => true,
        }
    }

    /// Record a fired alert and log the fatigue moment
    pub fn record_fire(&mut self, score: u32, now: f64, elapsed_secs: f64) -> FatigueEvent {
        let event = FatigueEvent {
            elapsed_seconds: elapsed_secs.max(0.0).round() as u64,
            severity: self.severity(score),
        };
        self.last_fired = Some(now);
        self.events.push(event);

        info!(
            "Fatigue alert #{} at {}s: {:?} (score {})",
            self.events.len(),
            event.elapsed_seconds,
            event.severity,
            score
        );
        event
    }

    /// Fire if allowed. Returns the logged event when an alert was raised.
    pub fn evaluate(&mut self, score: u32, now: f64, elapsed_secs: f64) -> Option<FatigueEvent> {
        if self.should_fire(score, now) {
            Some(self.record_fire(score, now, elapsed_secs))
        } else {
            None
        }
    }

    /// Map a score to severity
    pub fn severity(&self, score: u32) -> Severity {
        if score >= self.config.severe_score {
            Severity::Severe
        } else {
            Severity::Moderate
        }
    }

    /// Number of alerts raised
    pub fn alert_count(&self) -> usize {
        self.events.len()
    }

    /// Fatigue moments in the order they were raised
    pub fn events(&self) -> &[FatigueEvent] {
        &self.events
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Clear alert history and cooldown
    pub fn clear(&mut self) {
        self.last_fired = None;
        self.events.clear();
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_threshold() {
        let manager = AlertManager::default();

        assert!(!manager.should_fire(2, 100.0));
        assert!(manager.should_fire(3, 100.0));
    }

    #[test]
    fn test_first_alert_not_gated() {
        let mut manager = AlertManager::default();
        assert!(manager.evaluate(4, 0.0, 0.0).is_some());
    }

    #[test]
    fn test_cooldown_suppresses_within_window() {
        let mut manager = AlertManager::default();

        assert!(manager.evaluate(4, 10.0, 10.0).is_some());
        assert!(manager.evaluate(4, 20.0, 20.0).is_none());
        // Exactly at the cooldown boundary is still suppressed
        assert!(manager.evaluate(4, 40.0, 40.0).is_none());
        assert_eq!(manager.alert_count(), 1);
    }

    #[test]
    fn test_cooldown_allows_after_window() {
        let mut manager = AlertManager::default();

        assert!(manager.evaluate(4, 10.0, 10.0).is_some());
        assert!(manager.evaluate(4, 50.0, 50.0).is_some());
        assert_eq!(manager.alert_count(), 2);
    }

    #[test]
    fn test_severity_levels() {
        let manager = AlertManager::default();

        assert_eq!(manager.severity(3), Severity::Moderate);
        assert_eq!(manager.severity(4), Severity::Moderate);
        assert_eq!(manager.severity(5), Severity::Severe);
        assert_eq!(manager.severity(11), Severity::Severe);
    }

    #[test]
    fn test_event_log_order_and_rounding() {
        let mut manager = AlertManager::default();
        manager.evaluate(3, 5.0, 4.6);
        manager.evaluate(6, 40.0, 39.4);

        let events = manager.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].elapsed_seconds, 5);
        assert_eq!(events[0].severity, Severity::Moderate);
        assert_eq!(events[1].elapsed_seconds, 39);
        assert_eq!(events[1].severity, Severity::Severe);
        assert!(events[0].elapsed_seconds <= events[1].elapsed_seconds);
    }

    #[test]
    fn test_clear_resets_cooldown() {
        let mut manager = AlertManager::default();
        manager.evaluate(3, 5.0, 5.0);
        manager.clear();

        assert_eq!(manager.alert_count(), 0);
        assert!(manager.should_fire(3, 6.0));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: AlertConfig = serde_json::from_str(r#"{ "cooldown_secs": 10.0 }"#).unwrap();
        assert_eq!(config.cooldown_secs, 10.0);
        assert_eq!(config.alert_score, 3);
    }
}
