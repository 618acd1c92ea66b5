//! Session state tracking

use serde::{Deserialize, Serialize};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Calibrating,
    Monitoring,
    /// Monitoring suspended by the host; counters are kept
    Paused,
}

/// Host-supplied clock, sampled once per frame
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    /// Latest timestamp seen
    now: f64,
    /// Timestamp of the previous processed tick
    last_tick: f64,
    monitoring_started_at: Option<f64>,
    /// Total time spent paused
    paused_total: f64,
    paused_at: Option<f64>,
}

impl SessionClock {
    pub fn start(now: f64) -> Self {
        Self {
            now,
            last_tick: now,
            ..Default::default()
        }
    }

    /// Advance to `now`, returning the time since the previous tick
    pub fn tick(&mut self, now: f64) -> f64 {
        let delta = (now - self.last_tick).max(0.0);
        self.last_tick = now;
        self.now = self.now.max(now);
        delta
    }

    /// Move the clock without consuming a frame
    pub fn advance(&mut self, now: f64) {
        self.now = self.now.max(now);
    }

    pub fn begin_monitoring(&mut self, now: f64) {
        self.monitoring_started_at = Some(now);
        self.paused_total = 0.0;
        self.paused_at = None;
        self.last_tick = now;
        self.now = self.now.max(now);
    }

    pub fn pause(&mut self, now: f64) {
        self.advance(now);
        self.paused_at = Some(self.now);
    }

    pub fn resume(&mut self, now: f64) {
        self.advance(now);
        if let Some(at) = self.paused_at.take() {
            self.paused_total += self.now - at;
        }
        // The paused gap must not leak into the next frame delta
        self.last_tick = self.now;
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Monitoring time excluding pauses
    pub fn monitoring_elapsed(&self) -> f64 {
        let Some(start) = self.monitoring_started_at else {
            return 0.0;
        };
        let paused_now = self.paused_at.map_or(0.0, |at| self.now - at);
        (self.now - start - self.paused_total - paused_now).max(0.0)
    }
}
