//! Yawn detection
//!
//! The mouth opens when MAR rises above the yawn threshold. On closing, the
//! yawn counts only if it lasted longer than the minimum duration, which
//! filters out speech. A yawn still open when the session ends is not counted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::YawnConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YawnState {
    pub is_yawning: bool,
    pub yawn_start_time: f64,
    pub yawn_count: u32,
}

/// Outcome of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YawnTransition {
    Steady,
    Opened,
    /// Mouth closed after `duration` seconds
    Closed { duration: f64, counted: bool },
}

/// Mouth open/closed state machine
#[derive(Debug, Clone)]
pub struct YawnDetector {
    thres_yawn: f64,
    min_duration: f64,
    state: YawnState,
}

impl YawnDetector {
    pub fn new(thres_yawn: f64, config: &YawnConfig) -> Self {
        Self {
            thres_yawn,
            min_duration: config.min_duration_secs,
            state: YawnState::default(),
        }
    }

    /// Feed one frame's MAR at session time `t` (pauses excluded)
    pub fn update(&mut self, mar: f64, t: f64) -> YawnTransition {
        let state = &mut self.state;

        if mar > self.thres_yawn {
            if state.is_yawning {
                return YawnTransition::Steady;
            }
            state.is_yawning = true;
            state.yawn_start_time = t;
            return YawnTransition::Opened;
        }

        if !state.is_yawning {
            return YawnTransition::Steady;
        }

        state.is_yawning = false;
        let duration = t - state.yawn_start_time;
        let counted = duration > self.min_duration;
        if counted {
            state.yawn_count += 1;
            debug!("Yawn #{} ({:.2}s)", state.yawn_count, duration);
        }
        YawnTransition::Closed { duration, counted }
    }

    pub fn yawn_count(&self) -> u32 {
        self.state.yawn_count
    }

    pub fn state(&self) -> &YawnState {
        &self.state
    }
}
