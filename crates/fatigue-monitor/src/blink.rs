//! Blink detection with hysteresis
//!
//! Two states, eye open and eye closed. The eye closes when EAR drops below
//! `thres_close` and only reopens once EAR rises above `thres_open`; readings
//! inside the band never change state, so noise around one threshold cannot
//! produce double counts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BlinkConfig;

/// Blink counters and timing, monotonic within a monitoring phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlinkState {
    pub is_blinking: bool,
    /// Lowest EAR seen in the blink in progress
    pub min_ear_in_blink: f64,
    pub blink_count: u32,
    /// Always <= `blink_count`
    pub incomplete_blink_count: u32,
    /// Sum of frame deltas spent below `thres_close` (seconds)
    pub accumulated_closed_time: f64,
    pub last_blink_timestamp: f64,
    pub max_time_without_blink: f64,
    /// Frames below `thres_close`
    pub closed_frames: u64,
    /// All observed frames
    pub total_frames: u64,
}

impl BlinkState {
    fn new(started_at: f64) -> Self {
        Self {
            is_blinking: false,
            min_ear_in_blink: 1.0,
            blink_count: 0,
            incomplete_blink_count: 0,
            accumulated_closed_time: 0.0,
            last_blink_timestamp: started_at,
            max_time_without_blink: 0.0,
            closed_frames: 0,
            total_frames: 0,
        }
    }

    /// Percentage of observed frames with the eye closed
    pub fn perclos(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.closed_frames as f64 / self.total_frames as f64 * 100.0
    }

    /// Percentage of blinks classified incomplete
    pub fn incomplete_pct(&self) -> f64 {
        if self.blink_count == 0 {
            return 0.0;
        }
        self.incomplete_blink_count as f64 / self.blink_count as f64 * 100.0
    }
}

/// Outcome of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlinkTransition {
    /// No state change
    Steady,
    /// Eye just closed
    Closed,
    /// Eye reopened, completing a blink
    Completed { incomplete: bool, min_ear: f64 },
}

/// Eye open/closed state machine
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    thres_close: f64,
    thres_open: f64,
    incomplete_below: f64,
    state: BlinkState,
}

impl BlinkDetector {
    /// Create a detector for one monitoring phase starting at `started_at`
    pub fn new(thres_close: f64, thres_open: f64, config: &BlinkConfig, started_at: f64) -> Self {
        Self {
            thres_close,
            thres_open,
            incomplete_below: thres_close * config.incomplete_factor,
            state: BlinkState::new(started_at),
        }
    }

    /// Feed one frame's EAR at session time `t` (pauses excluded). `delta` is
    /// the session time since the previous frame.
    pub fn update(&mut self, ear: f64, t: f64, delta: f64) -> BlinkTransition {
        let state = &mut self.state;
        state.total_frames += 1;

        let transition = if ear < self.thres_close {
            let transition = if state.is_blinking {
                state.min_ear_in_blink = state.min_ear_in_blink.min(ear);
                BlinkTransition::Steady
            } else {
                state.is_blinking = true;
                state.min_ear_in_blink = ear;
                BlinkTransition::Closed
            };
            state.closed_frames += 1;
            state.accumulated_closed_time += delta;
            transition
        } else if ear > self.thres_open && state.is_blinking {
            state.is_blinking = false;
            state.blink_count += 1;
            state.last_blink_timestamp = t;

            let incomplete = state.min_ear_in_blink > self.incomplete_below;
            if incomplete {
                state.incomplete_blink_count += 1;
            }
            debug!(
                "Blink #{} (min EAR {:.4}{})",
                state.blink_count,
                state.min_ear_in_blink,
                if incomplete { ", incomplete" } else { "" }
            );
            BlinkTransition::Completed {
                incomplete,
                min_ear: state.min_ear_in_blink,
            }
        } else {
            BlinkTransition::Steady
        };

        let without_blink = t - state.last_blink_timestamp;
        if without_blink > state.max_time_without_blink {
            state.max_time_without_blink = without_blink;
        }

        transition
    }

    pub fn state(&self) -> &BlinkState {
        &self.state
    }
}
