//! Fatigue Monitor
//!
//! Personalized, real-time fatigue assessment from face-mesh landmarks:
//! - Calibration of per-subject eye/mouth baselines
//! - Blink counting and completeness classification
//! - Yawn counting
//! - PERCLOS (percentage of eye closure)
//! - Gaze (saccadic) velocity
//! - Composite fatigue score with cooldown-gated alerts
//!
//! Processing is frame-synchronous: one landmark frame is handled to
//! completion before the next one. The engine is not internally synchronized.

pub mod blink;
pub mod calibration;
pub mod config;
pub mod gaze;
pub mod scorer;
pub mod session;
pub mod state;
pub mod summary;
pub mod yawn;

pub use alerting::{FatigueEvent, Severity};
pub use blink::{BlinkDetector, BlinkState, BlinkTransition};
pub use calibration::{BaselineProfile, CalibrationAccumulator};
pub use config::{CheckpointPolicy, MonitorConfig, MonitoringStart, ScoringTable};
pub use gaze::GazeVelocityTracker;
pub use scorer::{FatigueIndicators, FatigueScorer, ScoringRule};
pub use session::{FrameUpdate, SessionEngine};
pub use state::SessionState;
pub use summary::{FatigueMoment, FatigueReport, LiveMetrics, SessionSummary};
pub use yawn::{YawnDetector, YawnTransition};

use thiserror::Error;

/// Fatigue monitor error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// No usable baseline could be derived; the session must be restarted
    #[error("Calibration failed after {samples} samples: {reason}")]
    CalibrationFailed { samples: usize, reason: String },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}
