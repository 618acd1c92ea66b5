//! Gaze (saccadic) velocity from the eye reference point

use face_landmarks::Point2;
use serde::{Deserialize, Serialize};

use crate::config::GazeConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeState {
    pub previous: Option<Point2>,
    /// Sum of frame-to-frame displacements (normalized units)
    pub total_displacement: f64,
    pub sample_count: u64,
}

/// Accumulates eye reference displacement across frames
#[derive(Debug, Clone)]
pub struct GazeVelocityTracker {
    min_samples: u64,
    scale: f64,
    state: GazeState,
}

impl GazeVelocityTracker {
    pub fn new(config: &GazeConfig) -> Self {
        Self {
            min_samples: config.min_samples,
            scale: config.velocity_scale,
            state: GazeState::default(),
        }
    }

    pub fn observe(&mut self, point: Point2) {
        if let Some(previous) = self.state.previous {
            self.state.total_displacement += previous.distance(&point);
            self.state.sample_count += 1;
        }
        self.state.previous = Some(point);
    }

    /// Scaled mean displacement per frame; zero until enough samples exist
    pub fn average_velocity(&self) -> f64 {
        if self.state.sample_count <= self.min_samples {
            return 0.0;
        }
        self.state.total_displacement / self.state.sample_count as f64 * self.scale
    }

    pub fn state(&self) -> &GazeState {
        &self.state
    }
}
