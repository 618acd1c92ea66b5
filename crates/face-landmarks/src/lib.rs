//! Face Landmark Geometry
//!
//! Per-frame input types for the fatigue monitor:
//! - Normalized face-mesh landmark frames (one tracked face)
//! - Named landmark indices for eyes, lips and iris
//! - Eye-openness (EAR) and mouth-openness (MAR) ratios

pub mod frame;
pub mod indices;
pub mod metrics;

#[cfg(any(test, feature = "test-util"))]
pub mod synthetic;

pub use frame::{LandmarkFrame, Point2};
pub use metrics::{eye_aspect_ratio, mouth_aspect_ratio, EyeMouthMetrics};

use thiserror::Error;

/// Landmark frame errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("Frame carries {found} landmarks, at least {required} required")]
    TooFewLandmarks { found: usize, required: usize },

    #[error("Invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}
