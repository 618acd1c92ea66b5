//! Eye and mouth openness ratios

use crate::frame::{LandmarkFrame, Point2};
use crate::indices::{
    EyeContour, LEFT_EYE, LEFT_IRIS_CENTER, LIP_VERTICALS, MOUTH_HORIZONTAL, RIGHT_EYE,
};

/// Per-frame geometric measurements
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EyeMouthMetrics {
    /// Eye aspect ratio averaged over both eyes (lower = more closed)
    pub ear: f64,
    /// Mouth aspect ratio (higher = more open)
    pub mar: f64,
    /// Normalized eye reference point for gaze tracking
    pub eye_ref: Point2,
}

impl EyeMouthMetrics {
    /// Measure a frame. Never fails: degenerate geometry yields a zero ratio.
    pub fn from_frame(frame: &LandmarkFrame) -> Self {
        Self {
            ear: eye_aspect_ratio(frame),
            mar: mouth_aspect_ratio(frame),
            eye_ref: frame.point(LEFT_IRIS_CENTER),
        }
    }
}

/// Average EAR of both eyes
pub fn eye_aspect_ratio(frame: &LandmarkFrame) -> f64 {
    (single_eye_ratio(frame, &LEFT_EYE) + single_eye_ratio(frame, &RIGHT_EYE)) / 2.0
}

fn single_eye_ratio(frame: &LandmarkFrame, eye: &EyeContour) -> f64 {
    let v1 = frame.pixel_distance(eye.vertical_1.0, eye.vertical_1.1);
    let v2 = frame.pixel_distance(eye.vertical_2.0, eye.vertical_2.1);
    let h = frame.pixel_distance(eye.horizontal.0, eye.horizontal.1);

    if h <= 0.0 {
        return 0.0;
    }

    (v1 + v2) / (2.0 * h)
}

/// Mean of the three lip gaps over the mouth width
pub fn mouth_aspect_ratio(frame: &LandmarkFrame) -> f64 {
    let horizontal = frame.pixel_distance(MOUTH_HORIZONTAL.0, MOUTH_HORIZONTAL.1);
    if horizontal <= 0.0 {
        return 0.0;
    }

    let vertical = LIP_VERTICALS
        .iter()
        .map(|&(a, b)| frame.pixel_distance(a, b))
        .sum::<f64>()
        / LIP_VERTICALS.len() as f64;

    vertical / horizontal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::MESH_POINT_COUNT;
    use crate::synthetic::FrameBuilder;
    use proptest::prelude::*;

    #[test]
    fn test_synthetic_ratios() {
        let frame = FrameBuilder::new().ear(0.30).mar(0.45).build();
        let metrics = EyeMouthMetrics::from_frame(&frame);
        assert!((metrics.ear - 0.30).abs() < 1e-9);
        assert!((metrics.mar - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_gaze_reference_is_left_iris() {
        let frame = FrameBuilder::new().gaze(0.42, 0.37).build();
        let metrics = EyeMouthMetrics::from_frame(&frame);
        assert_eq!(metrics.eye_ref, Point2::new(0.42, 0.37));
    }

    #[test]
    fn test_degenerate_geometry_is_zero() {
        // Every landmark on the same spot: all horizontal gaps vanish
        let frame =
            LandmarkFrame::new(vec![Point2::new(0.5, 0.5); MESH_POINT_COUNT], 640, 480).unwrap();
        let metrics = EyeMouthMetrics::from_frame(&frame);
        assert_eq!(metrics.ear, 0.0);
        assert_eq!(metrics.mar, 0.0);
    }

    proptest! {
        #[test]
        fn prop_ratios_non_negative(ear in 0.0f64..0.6, mar in 0.0f64..1.2) {
            let frame = FrameBuilder::new().ear(ear).mar(mar).build();
            let metrics = EyeMouthMetrics::from_frame(&frame);
            prop_assert!(metrics.ear >= 0.0);
            prop_assert!(metrics.mar >= 0.0);
            prop_assert!((metrics.ear - ear).abs() < 1e-9);
        }
    }
}
