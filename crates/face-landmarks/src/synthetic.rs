//! Synthetic frames with exact, known ratios

use crate::frame::{LandmarkFrame, Point2};
use crate::indices::{
    EyeContour, LEFT_EYE, LEFT_IRIS_CENTER, LIP_VERTICALS, MESH_POINT_COUNT, MOUTH_HORIZONTAL,
    RIGHT_EYE,
};

/// Eye width in normalized units; the frame is square so pixels scale evenly
const EYE_WIDTH: f64 = 0.10;
const MOUTH_WIDTH: f64 = 0.20;

/// Builds a 100x100 frame whose EAR, MAR and iris position are set exactly
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    ear: f64,
    mar: f64,
    gaze: Point2,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            ear: 0.30,
            mar: 0.20,
            gaze: Point2::new(0.35, 0.40),
        }
    }

    pub fn ear(mut self, ear: f64) -> Self {
        self.ear = ear;
        self
    }

    pub fn mar(mut self, mar: f64) -> Self {
        self.mar = mar;
        self
    }

    pub fn gaze(mut self, x: f64, y: f64) -> Self {
        self.gaze = Point2::new(x, y);
        self
    }

    pub fn build(&self) -> LandmarkFrame {
        let mut points = vec![Point2::new(0.5, 0.5); MESH_POINT_COUNT];

        place_eye(&mut points, &LEFT_EYE, 0.30, self.ear);
        place_eye(&mut points, &RIGHT_EYE, 0.60, self.ear);

        let (left, right) = MOUTH_HORIZONTAL;
        points[left] = Point2::new(0.40, 0.70);
        points[right] = Point2::new(0.40 + MOUTH_WIDTH, 0.70);
        let gap = self.mar * MOUTH_WIDTH;
        for (i, &(top, bottom)) in LIP_VERTICALS.iter().enumerate() {
            let x = 0.45 + 0.05 * i as f64;
            points[top] = Point2::new(x, 0.70 - gap / 2.0);
            points[bottom] = Point2::new(x, 0.70 + gap / 2.0);
        }

        points[LEFT_IRIS_CENTER] = self.gaze;

        // Dimensions are non-zero and the mesh is full length
        match LandmarkFrame::new(points, 100, 100) {
            Ok(frame) => frame,
            Err(e) => panic!("synthetic frame invalid: {e}"),
        }
    }
}

fn place_eye(points: &mut [Point2], eye: &EyeContour, x0: f64, ear: f64) {
    let y = 0.40;
    points[eye.horizontal.0] = Point2::new(x0, y);
    points[eye.horizontal.1] = Point2::new(x0 + EYE_WIDTH, y);

    let gap = ear * EYE_WIDTH;
    for (i, &(top, bottom)) in [eye.vertical_1, eye.vertical_2].iter().enumerate() {
        let x = x0 + 0.03 + 0.04 * i as f64;
        points[top] = Point2::new(x, y - gap / 2.0);
        points[bottom] = Point2::new(x, y + gap / 2.0);
    }
}
