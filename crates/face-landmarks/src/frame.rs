//! Landmark frame types

use serde::{Deserialize, Serialize};

use crate::indices::MESH_POINT_COUNT;
use crate::LandmarkError;

/// Normalized 2D landmark position (x, y in [0, 1] of the source frame)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in normalized units
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point2> for (f64, f64) {
    fn from(p: Point2) -> Self {
        (p.x, p.y)
    }
}

/// Landmarks of exactly one tracked face for one video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLandmarkFrame")]
pub struct LandmarkFrame {
    /// Face-mesh points, indexed by landmark id
    points: Vec<Point2>,
    /// Source frame width in pixels
    width: u32,
    /// Source frame height in pixels
    height: u32,
}

#[derive(Deserialize)]
struct RawLandmarkFrame {
    points: Vec<Point2>,
    width: u32,
    height: u32,
}

impl TryFrom<RawLandmarkFrame> for LandmarkFrame {
    type Error = LandmarkError;

    fn try_from(raw: RawLandmarkFrame) -> Result<Self, Self::Error> {
        LandmarkFrame::new(raw.points, raw.width, raw.height)
    }
}

impl LandmarkFrame {
    /// Create a frame from detector output.
    ///
    /// Requires the full refined mesh (iris points included) and a non-empty
    /// source frame.
    pub fn new(points: Vec<Point2>, width: u32, height: u32) -> Result<Self, LandmarkError> {
        if width == 0 || height == 0 {
            return Err(LandmarkError::InvalidDimensions { width, height });
        }
        if points.len() < MESH_POINT_COUNT {
            return Err(LandmarkError::TooFewLandmarks {
                found: points.len(),
                required: MESH_POINT_COUNT,
            });
        }
        Ok(Self {
            points,
            width,
            height,
        })
    }

    /// Landmark by mesh index.
    ///
    /// Indices used by this crate are always below `MESH_POINT_COUNT`, which
    /// `new` guarantees is in bounds.
    pub fn point(&self, index: usize) -> Point2 {
        self.points[index]
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel distance between two landmarks, scaling normalized coordinates
    /// by the source frame size
    pub fn pixel_distance(&self, a: usize, b: usize) -> f64 {
        let p1 = self.point(a);
        let p2 = self.point(b);
        let dx = (p1.x - p2.x) * self.width as f64;
        let dy = (p1.y - p2.y) * self.height as f64;
        dx.hypot(dy)
    }
}
