//! Face-mesh landmark indices (468-point mesh plus 10 refined iris points)

/// Points in a refined face mesh
pub const MESH_POINT_COUNT: usize = 478;

/// Landmarks making up one eye's aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeContour {
    /// First vertical pair (upper lid, lower lid)
    pub vertical_1: (usize, usize),
    /// Second vertical pair
    pub vertical_2: (usize, usize),
    /// Eye corners
    pub horizontal: (usize, usize),
}

pub const LEFT_EYE: EyeContour = EyeContour {
    vertical_1: (160, 144),
    vertical_2: (158, 153),
    horizontal: (33, 133),
};

pub const RIGHT_EYE: EyeContour = EyeContour {
    vertical_1: (385, 380),
    vertical_2: (387, 373),
    horizontal: (362, 263),
};

/// Inner-lip vertical pairs (centre, left, right)
pub const LIP_VERTICALS: [(usize, usize); 3] = [(13, 14), (81, 178), (311, 402)];

/// Mouth corners
pub const MOUTH_HORIZONTAL: (usize, usize) = (61, 291);

/// Left iris centre, used as the gaze reference point
pub const LEFT_IRIS_CENTER: usize = 468;
