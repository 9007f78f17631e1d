/// Number of points in the iBUG facial landmark annotation scheme.
pub const LANDMARK_COUNT: usize = 68;

// Indices into the 68-point scheme, image-space left/right. The crop
// rectangle is anchored on the lower jaw corners and the brow points;
// the alignment stage uses eyes, nose tip, and mouth corners.
pub const JAW_LOWER_LEFT: usize = 4;
pub const JAW_LOWER_RIGHT: usize = 12;
pub const BROW_LEFT: usize = 19;
pub const BROW_RIGHT: usize = 24;
pub const NOSE_TIP: usize = 30;
pub const LEFT_EYE: std::ops::Range<usize> = 36..42;
pub const RIGHT_EYE: std::ops::Range<usize> = 42..48;
pub const MOUTH_LEFT_CORNER: usize = 48;
pub const MOUTH_RIGHT_CORNER: usize = 54;

/// An ordered set of exactly 68 anatomical points on a face, in pixel
/// coordinates of the image they were predicted on. Indices follow the
/// iBUG convention and are positional, never reordered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandmarkSet {
    points: [(i32, i32); LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [(i32, i32); LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Builds a set from a slice, rejecting any length other than 68.
    pub fn from_points(points: &[(i32, i32)]) -> Result<Self, Box<dyn std::error::Error>> {
        let points: [(i32, i32); LANDMARK_COUNT] = points.try_into().map_err(|_| {
            format!(
                "expected {LANDMARK_COUNT} landmark points, got {}",
                points.len()
            )
        })?;
        Ok(Self { points })
    }

    pub fn point(&self, index: usize) -> (i32, i32) {
        self.points[index]
    }

    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }
}
