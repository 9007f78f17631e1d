use crate::detection::domain::landmarks::{
    LandmarkSet, BROW_LEFT, BROW_RIGHT, JAW_LOWER_LEFT, JAW_LOWER_RIGHT,
};

/// The final crop region on the aligned chip, with INCLUSIVE corners:
/// a rectangle from `(left, top)` to `(right, bottom)` spanning
/// `right - left + 1` by `bottom - top + 1` pixels.
///
/// `top > bottom` is representable; the leveling heuristic never
/// guards against a brow point sitting below the jaw line, so callers
/// clamp before cropping and treat an empty result as a skip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CropRect {
    pub fn width(&self) -> i64 {
        (self.right as i64 - self.left as i64) + 1
    }

    pub fn height(&self) -> i64 {
        (self.bottom as i64 - self.top as i64) + 1
    }

    /// Intersects the rectangle with a `width` x `height` image.
    /// Returns `None` when nothing remains (degenerate or fully
    /// outside the image).
    pub fn clamp(&self, width: u32, height: u32) -> Option<CropRect> {
        let left = self.left.max(0);
        let top = self.top.max(0);
        let right = self.right.min(width as i32 - 1);
        let bottom = self.bottom.min(height as i32 - 1);
        if left > right || top > bottom {
            return None;
        }
        Some(CropRect {
            left,
            top,
            right,
            bottom,
        })
    }
}

/// Derives the crop rectangle from four anchor landmarks on the chip.
///
/// The lower jaw corners (indices 4 and 12) anchor the bottom edge and
/// the x extent; the above-brow points (19 and 24) anchor the top edge.
/// Both horizontal edges are leveled independently: the bottom takes
/// the LOWER jaw corner (max y), the top takes the HIGHER brow point
/// (min y). Leveling trades a little extra margin on the shallower
/// side for a guarantee that neither the jaw nor the higher brow is
/// ever clipped on a tilted face.
///
/// Pure function of the landmark set; two calls on the same input
/// yield the same rectangle.
pub fn build_crop_rect(landmarks: &LandmarkSet) -> CropRect {
    let (bl_x, bl_y) = landmarks.point(JAW_LOWER_LEFT);
    let (br_x, br_y) = landmarks.point(JAW_LOWER_RIGHT);
    let (_, brow_l_y) = landmarks.point(BROW_LEFT);
    let (_, brow_r_y) = landmarks.point(BROW_RIGHT);

    // Level the bottom edge through the lower of the two jaw corners,
    // then the top edge through the higher of the two brow points.
    let bottom = bl_y.max(br_y);
    let top = brow_l_y.min(brow_r_y);

    CropRect {
        left: bl_x.min(br_x),
        top,
        right: bl_x.max(br_x),
        bottom,
    }
}
