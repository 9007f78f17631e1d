use crate::detection::domain::landmarks::LandmarkSet;
use crate::shared::bitmap::Bitmap;

/// Geometry of the aligned chip: edge length in pixels plus padding
/// around the face, in dlib semantics (0.0 = tight crop; larger values
/// include proportionally more background).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChipParams {
    pub size: u32,
    pub padding: f64,
}

/// Domain interface for aligned chip extraction.
///
/// Produces a rotation/scale normalized sub-image around the face
/// described by the landmark set. Deterministic for identical inputs.
pub trait ChipExtractor {
    fn extract(
        &self,
        image: &Bitmap,
        landmarks: &LandmarkSet,
        params: &ChipParams,
    ) -> Result<Bitmap, Box<dyn std::error::Error>>;
}
