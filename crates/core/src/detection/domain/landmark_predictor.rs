use crate::detection::domain::landmarks::LandmarkSet;
use crate::shared::bitmap::Bitmap;
use crate::shared::face_box::FaceBox;

/// Domain interface for landmark prediction.
///
/// Given an image and one face box on it, produces the full 68-point
/// landmark set for that face.
pub trait LandmarkPredictor {
    fn predict(
        &self,
        image: &Bitmap,
        face: &FaceBox,
    ) -> Result<LandmarkSet, Box<dyn std::error::Error>>;
}
