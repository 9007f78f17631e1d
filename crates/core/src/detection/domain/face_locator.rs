use crate::shared::bitmap::Bitmap;
use crate::shared::face_box::FaceBox;

/// Domain interface for face location.
///
/// Returns zero or more face bounding boxes in unspecified order.
/// Implementations may hold mutable detector state, hence `&mut self`.
pub trait FaceLocator {
    fn locate(&mut self, image: &Bitmap) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
