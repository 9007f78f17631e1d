use std::io::Cursor;
use std::path::Path;

use crate::detection::domain::face_locator::FaceLocator;
use crate::shared::bitmap::Bitmap;
use crate::shared::face_box::FaceBox;

// SeetaFace tuning for still photographs of single subjects.
const MIN_FACE_SIZE: u32 = 20;
const SCORE_THRESHOLD: f64 = 2.0;
const PYRAMID_SCALE: f32 = 0.8;
const SLIDE_WINDOW_STEP: (u32, u32) = (4, 4);

/// Face locator backed by the `rustface` crate (SeetaFace engine).
///
/// Holds the parsed model; a detector instance is built per call since
/// the rustface detector is not reusable across differently sized
/// inputs without reconfiguration.
pub struct SeetaFaceLocator {
    model: rustface::Model,
}

impl SeetaFaceLocator {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        let model = rustface::read_model(Cursor::new(bytes))
            .map_err(|e| format!("failed to load SeetaFace model: {e}"))?;
        Ok(Self { model })
    }
}

impl FaceLocator for SeetaFaceLocator {
    fn locate(&mut self, image: &Bitmap) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let gray = image.luma_pixels();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP.0, SLIDE_WINDOW_STEP.1);

        let faces = detector.detect(&rustface::ImageData::new(
            &gray,
            image.width(),
            image.height(),
        ));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox::new(bbox.x(), bbox.y(), bbox.width(), bbox.height())
            })
            .collect())
    }
}
