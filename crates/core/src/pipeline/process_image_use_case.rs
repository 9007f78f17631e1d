use std::path::Path;

use log::{debug, info, warn};

use crate::alignment::domain::chip_extractor::{ChipExtractor, ChipParams};
use crate::detection::domain::crop_rect_builder::build_crop_rect;
use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::landmark_predictor::LandmarkPredictor;
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::imaging::domain::stage_viewer::StageViewer;
use crate::pipeline::outcome::ImageOutcome;
use crate::shared::constants::{
    CROP_OUTLINE_COLOR, STAGE_CHIP, STAGE_GRAY, STAGE_LOADED, STAGE_OUTLINE, STAGE_RESIZED,
};

/// One image through the full normalization pipeline. The dataset
/// walker drives this through the trait so it can be stubbed in tests.
pub trait ImageProcessor {
    fn process(
        &mut self,
        input: &Path,
        output: &Path,
        canonical_size: &mut Option<(u32, u32)>,
    ) -> Result<ImageOutcome, Box<dyn std::error::Error>>;
}

pub struct ProcessImageUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    locator: Box<dyn FaceLocator>,
    predictor: Box<dyn LandmarkPredictor>,
    chip_extractor: Box<dyn ChipExtractor>,
    viewer: Box<dyn StageViewer>,
    chip_params: ChipParams,
    draw_outline: bool,
}

impl ProcessImageUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        locator: Box<dyn FaceLocator>,
        predictor: Box<dyn LandmarkPredictor>,
        chip_extractor: Box<dyn ChipExtractor>,
        viewer: Box<dyn StageViewer>,
        chip_params: ChipParams,
        draw_outline: bool,
    ) -> Self {
        Self {
            reader,
            writer,
            locator,
            predictor,
            chip_extractor,
            viewer,
            chip_params,
            draw_outline,
        }
    }
}

impl ImageProcessor for ProcessImageUseCase {
    fn process(
        &mut self,
        input: &Path,
        output: &Path,
        canonical_size: &mut Option<(u32, u32)>,
    ) -> Result<ImageOutcome, Box<dyn std::error::Error>> {
        let image = self.reader.read(input)?;
        self.viewer.show(STAGE_LOADED, &image)?;

        let faces = self.locator.locate(&image)?;
        info!("Faces detected: {}", faces.len());
        if faces.is_empty() {
            warn!("No face found in {}, skipping", input.display());
            return Ok(ImageOutcome::SkippedNoFace);
        }
        if faces.len() > 1 {
            warn!(
                "{} faces found in {}, skipping",
                faces.len(),
                input.display()
            );
            return Ok(ImageOutcome::SkippedMultipleFaces { count: faces.len() });
        }

        let landmarks = self.predictor.predict(&image, &faces[0])?;
        let mut chip = self
            .chip_extractor
            .extract(&image, &landmarks, &self.chip_params)?;
        self.viewer.show(STAGE_CHIP, &chip)?;

        // The detector must agree with the alignment: exactly one face
        // on the chip, or the landmarks below would be unreliable.
        let chip_faces = self.locator.locate(&chip)?;
        if chip_faces.len() != 1 {
            warn!(
                "Re-detection found {} faces on the aligned chip of {}, skipping",
                chip_faces.len(),
                input.display()
            );
            return Ok(ImageOutcome::SkippedRedetectFailed {
                count: chip_faces.len(),
            });
        }

        let chip_landmarks = self.predictor.predict(&chip, &chip_faces[0])?;
        let rect = build_crop_rect(&chip_landmarks);
        debug!(
            "Crop rectangle ({}, {}) - ({}, {})",
            rect.left, rect.top, rect.right, rect.bottom
        );

        // Painted onto the chip itself: the rectangle's boundary pixels
        // lie inside the crop, so the outline ends up in the output.
        if self.draw_outline {
            chip.draw_rect_outline(
                rect.left,
                rect.top,
                rect.right,
                rect.bottom,
                CROP_OUTLINE_COLOR,
            );
        }
        self.viewer.show(STAGE_OUTLINE, &chip)?;

        let clamped = match rect.clamp(chip.width(), chip.height()) {
            Some(clamped) => clamped,
            None => {
                warn!("Empty crop rectangle for {}, skipping", input.display());
                return Ok(ImageOutcome::SkippedEmptyCrop);
            }
        };
        let cropped = chip.crop(
            clamped.left as u32,
            clamped.top as u32,
            clamped.right as u32,
            clamped.bottom as u32,
        );

        // The first successfully cropped image fixes the output size
        // for the rest of the run.
        let (target_w, target_h) =
            *canonical_size.get_or_insert((cropped.width(), cropped.height()));
        let resized = cropped.resize(target_w, target_h);
        self.viewer.show(STAGE_RESIZED, &resized)?;

        let gray = resized.to_grayscale();
        self.viewer.show(STAGE_GRAY, &gray)?;

        self.writer.write(output, &gray)?;
        info!("Saved {}", output.display());
        Ok(ImageOutcome::Processed)
    }
}

// ─────────────────────────────── Tests ───────────────────────────────
