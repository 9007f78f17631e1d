use crate::alignment::domain::chip_extractor::{ChipExtractor, ChipParams};
use crate::detection::domain::landmarks::{
    LandmarkSet, LEFT_EYE, MOUTH_LEFT_CORNER, MOUTH_RIGHT_CORNER, NOSE_TIP, RIGHT_EYE,
};
use crate::shared::bitmap::Bitmap;
use crate::shared::similarity::Similarity;

/// Canonical five-point face layout in unit-square coordinates:
/// eye centers, nose tip, mouth corners.
const REFERENCE_POINTS: [(f64, f64); 5] = [
    (0.30, 0.30),
    (0.70, 0.30),
    (0.50, 0.55),
    (0.35, 0.75),
    (0.65, 0.75),
];

/// Chip extractor using a least-squares similarity transform.
///
/// Condenses the 68 landmarks to five stable points (eye centers as
/// the mean of each eye's ring, nose tip, mouth corners), solves the
/// similarity mapping them onto the canonical layout scaled into the
/// chip, and fills the chip by backward mapping with bilinear
/// sampling. Pixels mapping outside the source come out black.
pub struct SimilarityChipExtractor;

impl SimilarityChipExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimilarityChipExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipExtractor for SimilarityChipExtractor {
    fn extract(
        &self,
        image: &Bitmap,
        landmarks: &LandmarkSet,
        params: &ChipParams,
    ) -> Result<Bitmap, Box<dyn std::error::Error>> {
        if params.size == 0 {
            return Err("chip size must be greater than zero".into());
        }

        let src = source_points(landmarks);
        let dst = chip_points(params);
        let forward = Similarity::estimate(&src, &dst)
            .ok_or("degenerate landmark configuration, cannot align face")?;
        let backward = forward
            .inverse()
            .ok_or("alignment transform is not invertible")?;

        Ok(warp(image, &backward, params.size))
    }
}

fn source_points(landmarks: &LandmarkSet) -> [(f64, f64); 5] {
    let mean_of = |range: std::ops::Range<usize>| -> (f64, f64) {
        let n = range.len() as f64;
        let sum = range.fold((0.0, 0.0), |acc, idx| {
            let (x, y) = landmarks.point(idx);
            (acc.0 + x as f64, acc.1 + y as f64)
        });
        (sum.0 / n, sum.1 / n)
    };
    let at = |idx: usize| -> (f64, f64) {
        let (x, y) = landmarks.point(idx);
        (x as f64, y as f64)
    };

    [
        mean_of(LEFT_EYE),
        mean_of(RIGHT_EYE),
        at(NOSE_TIP),
        at(MOUTH_LEFT_CORNER),
        at(MOUTH_RIGHT_CORNER),
    ]
}

/// Reference layout scaled into the chip with dlib padding semantics:
/// `chip = (padding + ref) / (2*padding + 1) * size`.
fn chip_points(params: &ChipParams) -> [(f64, f64); 5] {
    let size = params.size as f64;
    let p = params.padding;
    REFERENCE_POINTS.map(|(x, y)| {
        (
            (p + x) / (2.0 * p + 1.0) * size,
            (p + y) / (2.0 * p + 1.0) * size,
        )
    })
}

fn warp(image: &Bitmap, backward: &Similarity, size: u32) -> Bitmap {
    let channels = image.channels() as usize;
    let mut data = vec![0u8; (size as usize) * (size as usize) * channels];

    for cy in 0..size {
        for cx in 0..size {
            let (sx, sy) = backward.apply((cx as f64, cy as f64));
            let out = (cy as usize * size as usize + cx as usize) * channels;
            sample_into(image, sx, sy, &mut data[out..out + channels]);
        }
    }
    Bitmap::new(data, size, size, image.channels())
}

/// Bilinear sample of all channels at a fractional source position;
/// out-of-bounds neighbors contribute black.
fn sample_into(image: &Bitmap, x: f64, y: f64, out: &mut [u8]) {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let w = image.width() as i64;
    let h = image.height() as i64;
    let channels = image.channels() as usize;

    let weights = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    for c in 0..channels {
        let mut acc = 0.0;
        for &(px, py, weight) in &weights {
            if px < 0 || py < 0 || px >= w || py >= h {
                continue;
            }
            acc += image.pixel(px as u32, py as u32)[c] as f64 * weight;
        }
        out[c] = acc.round().clamp(0.0, 255.0) as u8;
    }
}
