use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::landmark_predictor::LandmarkPredictor;
use crate::detection::domain::landmarks::{LandmarkSet, LANDMARK_COUNT};
use crate::detection::infrastructure::dat_format;
use crate::detection::infrastructure::regression_tree::{Forest, PixelDiffFeature};
use crate::shared::bitmap::Bitmap;
use crate::shared::face_box::FaceBox;
use crate::shared::similarity::Similarity;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("failed to read predictor model: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode predictor model: {0}")]
    Decode(#[from] bincode::Error),
    #[error("malformed predictor model: {0}")]
    Malformed(String),
    #[error("predictor has {0} landmarks, expected {LANDMARK_COUNT}")]
    WrongLandmarkCount(usize),
}

/// A trained ERT shape model: the mean face shape in face-box
/// normalized [0,1] coordinates plus a cascade of tree forests
/// ("One Millisecond Face Alignment", Kazemi & Sullivan 2014).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShapeModel {
    pub mean_shape: Vec<(f32, f32)>,
    pub cascade: Vec<Forest>,
}

impl ShapeModel {
    pub fn num_points(&self) -> usize {
        self.mean_shape.len()
    }

    /// Loads a model from its serialized form, picking the format by
    /// extension: dlib's `.dat` / `.dat.bz2`, or this crate's bincode.
    pub fn from_file(path: &Path) -> Result<ShapeModel, PredictorError> {
        let ext = path.extension().and_then(|e| e.to_str());
        match ext {
            Some("dat") | Some("bz2") => dat_format::load_dat(path),
            _ => Self::load_bincode(path),
        }
    }

    pub fn load_bincode(path: &Path) -> Result<ShapeModel, PredictorError> {
        let bytes = fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    pub fn save_bincode(&self, path: &Path) -> Result<(), PredictorError> {
        let bytes = bincode::serialize(self)?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

/// Landmark predictor backed by an ERT cascade.
///
/// Starts from the mean shape scaled into the face box and lets each
/// forest refine it, sampling pixel-difference features whose offsets
/// follow the current shape's in-plane rotation.
#[derive(Debug)]
pub struct ErtPredictor {
    model: ShapeModel,
}

impl ErtPredictor {
    /// Rejects models whose landmark count is not 68 (the downstream
    /// crop geometry indexes a fixed 68-point scheme) and models whose
    /// split features anchor at a landmark the shape does not have.
    pub fn new(model: ShapeModel) -> Result<Self, PredictorError> {
        if model.num_points() != LANDMARK_COUNT {
            return Err(PredictorError::WrongLandmarkCount(model.num_points()));
        }
        for forest in &model.cascade {
            if let Some(anchor) = forest.max_anchor() {
                if anchor as usize >= model.num_points() {
                    return Err(PredictorError::Malformed(format!(
                        "split feature anchored at landmark {anchor}, model has {} points",
                        model.num_points()
                    )));
                }
            }
        }
        Ok(Self { model })
    }

    pub fn from_file(path: &Path) -> Result<Self, PredictorError> {
        Self::new(ShapeModel::from_file(path)?)
    }

    fn refine(&self, gray: &[u8], width: u32, height: u32, face: &FaceBox) -> Vec<(f32, f32)> {
        let bx = face.x as f32;
        let by = face.y as f32;
        let bw = face.width as f32;
        let bh = face.height as f32;

        let initial: Vec<(f32, f32)> = self
            .model
            .mean_shape
            .iter()
            .map(|&(x, y)| (bx + x * bw, by + y * bh))
            .collect();
        let mut current = initial.clone();

        for forest in &self.model.cascade {
            let (rc, rs) = shape_rotation(&initial, &current);
            let delta = forest.predict(|f: &PixelDiffFeature| {
                let pa = feature_point(&current, f.anchor_a, f.offset_a, bw, bh, rc, rs);
                let pb = feature_point(&current, f.anchor_b, f.offset_b, bw, bh, rc, rs);
                sample_bilinear(gray, width, height, pa) - sample_bilinear(gray, width, height, pb)
            });
            for (p, d) in current.iter_mut().zip(delta) {
                p.0 += d.0 * bw;
                p.1 += d.1 * bh;
            }
        }
        current
    }
}

impl LandmarkPredictor for ErtPredictor {
    fn predict(
        &self,
        image: &Bitmap,
        face: &FaceBox,
    ) -> Result<LandmarkSet, Box<dyn std::error::Error>> {
        let gray = image.luma_pixels();
        let shape = self.refine(&gray, image.width(), image.height(), face);
        let points: Vec<(i32, i32)> = shape
            .iter()
            .map(|&(x, y)| (x.round() as i32, y.round() as i32))
            .collect();
        LandmarkSet::from_points(&points)
    }
}

/// In-plane rotation of the current shape relative to the initial one.
fn shape_rotation(initial: &[(f32, f32)], current: &[(f32, f32)]) -> (f32, f32) {
    let from: Vec<(f64, f64)> = initial.iter().map(|&(x, y)| (x as f64, y as f64)).collect();
    let to: Vec<(f64, f64)> = current.iter().map(|&(x, y)| (x as f64, y as f64)).collect();
    match Similarity::estimate(&from, &to) {
        Some(t) => {
            let (c, s) = t.rotation();
            (c as f32, s as f32)
        }
        None => (1.0, 0.0),
    }
}

/// Sampling location of one side of a pixel-difference feature: the
/// normalized offset scaled to face-box size, rotated with the shape,
/// anchored at a landmark.
fn feature_point(
    shape: &[(f32, f32)],
    anchor: u16,
    offset: (f32, f32),
    bw: f32,
    bh: f32,
    rc: f32,
    rs: f32,
) -> (f32, f32) {
    let (ax, ay) = shape[anchor as usize];
    let ox = offset.0 * bw;
    let oy = offset.1 * bh;
    (ax + rc * ox - rs * oy, ay + rs * ox + rc * oy)
}

fn sample_bilinear(gray: &[u8], width: u32, height: u32, p: (f32, f32)) -> f32 {
    let x0 = p.0.floor() as i32;
    let y0 = p.1.floor() as i32;
    let fx = p.0 - x0 as f32;
    let fy = p.1 - y0 as f32;

    let at = |x: i32, y: i32| -> f32 {
        if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
            return 0.0;
        }
        gray[(y as u32 * width + x as u32) as usize] as f32
    };

    let top = at(x0, y0) * (1.0 - fx) + at(x0 + 1, y0) * fx;
    let bottom = at(x0, y0 + 1) * (1.0 - fx) + at(x0 + 1, y0 + 1) * fx;
    top * (1.0 - fy) + bottom * fy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::regression_tree::{Node, Tree};
    use tempfile::TempDir;

    fn centered_mean_shape() -> Vec<(f32, f32)> {
        // 68 distinct points spread over the unit square.
        (0..LANDMARK_COUNT)
            .map(|i| {
                let x = (i % 10) as f32 / 10.0;
                let y = (i / 10) as f32 / 8.0;
                (x, y)
            })
            .collect()
    }

    fn zero_delta_model() -> ShapeModel {
        let tree = Tree::new(vec![Node::Leaf {
            delta: vec![(0.0, 0.0); LANDMARK_COUNT],
        }]);
        ShapeModel {
            mean_shape: centered_mean_shape(),
            cascade: vec![Forest::new(vec![tree], LANDMARK_COUNT)],
        }
    }

    fn flat_image(w: u32, h: u32) -> Bitmap {
        Bitmap::new(vec![128u8; (w * h) as usize], w, h, 1)
    }

    #[test]
    fn test_rejects_wrong_landmark_count() {
        let model = ShapeModel {
            mean_shape: vec![(0.5, 0.5); 5],
            cascade: vec![],
        };
        match ErtPredictor::new(model) {
            Err(PredictorError::WrongLandmarkCount(5)) => {}
            other => panic!("expected WrongLandmarkCount, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_out_of_range_anchor() {
        let split = Node::Split {
            feature: PixelDiffFeature {
                anchor_a: 0,
                anchor_b: LANDMARK_COUNT as u16,
                offset_a: (0.0, 0.0),
                offset_b: (0.0, 0.0),
            },
            threshold: 0.0,
            left: 1,
            right: 2,
        };
        let leaf = || Node::Leaf {
            delta: vec![(0.0, 0.0); LANDMARK_COUNT],
        };
        let model = ShapeModel {
            mean_shape: centered_mean_shape(),
            cascade: vec![Forest::new(
                vec![Tree::new(vec![split, leaf(), leaf()])],
                LANDMARK_COUNT,
            )],
        };
        assert!(matches!(
            ErtPredictor::new(model),
            Err(PredictorError::Malformed(_))
        ));
    }

    #[test]
    fn test_zero_cascade_predicts_scaled_mean_shape() {
        let predictor = ErtPredictor::new(zero_delta_model()).unwrap();
        let image = flat_image(200, 200);
        let face = FaceBox::new(50, 40, 100, 80);

        let landmarks = predictor.predict(&image, &face).unwrap();
        // Landmark 0 of the mean shape is (0.0, 0.0) -> face origin.
        assert_eq!(landmarks.point(0), (50, 40));
        // Landmark 9 is (0.9, 0.0) -> x = 50 + 0.9*100.
        assert_eq!(landmarks.point(9), (140, 40));
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let predictor = ErtPredictor::new(zero_delta_model()).unwrap();
        let image = flat_image(120, 120);
        let face = FaceBox::new(10, 10, 100, 100);
        let a = predictor.predict(&image, &face).unwrap();
        let b = predictor.predict(&image, &face).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bincode_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("model.bin");

        let model = zero_delta_model();
        model.save_bincode(&path).unwrap();
        let loaded = ShapeModel::load_bincode(&path).unwrap();
        assert_eq!(loaded.num_points(), LANDMARK_COUNT);
        assert_eq!(loaded.mean_shape, model.mean_shape);
    }

    #[test]
    fn test_from_file_dispatches_bincode_for_bin_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("model.bin");
        zero_delta_model().save_bincode(&path).unwrap();

        let predictor = ErtPredictor::from_file(&path).unwrap();
        let landmarks = predictor
            .predict(&flat_image(100, 100), &FaceBox::new(0, 0, 100, 100))
            .unwrap();
        assert_eq!(landmarks.points().len(), LANDMARK_COUNT);
    }

    #[test]
    fn test_bilinear_sampling() {
        // 2x2 image: exact corners and the blended center.
        let gray = [0u8, 100, 200, 50];
        assert!((sample_bilinear(&gray, 2, 2, (0.0, 0.0)) - 0.0).abs() < 0.01);
        assert!((sample_bilinear(&gray, 2, 2, (1.0, 0.0)) - 100.0).abs() < 0.01);
        assert!((sample_bilinear(&gray, 2, 2, (0.0, 1.0)) - 200.0).abs() < 0.01);
        assert!((sample_bilinear(&gray, 2, 2, (0.5, 0.5)) - 87.5).abs() < 0.01);
        // Out-of-bounds contributes zero.
        assert_eq!(sample_bilinear(&gray, 2, 2, (-5.0, -5.0)), 0.0);
    }
}
