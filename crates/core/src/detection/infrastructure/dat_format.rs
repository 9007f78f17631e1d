//! Loader for dlib's serialized `shape_predictor` format.
//!
//! dlib writes integers with a variable-length encoding (control byte:
//! high bit = sign, low nibble = payload byte count, little-endian
//! payload) and floats as (mantissa, exponent) integer pairs. Matrices
//! carry their dimensions as negated integers. Models may additionally
//! be bzip2-compressed (`.dat.bz2`, the form distributed in the
//! dlib-models repository).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;

use crate::detection::infrastructure::ert_predictor::{PredictorError, ShapeModel};
use crate::detection::infrastructure::regression_tree::{Forest, Node, PixelDiffFeature, Tree};

/// Loads a dlib shape predictor from a `.dat` or `.dat.bz2` file.
pub fn load_dat(path: &Path) -> Result<ShapeModel, PredictorError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    if path.extension().is_some_and(|ext| ext == "bz2") {
        parse_model(&mut DatReader::new(BzDecoder::new(reader)))
    } else {
        parse_model(&mut DatReader::new(reader))
    }
}

struct DatReader<R: Read> {
    inner: R,
}

impl<R: Read> DatReader<R> {
    fn new(inner: R) -> Self {
        Self { inner }
    }

    fn byte(&mut self) -> Result<u8, PredictorError> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn int(&mut self) -> Result<i64, PredictorError> {
        let control = self.byte()?;
        let negative = control & 0x80 != 0;
        let payload_len = (control & 0x0F) as usize;

        let mut value: u64 = 0;
        for i in 0..payload_len {
            value |= (self.byte()? as u64) << (8 * i);
        }
        let signed = value as i64;
        Ok(if negative { -signed } else { signed })
    }

    fn unsigned(&mut self) -> Result<usize, PredictorError> {
        let value = self.int()?;
        if value < 0 {
            return Err(PredictorError::Malformed(format!(
                "expected unsigned value, got {value}"
            )));
        }
        Ok(value as usize)
    }

    fn float(&mut self) -> Result<f32, PredictorError> {
        let mantissa = self.int()?;
        let exponent = self.int()? as i32;
        if mantissa == 0 {
            return Ok(0.0);
        }
        Ok(((mantissa as f64) * (2.0f64).powi(exponent)) as f32)
    }

    /// A column matrix of 2D points: dims stored negated, then
    /// interleaved (x, y) floats.
    fn point_matrix(&mut self) -> Result<Vec<(f32, f32)>, PredictorError> {
        let rows = -self.int()?;
        let cols = -self.int()?;
        if cols != 1 || rows < 0 || rows % 2 != 0 {
            return Err(PredictorError::Malformed(format!(
                "invalid shape matrix dimensions: {rows}x{cols}"
            )));
        }
        let mut points = Vec::with_capacity(rows as usize / 2);
        for _ in 0..rows / 2 {
            let x = self.float()?;
            let y = self.float()?;
            points.push((x, y));
        }
        Ok(points)
    }
}

/// Split record as stored on disk: indices into the per-cascade
/// anchor/offset tables, resolved later.
struct RawSplit {
    feature_a: usize,
    feature_b: usize,
    threshold: f32,
}

struct RawTree {
    splits: Vec<RawSplit>,
    leaves: Vec<Vec<(f32, f32)>>,
}

fn parse_model<R: Read>(r: &mut DatReader<R>) -> Result<ShapeModel, PredictorError> {
    let version = r.int()?;
    if version != 1 {
        return Err(PredictorError::Malformed(format!(
            "unsupported shape_predictor version: {version}"
        )));
    }

    let mean_shape = r.point_matrix()?;
    let num_points = mean_shape.len();

    // Forests, stored before the anchor/offset tables they reference.
    let num_cascades = r.unsigned()?;
    let mut raw_cascades = Vec::with_capacity(num_cascades);
    for _ in 0..num_cascades {
        let num_trees = r.unsigned()?;
        let mut trees = Vec::with_capacity(num_trees);
        for _ in 0..num_trees {
            trees.push(parse_raw_tree(r, num_points)?);
        }
        raw_cascades.push(trees);
    }

    // anchors[cascade][feature] = landmark index.
    let num_anchor_cascades = r.unsigned()?;
    let mut anchors = Vec::with_capacity(num_anchor_cascades);
    for _ in 0..num_anchor_cascades {
        let count = r.unsigned()?;
        let mut table = Vec::with_capacity(count);
        for _ in 0..count {
            table.push(r.unsigned()? as u16);
        }
        anchors.push(table);
    }

    // offsets[cascade][feature] = (dx, dy) from the anchor landmark.
    let num_offset_cascades = r.unsigned()?;
    let mut offsets = Vec::with_capacity(num_offset_cascades);
    for _ in 0..num_offset_cascades {
        let count = r.unsigned()?;
        let mut table = Vec::with_capacity(count);
        for _ in 0..count {
            let dx = r.float()?;
            let dy = r.float()?;
            table.push((dx, dy));
        }
        offsets.push(table);
    }

    let mut cascade = Vec::with_capacity(num_cascades);
    for (idx, raw_trees) in raw_cascades.into_iter().enumerate() {
        let anchor_table = anchors
            .get(idx)
            .ok_or_else(|| PredictorError::Malformed(format!("missing anchors for cascade {idx}")))?;
        let offset_table = offsets
            .get(idx)
            .ok_or_else(|| PredictorError::Malformed(format!("missing offsets for cascade {idx}")))?;

        let mut trees = Vec::with_capacity(raw_trees.len());
        for raw in raw_trees {
            trees.push(resolve_tree(raw, anchor_table, offset_table, num_points)?);
        }
        cascade.push(Forest::new(trees, num_points));
    }

    Ok(ShapeModel { mean_shape, cascade })
}

fn parse_raw_tree<R: Read>(
    r: &mut DatReader<R>,
    num_points: usize,
) -> Result<RawTree, PredictorError> {
    let num_splits = r.unsigned()?;
    let mut splits = Vec::with_capacity(num_splits);
    for _ in 0..num_splits {
        let feature_a = r.unsigned()?;
        let feature_b = r.unsigned()?;
        let threshold = r.float()?;
        splits.push(RawSplit {
            feature_a,
            feature_b,
            threshold,
        });
    }

    let num_leaves = r.unsigned()?;
    if num_leaves != num_splits + 1 {
        return Err(PredictorError::Malformed(format!(
            "tree with {num_splits} splits must have {} leaves, got {num_leaves}",
            num_splits + 1
        )));
    }

    let mut leaves = Vec::with_capacity(num_leaves);
    for _ in 0..num_leaves {
        let delta = r.point_matrix()?;
        if delta.len() != num_points {
            return Err(PredictorError::Malformed(format!(
                "leaf delta has {} points, expected {num_points}",
                delta.len()
            )));
        }
        leaves.push(delta);
    }

    Ok(RawTree { splits, leaves })
}

/// Turns a raw tree into its in-memory form, looking up every split's
/// anchor landmarks and pixel offsets. dlib lays nodes out as a
/// complete binary tree, splits first: children of split `i` are
/// `2i+1` and `2i+2`.
fn resolve_tree(
    raw: RawTree,
    anchor_table: &[u16],
    offset_table: &[(f32, f32)],
    num_points: usize,
) -> Result<Tree, PredictorError> {
    let lookup = |feature: usize| -> Result<(u16, (f32, f32)), PredictorError> {
        let anchor = *anchor_table.get(feature).ok_or_else(|| {
            PredictorError::Malformed(format!("feature index {feature} out of bounds"))
        })?;
        if anchor as usize >= num_points {
            return Err(PredictorError::Malformed(format!(
                "split feature anchored at landmark {anchor}, model has {num_points} points"
            )));
        }
        let offset = *offset_table.get(feature).ok_or_else(|| {
            PredictorError::Malformed(format!("offset index {feature} out of bounds"))
        })?;
        Ok((anchor, offset))
    };

    let mut nodes = Vec::with_capacity(raw.splits.len() + raw.leaves.len());
    for (i, split) in raw.splits.iter().enumerate() {
        let (anchor_a, offset_a) = lookup(split.feature_a)?;
        let (anchor_b, offset_b) = lookup(split.feature_b)?;
        nodes.push(Node::Split {
            feature: PixelDiffFeature {
                anchor_a,
                anchor_b,
                offset_a,
                offset_b,
            },
            threshold: split.threshold,
            left: (2 * i + 1) as u32,
            right: (2 * i + 2) as u32,
        });
    }
    for delta in raw.leaves {
        nodes.push(Node::Leaf { delta });
    }
    Ok(Tree::new(nodes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::landmarks::LANDMARK_COUNT;
    use std::io::Cursor;

    // ── Encoding helpers (mirror the wire format) ────────────────────

    fn put_int(buf: &mut Vec<u8>, value: i64) {
        if value == 0 {
            buf.push(0x00);
            return;
        }
        let negative = value < 0;
        let magnitude = value.unsigned_abs();
        let payload_len = (8 - magnitude.leading_zeros() as usize / 8).max(1);
        buf.push(if negative { 0x80 } else { 0x00 } | payload_len as u8);
        for i in 0..payload_len {
            buf.push((magnitude >> (8 * i)) as u8);
        }
    }

    fn put_float(buf: &mut Vec<u8>, value: f32) {
        if value == 0.0 {
            put_int(buf, 0);
            put_int(buf, 0);
            return;
        }
        // Decompose into mantissa * 2^exponent with an integer mantissa.
        let magnitude = (value as f64).abs();
        let exp = magnitude.log2().floor() as i32 + 1 - 53;
        let mantissa = ((value as f64) * (2.0f64).powi(-exp)) as i64;
        put_int(buf, mantissa);
        put_int(buf, exp as i64);
    }

    fn put_point_matrix(buf: &mut Vec<u8>, points: &[(f32, f32)]) {
        put_int(buf, -(points.len() as i64 * 2));
        put_int(buf, -1);
        for &(x, y) in points {
            put_float(buf, x);
            put_float(buf, y);
        }
    }

    #[test]
    fn test_varint_round_trip() {
        let mut buf = Vec::new();
        let values = [0i64, 1, 127, 128, 255, 256, 65_535, -1, -128, -70_000];
        for &v in &values {
            put_int(&mut buf, v);
        }
        let mut r = DatReader::new(Cursor::new(buf));
        for &v in &values {
            assert_eq!(r.int().unwrap(), v);
        }
    }

    #[test]
    fn test_float_round_trip() {
        let mut buf = Vec::new();
        let values = [0.0f32, 1.0, -1.0, 0.5, 0.25, 3.75, -128.5];
        for &v in &values {
            put_float(&mut buf, v);
        }
        let mut r = DatReader::new(Cursor::new(buf));
        for &v in &values {
            assert!((r.float().unwrap() - v).abs() < 1e-5, "value {v}");
        }
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        let mut buf = Vec::new();
        put_int(&mut buf, -3);
        let mut r = DatReader::new(Cursor::new(buf));
        assert!(matches!(r.unsigned(), Err(PredictorError::Malformed(_))));
    }

    #[test]
    fn test_parse_minimal_model() {
        // version 1, 68-point mean shape, one cascade containing one
        // tree with zero splits and one all-zero leaf, empty anchor and
        // offset tables.
        let mean: Vec<(f32, f32)> = (0..LANDMARK_COUNT)
            .map(|i| (i as f32 / 100.0, 0.5))
            .collect();

        let mut buf = Vec::new();
        put_int(&mut buf, 1);
        put_point_matrix(&mut buf, &mean);
        put_int(&mut buf, 1); // cascades
        put_int(&mut buf, 1); // trees in cascade 0
        put_int(&mut buf, 0); // splits
        put_int(&mut buf, 1); // leaves
        put_point_matrix(&mut buf, &vec![(0.0, 0.0); LANDMARK_COUNT]);
        put_int(&mut buf, 1); // anchor cascades
        put_int(&mut buf, 0); // anchors in cascade 0
        put_int(&mut buf, 1); // offset cascades
        put_int(&mut buf, 0); // offsets in cascade 0

        let model = parse_model(&mut DatReader::new(Cursor::new(buf))).unwrap();
        assert_eq!(model.num_points(), LANDMARK_COUNT);
        assert_eq!(model.cascade.len(), 1);
        assert!((model.mean_shape[10].0 - 0.10).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_anchor_beyond_landmark_count() {
        let mean: Vec<(f32, f32)> = vec![(0.5, 0.5); LANDMARK_COUNT];

        let mut buf = Vec::new();
        put_int(&mut buf, 1);
        put_point_matrix(&mut buf, &mean);
        put_int(&mut buf, 1); // cascades
        put_int(&mut buf, 1); // trees in cascade 0
        put_int(&mut buf, 1); // splits
        put_int(&mut buf, 0); // feature_a
        put_int(&mut buf, 0); // feature_b
        put_float(&mut buf, 0.0); // threshold
        put_int(&mut buf, 2); // leaves
        put_point_matrix(&mut buf, &vec![(0.0, 0.0); LANDMARK_COUNT]);
        put_point_matrix(&mut buf, &vec![(0.0, 0.0); LANDMARK_COUNT]);
        put_int(&mut buf, 1); // anchor cascades
        put_int(&mut buf, 1); // anchors in cascade 0
        put_int(&mut buf, LANDMARK_COUNT as i64); // landmark index out of range
        put_int(&mut buf, 1); // offset cascades
        put_int(&mut buf, 1); // offsets in cascade 0
        put_float(&mut buf, 0.1);
        put_float(&mut buf, 0.1);

        let result = parse_model(&mut DatReader::new(Cursor::new(buf)));
        assert!(matches!(result, Err(PredictorError::Malformed(_))));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut buf = Vec::new();
        put_int(&mut buf, 7);
        let result = parse_model(&mut DatReader::new(Cursor::new(buf)));
        assert!(matches!(result, Err(PredictorError::Malformed(_))));
    }

    #[test]
    fn test_rejects_leaf_count_mismatch() {
        let mean: Vec<(f32, f32)> = vec![(0.5, 0.5); LANDMARK_COUNT];
        let mut buf = Vec::new();
        put_int(&mut buf, 1);
        put_point_matrix(&mut buf, &mean);
        put_int(&mut buf, 1); // cascades
        put_int(&mut buf, 1); // trees
        put_int(&mut buf, 0); // splits
        put_int(&mut buf, 2); // leaves: must be splits + 1 = 1
        let result = parse_model(&mut DatReader::new(Cursor::new(buf)));
        assert!(matches!(result, Err(PredictorError::Malformed(_))));
    }

    #[test]
    fn test_truncated_input_is_io_error() {
        let mut buf = Vec::new();
        put_int(&mut buf, 1);
        // Mean shape matrix header, then nothing.
        put_int(&mut buf, -(2 * LANDMARK_COUNT as i64));
        put_int(&mut buf, -1);
        let result = parse_model(&mut DatReader::new(Cursor::new(buf)));
        assert!(matches!(result, Err(PredictorError::Io(_))));
    }
}
