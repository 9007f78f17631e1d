use serde::{Deserialize, Serialize};

/// A pixel-difference split feature: intensity sampled near one anchor
/// landmark minus intensity sampled near another. Offsets are in
/// face-box-normalized coordinates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PixelDiffFeature {
    pub anchor_a: u16,
    pub anchor_b: u16,
    pub offset_a: (f32, f32),
    pub offset_b: (f32, f32),
}

/// One node of a regression tree. Split children are node indices;
/// node 0 is the root. Leaf deltas are per-landmark shape adjustments
/// in face-box-normalized coordinates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: PixelDiffFeature,
        threshold: f32,
        left: u32,
        right: u32,
    },
    Leaf {
        delta: Vec<(f32, f32)>,
    },
}

/// A single regression tree of the ERT cascade.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walks from the root to a leaf and returns its shape delta.
    ///
    /// dlib convention: a feature value ABOVE the threshold goes left.
    pub fn walk<F>(&self, feature_value: F) -> &[(f32, f32)]
    where
        F: Fn(&PixelDiffFeature) -> f32,
    {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if feature_value(feature) > *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                Node::Leaf { delta } => return delta,
            }
        }
    }
}

/// One cascade stage: an ensemble of trees whose deltas are summed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Forest {
    trees: Vec<Tree>,
    num_points: usize,
}

impl Forest {
    pub fn new(trees: Vec<Tree>, num_points: usize) -> Self {
        Self { trees, num_points }
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Largest anchor landmark index referenced by any split feature,
    /// or `None` when the forest contains no splits.
    pub fn max_anchor(&self) -> Option<u16> {
        self.trees
            .iter()
            .flat_map(|tree| tree.nodes.iter())
            .filter_map(|node| match node {
                Node::Split { feature, .. } => Some(feature.anchor_a.max(feature.anchor_b)),
                Node::Leaf { .. } => None,
            })
            .max()
    }

    /// Sums the leaf deltas of all trees for the current shape estimate.
    pub fn predict<F>(&self, feature_value: F) -> Vec<(f32, f32)>
    where
        F: Fn(&PixelDiffFeature) -> f32,
    {
        let mut total = vec![(0.0f32, 0.0f32); self.num_points];
        for tree in &self.trees {
            for (sum, d) in total.iter_mut().zip(tree.walk(&feature_value)) {
                sum.0 += d.0;
                sum.1 += d.1;
            }
        }
        total
    }
}
