/// A 2D similarity transform (uniform scale + rotation + translation):
///
/// ```text
/// x' = a*x - b*y + tx
/// y' = b*x + a*y + ty
/// ```
///
/// where `a = s*cos(θ)` and `b = s*sin(θ)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Similarity {
    pub a: f64,
    pub b: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Similarity {
    pub const IDENTITY: Similarity = Similarity {
        a: 1.0,
        b: 0.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Least-squares similarity mapping `from` points onto `to` points.
    ///
    /// Closed-form solution treating points as complex numbers. Returns
    /// `None` when the source points are degenerate (all coincident).
    pub fn estimate(from: &[(f64, f64)], to: &[(f64, f64)]) -> Option<Similarity> {
        debug_assert_eq!(from.len(), to.len());
        if from.is_empty() {
            return None;
        }

        let mean_from = centroid(from);
        let mean_to = centroid(to);

        let mut num_a = 0.0;
        let mut num_b = 0.0;
        let mut den = 0.0;
        for (f, t) in from.iter().zip(to) {
            let fx = f.0 - mean_from.0;
            let fy = f.1 - mean_from.1;
            let tx = t.0 - mean_to.0;
            let ty = t.1 - mean_to.1;
            num_a += fx * tx + fy * ty;
            num_b += fx * ty - fy * tx;
            den += fx * fx + fy * fy;
        }
        if den == 0.0 {
            return None;
        }

        let a = num_a / den;
        let b = num_b / den;
        Some(Similarity {
            a,
            b,
            tx: mean_to.0 - (a * mean_from.0 - b * mean_from.1),
            ty: mean_to.1 - (b * mean_from.0 + a * mean_from.1),
        })
    }

    pub fn apply(&self, p: (f64, f64)) -> (f64, f64) {
        (
            self.a * p.0 - self.b * p.1 + self.tx,
            self.b * p.0 + self.a * p.1 + self.ty,
        )
    }

    /// The inverse transform, or `None` when the scale is zero.
    pub fn inverse(&self) -> Option<Similarity> {
        let s2 = self.a * self.a + self.b * self.b;
        if s2 == 0.0 {
            return None;
        }
        let ia = self.a / s2;
        let ib = -self.b / s2;
        Some(Similarity {
            a: ia,
            b: ib,
            tx: -(ia * self.tx - ib * self.ty),
            ty: -(ib * self.tx + ia * self.ty),
        })
    }

    pub fn scale(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    /// Unit-scale rotation component `(cos θ, sin θ)`.
    pub fn rotation(&self) -> (f64, f64) {
        let s = self.scale();
        if s == 0.0 {
            return (1.0, 0.0);
        }
        (self.a / s, self.b / s)
    }
}

fn centroid(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
    (sum.0 / n, sum.1 / n)
}
