//! Isolation forest outlier scorer

use crate::anomaly::AnomalyTag;
use crate::error::{CarelensError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Euler-Mascheroni constant, used in the average-path-length normalizer.
const EULER_GAMMA: f64 = 0.577_215_664_9;

/// One randomized isolation tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsoNode {
    Split {
        feature: usize,
        cut: f64,
        below: Box<IsoNode>,
        above: Box<IsoNode>,
    },
    Leaf {
        size: usize,
    },
}

impl IsoNode {
    /// Grow a tree over the rows named by `rows`.
    fn grow(
        x: &Array2<f64>,
        rows: &[usize],
        depth: usize,
        depth_limit: usize,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        if depth >= depth_limit || rows.len() <= 1 {
            return IsoNode::Leaf { size: rows.len() };
        }

        let feature = rng.gen_range(0..x.ncols());
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &row in rows {
            let v = x[[row, feature]];
            lo = lo.min(v);
            hi = hi.max(v);
        }

        // Constant feature within this subset: nothing left to isolate on.
        if hi - lo < 1e-12 {
            return IsoNode::Leaf { size: rows.len() };
        }

        let cut = rng.gen_range(lo..hi);
        let (below_rows, above_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&row| x[[row, feature]] < cut);

        if below_rows.is_empty() || above_rows.is_empty() {
            return IsoNode::Leaf { size: rows.len() };
        }

        IsoNode::Split {
            feature,
            cut,
            below: Box::new(Self::grow(x, &below_rows, depth + 1, depth_limit, rng)),
            above: Box::new(Self::grow(x, &above_rows, depth + 1, depth_limit, rng)),
        }
    }

    /// Path length from the root to the leaf isolating `sample`.
    fn path_length(&self, sample: &[f64], depth: usize) -> f64 {
        match self {
            IsoNode::Leaf { size } => depth as f64 + average_path_length(*size),
            IsoNode::Split {
                feature,
                cut,
                below,
                above,
            } => {
                if sample[*feature] < *cut {
                    below.path_length(sample, depth + 1)
                } else {
                    above.path_length(sample, depth + 1)
                }
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Isolation forest with an always-set seed and a validated contamination rate.
///
/// The contamination rate is the expected fraction of rows tagged
/// [`AnomalyTag::Outlier`]; the fitted threshold is chosen so roughly
/// `round(rate * n)` training rows land at or above it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
    trees: Option<Vec<IsoNode>>,
    threshold: Option<f64>,
    fitted_sample_size: Option<usize>,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

impl IsolationForest {
    /// Forest with 100 trees, 256 samples per tree, 5% contamination, seed 42.
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.05,
            seed: 42,
            trees: None,
            threshold: None,
            fitted_sample_size: None,
        }
    }

    /// Set the number of trees.
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n.max(1);
        self
    }

    /// Set the bootstrap sample size per tree.
    pub fn with_max_samples(mut self, n: usize) -> Self {
        self.max_samples = n.max(1);
        self
    }

    /// Set the expected outlier fraction. Validated at fit time.
    pub fn with_contamination(mut self, rate: f64) -> Self {
        self.contamination = rate;
        self
    }

    /// Set the random seed. Every forest is seeded; there is no unseeded mode.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fitted decision threshold.
    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    /// Fit the forest and derive the contamination threshold.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination < 0.5) {
            return Err(CarelensError::InvalidParameter {
                name: "contamination".to_string(),
                value: self.contamination.to_string(),
                reason: "must lie in (0, 0.5)".to_string(),
            });
        }
        let n_rows = x.nrows();
        if n_rows == 0 {
            return Err(CarelensError::DataError(
                "cannot fit isolation forest on an empty table".to_string(),
            ));
        }

        let sample_size = self.max_samples.min(n_rows);
        let depth_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let rows: Vec<usize> = (0..sample_size)
                .map(|_| rng.gen_range(0..n_rows))
                .collect();
            trees.push(IsoNode::grow(x, &rows, 0, depth_limit, &mut rng));
        }

        self.trees = Some(trees);
        self.fitted_sample_size = Some(sample_size);

        // Threshold: score of the round(rate * n)-th highest training row.
        let scores = self.score_samples(x)?;
        let mut sorted: Vec<f64> = scores.iter().copied().collect();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let n_outliers = ((self.contamination * n_rows as f64).round() as usize).clamp(1, n_rows);
        self.threshold = Some(sorted[n_outliers - 1]);

        debug!(
            rows = n_rows,
            trees = self.n_estimators,
            threshold = self.threshold,
            "isolation forest fitted"
        );
        Ok(())
    }

    /// Anomaly score per row, in (0, 1); higher means more anomalous.
    pub fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let trees = self.trees.as_ref().ok_or(CarelensError::ModelNotFitted)?;
        let normalizer = average_path_length(self.fitted_sample_size.unwrap_or(256)).max(1.0);

        let rows: Vec<Vec<f64>> = x
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().collect())
            .collect();

        let scores: Vec<f64> = rows
            .par_iter()
            .map(|sample| {
                let mean_path: f64 = trees
                    .iter()
                    .map(|tree| tree.path_length(sample, 0))
                    .sum::<f64>()
                    / trees.len() as f64;
                2.0_f64.powf(-mean_path / normalizer)
            })
            .collect();

        Ok(Array1::from_vec(scores))
    }

    /// Tag every row as inlier or outlier. Total: one tag per input row.
    pub fn tag(&self, x: &Array2<f64>) -> Result<Vec<AnomalyTag>> {
        let threshold = self.threshold.ok_or(CarelensError::ModelNotFitted)?;
        let scores = self.score_samples(x)?;

        Ok(scores
            .iter()
            .map(|&s| {
                if s >= threshold {
                    AnomalyTag::Outlier
                } else {
                    AnomalyTag::Inlier
                }
            })
            .collect())
    }

    /// Fit on `x` and tag the same rows.
    pub fn fit_tag(&mut self, x: &Array2<f64>) -> Result<Vec<AnomalyTag>> {
        self.fit(x)?;
        self.tag(x)
    }
}
