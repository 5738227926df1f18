//! K-Means patient clustering

use crate::error::{CarelensError, Result};
use crate::features::to_feature_matrix;
use crate::schema::columns;
use ndarray::{Array2, ArrayView1};
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// K-Means with k-means++ initialization and a mandatory seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    n_clusters: usize,
    max_iter: usize,
    tol: f64,
    seed: u64,
    centroids: Option<Array2<f64>>,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
            centroids: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Fitted centroids, `n_clusters x n_features`.
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }

    /// k-means++ seeding: spread the initial centroids apart.
    fn init_centroids(&self, x: &Array2<f64>, rng: &mut ChaCha8Rng) -> Array2<f64> {
        let n = x.nrows();
        let mut centroids = Array2::zeros((self.n_clusters, x.ncols()));
        centroids.row_mut(0).assign(&x.row(rng.gen_range(0..n)));

        for c in 1..self.n_clusters {
            let dists: Vec<f64> = (0..n)
                .map(|i| {
                    (0..c)
                        .map(|j| Self::squared_distance(&x.row(i), &centroids.row(j)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            let total: f64 = dists.iter().sum();
            let chosen = if total <= 0.0 {
                rng.gen_range(0..n)
            } else {
                let target = rng.gen_range(0.0..total);
                let mut cumulative = 0.0;
                let mut pick = n - 1;
                for (i, d) in dists.iter().enumerate() {
                    cumulative += d;
                    if cumulative >= target {
                        pick = i;
                        break;
                    }
                }
                pick
            };
            centroids.row_mut(c).assign(&x.row(chosen));
        }
        centroids
    }

    /// Fit the model and return per-row cluster assignments.
    pub fn fit_predict(&mut self, x: &Array2<f64>) -> Result<Vec<usize>> {
        if self.n_clusters == 0 {
            return Err(CarelensError::InvalidParameter {
                name: "n_clusters".to_string(),
                value: "0".to_string(),
                reason: "need at least one cluster".to_string(),
            });
        }
        let n = x.nrows();
        if n < self.n_clusters {
            return Err(CarelensError::InvalidParameter {
                name: "n_clusters".to_string(),
                value: self.n_clusters.to_string(),
                reason: format!("table has only {n} rows"),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut centroids = self.init_centroids(x, &mut rng);
        let mut assignments = vec![0usize; n];

        for _ in 0..self.max_iter {
            // Assign each row to its nearest centroid.
            for (i, slot) in assignments.iter_mut().enumerate() {
                let mut best = 0;
                let mut best_dist = f64::MAX;
                for c in 0..self.n_clusters {
                    let d = Self::squared_distance(&x.row(i), &centroids.row(c));
                    if d < best_dist {
                        best_dist = d;
                        best = c;
                    }
                }
                *slot = best;
            }

            // Recompute centroids; empty clusters keep their position.
            let mut next = Array2::zeros((self.n_clusters, x.ncols()));
            let mut counts = vec![0usize; self.n_clusters];
            for (i, &c) in assignments.iter().enumerate() {
                let mut row = next.row_mut(c);
                row += &x.row(i);
                counts[c] += 1;
            }
            for c in 0..self.n_clusters {
                if counts[c] > 0 {
                    let mut row = next.row_mut(c);
                    row /= counts[c] as f64;
                } else {
                    next.row_mut(c).assign(&centroids.row(c));
                }
            }

            let shift: f64 = (0..self.n_clusters)
                .map(|c| Self::squared_distance(&centroids.row(c), &next.row(c)))
                .sum();
            centroids = next;
            if shift < self.tol {
                break;
            }
        }

        self.centroids = Some(centroids);
        Ok(assignments)
    }
}

/// Cluster patients over [age, billing amount]; k groups, seeded.
pub fn patient_clusters(df: &DataFrame, k: usize, seed: u64) -> Result<Vec<usize>> {
    let x = to_feature_matrix(df, &[columns::AGE, columns::BILLING_AMOUNT])?;
    KMeans::new(k).with_seed(seed).fit_predict(&x)
}
