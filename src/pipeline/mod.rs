//! The three admissions analyses
//!
//! Each analysis is one page's computation: validate the declared schema,
//! derive features, fit the anomaly scorer, and hand the labelled table plus
//! scalar summaries to the presentation layer. Analyses are independent; a
//! failure in one does not affect the others.

mod billing;
mod condition;
mod performance;

pub use billing::{BillingAnalysis, BillingOutcome, BillingSummary};
pub use condition::{ConditionAnalysis, ConditionOutcome, ConditionSummary};
pub use performance::{PerformanceAnalysis, PerformanceOutcome};

use crate::anomaly::{AnomalyTag, LabelContext};
use crate::error::{CarelensError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Shared knobs for the anomaly analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Expected outlier fraction, in (0, 0.5).
    pub contamination: f64,
    /// Random seed. Always set; renders are reproducible by default.
    pub seed: u64,
    /// Number of isolation trees.
    pub n_estimators: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            seed: 42,
            n_estimators: 100,
        }
    }
}

impl AnalysisConfig {
    pub fn with_contamination(mut self, rate: f64) -> Self {
        self.contamination = rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }
}

/// Seeded shuffle split of `0..n` into (train, test) index sets.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(CarelensError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: test_fraction.to_string(),
            reason: "must lie in (0, 1)".to_string(),
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((n as f64 * test_fraction).round() as usize).clamp(1, n.saturating_sub(1).max(1));
    let test = indices[..test_len.min(n)].to_vec();
    let train = indices[test_len.min(n)..].to_vec();
    Ok((train, test))
}

/// Render a tag column as domain labels under `name`.
pub(crate) fn status_series(tags: &[AnomalyTag], ctx: LabelContext, name: &str) -> Series {
    let labels: StringChunked = tags.iter().map(|&t| Some(ctx.label(t))).collect();
    labels.with_name(name.into()).into_series()
}

/// Append a column to a table, mapping the polars error into ours.
pub(crate) fn append_column(df: &mut DataFrame, series: Series) -> Result<()> {
    *df = df
        .with_column(series)
        .map_err(|e| CarelensError::DataError(e.to_string()))?
        .clone();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_partitions_all_indices() {
        let (train, test) = train_test_split(100, 0.2, 42).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        let a = train_test_split(50, 0.2, 7).unwrap();
        let b = train_test_split(50, 0.2, 7).unwrap();
        assert_eq!(a, b);

        let c = train_test_split(50, 0.2, 8).unwrap();
        assert_ne!(a.0, c.0);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        for f in [0.0, 1.0, -0.5, 2.0] {
            assert!(train_test_split(10, f, 1).is_err());
        }
    }

    #[test]
    fn test_status_series_labels() {
        let tags = [AnomalyTag::Inlier, AnomalyTag::Outlier];
        let series = status_series(&tags, LabelContext::Billing, "Anomaly Status");
        let ca = series.str().unwrap();
        assert_eq!(ca.get(0), Some("Normal"));
        assert_eq!(ca.get(1), Some("Suspected Anomaly"));
    }
}
