//! Performance-metrics analysis
//!
//! Fits the forest on a seeded 80/20 training split, tags every row, and
//! runs the classification machinery over the tags. The resulting report is
//! self-consistent by construction (see [`SelfConsistencyReport`]).

use super::{append_column, status_series, train_test_split, AnalysisConfig};
use crate::anomaly::{AnomalyTag, IsolationForest, LabelContext};
use crate::error::Result;
use crate::features::{to_feature_matrix, FeatureDeriver};
use crate::report::SelfConsistencyReport;
use crate::schema::{derived, TableSchema};
use ndarray::Axis;
use polars::prelude::*;
use tracing::info;

/// Fraction of rows held out of the fit.
const TEST_FRACTION: f64 = 0.2;

/// Labelled table, tags, and the self-consistency report.
#[derive(Debug, Clone)]
pub struct PerformanceOutcome {
    pub table: DataFrame,
    pub tags: Vec<AnomalyTag>,
    pub report: SelfConsistencyReport,
}

/// Exercises the metric machinery over the anomaly tags.
#[derive(Debug, Clone, Default)]
pub struct PerformanceAnalysis {
    config: AnalysisConfig,
}

impl PerformanceAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Run the analysis over an admissions table.
    ///
    /// Fails with a degenerate-label error when the tagging collapses to a
    /// single class (for example on tables too small for the contamination
    /// rate to select any outlier).
    pub fn run(&self, df: &DataFrame) -> Result<PerformanceOutcome> {
        let derived_table = FeatureDeriver::new(TableSchema::performance()).derive(df)?;
        let mut table = derived_table.table;

        let x = to_feature_matrix(
            &table,
            &[derived::CONDITION_CODE, derived::BILLING_AMOUNT_NUMERIC],
        )?;

        let (train_idx, _test_idx) = train_test_split(x.nrows(), TEST_FRACTION, self.config.seed)?;
        let x_train = x.select(Axis(0), &train_idx);

        let mut forest = IsolationForest::new()
            .with_contamination(self.config.contamination)
            .with_n_estimators(self.config.n_estimators)
            .with_seed(self.config.seed);
        forest.fit(&x_train)?;

        let tags = forest.tag(&x)?;
        append_column(
            &mut table,
            status_series(&tags, LabelContext::Condition, derived::ANOMALY_STATUS),
        )?;

        let report = SelfConsistencyReport::from_tags(&tags)?;
        info!(
            rows = tags.len(),
            outliers = report.n_outliers,
            "performance analysis complete"
        );

        Ok(PerformanceOutcome {
            table,
            tags,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CarelensError;

    fn performance_table(n: usize) -> DataFrame {
        let conditions: Vec<&str> = (0..n)
            .map(|i| match i % 3 {
                0 => "Asthma",
                1 => "Diabetes",
                _ => "Hypertension",
            })
            .collect();
        let billing: Vec<f64> = (0..n)
            .map(|i| {
                if i % 29 == 7 {
                    200_000.0 + i as f64
                } else {
                    800.0 + (i as f64 % 120.0)
                }
            })
            .collect();

        df!(
            "Medical Condition" => conditions,
            "Billing Amount" => billing,
        )
        .unwrap()
    }

    #[test]
    fn test_performance_report_is_perfect_by_construction() {
        let df = performance_table(150);
        let outcome = PerformanceAnalysis::new(AnalysisConfig::default())
            .run(&df)
            .unwrap();

        assert_eq!(outcome.table.height(), 150);
        assert_eq!(outcome.tags.len(), 150);
        assert_eq!(outcome.report.report.accuracy, 1.0);
        assert_eq!(outcome.report.report.roc_auc, 1.0);
        assert_eq!(
            outcome.report.n_outliers + outcome.report.n_inliers,
            150
        );
    }

    #[test]
    fn test_performance_degenerate_tagging_fails_loudly() {
        // Uniform data on a tiny table: the threshold row count collapses and
        // the fit-on-train/tag-all path can produce a single class.
        let df = df!(
            "Medical Condition" => &["Asthma"; 6],
            "Billing Amount" => &[1000.0; 6],
        )
        .unwrap();

        match PerformanceAnalysis::default().run(&df) {
            Err(CarelensError::DegenerateLabels(_)) => {}
            Ok(outcome) => {
                // If the forest did split the constant data, both classes
                // must genuinely be present.
                assert!(outcome.report.n_outliers > 0);
                assert!(outcome.report.n_inliers > 0);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_performance_missing_columns() {
        let df = df!("Name" => &["Ada"]).unwrap();
        let err = PerformanceAnalysis::default().run(&df).unwrap_err();
        assert!(matches!(err, CarelensError::MissingColumns(_)));
    }
}
