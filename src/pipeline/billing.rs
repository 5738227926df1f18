//! Billing anomaly analysis

use super::{append_column, status_series, AnalysisConfig};
use crate::anomaly::{AnomalyTag, IsolationForest, LabelContext};
use crate::error::Result;
use crate::features::{to_feature_matrix, FeatureDeriver, StandardScaler};
use crate::schema::{derived, TableSchema};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Scalar summary of one billing analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub total_rows: usize,
    pub normal_count: usize,
    pub suspected_count: usize,
    /// Percentage of rows tagged "Suspected Anomaly", in [0, 100].
    pub suspected_pct: f64,
}

/// Labelled table plus summary for the presentation layer.
#[derive(Debug, Clone)]
pub struct BillingOutcome {
    /// Input columns plus the derived, normalized, and status columns.
    pub table: DataFrame,
    pub tags: Vec<AnomalyTag>,
    pub summary: BillingSummary,
}

/// Flags unusually large or small billing amounts.
///
/// The billing amount is z-scored and the forest fits over that single
/// feature, so the flagged rows are the amounts far from the bulk of the
/// distribution.
#[derive(Debug, Clone, Default)]
pub struct BillingAnalysis {
    config: AnalysisConfig,
}

impl BillingAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Run the analysis over an admissions table.
    pub fn run(&self, df: &DataFrame) -> Result<BillingOutcome> {
        let derived_table = FeatureDeriver::new(TableSchema::billing()).derive(df)?;
        let mut table = derived_table.table;

        let mut scaler = StandardScaler::new();
        scaler.fit(&table, &[derived::BILLING_AMOUNT_NUMERIC])?;
        let normalized = scaler.scale_column(
            &table,
            derived::BILLING_AMOUNT_NUMERIC,
            derived::NORMALIZED_BILLING,
        )?;
        append_column(&mut table, normalized)?;

        let x = to_feature_matrix(&table, &[derived::NORMALIZED_BILLING])?;
        let mut forest = IsolationForest::new()
            .with_contamination(self.config.contamination)
            .with_n_estimators(self.config.n_estimators)
            .with_seed(self.config.seed);
        let tags = forest.fit_tag(&x)?;

        append_column(
            &mut table,
            status_series(&tags, LabelContext::Billing, derived::ANOMALY_STATUS),
        )?;

        let suspected_count = tags.iter().filter(|t| t.is_outlier()).count();
        let total_rows = tags.len();
        let summary = BillingSummary {
            total_rows,
            normal_count: total_rows - suspected_count,
            suspected_count,
            suspected_pct: if total_rows == 0 {
                0.0
            } else {
                suspected_count as f64 / total_rows as f64 * 100.0
            },
        };

        info!(
            rows = summary.total_rows,
            suspected = summary.suspected_count,
            "billing analysis complete"
        );

        Ok(BillingOutcome {
            table,
            tags,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn billing_table(n: usize, spike_at: usize) -> DataFrame {
        let names: Vec<String> = (0..n).map(|i| format!("Patient {i}")).collect();
        let conditions: Vec<&str> = (0..n).map(|_| "Asthma").collect();
        let genders: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "Female" } else { "Male" }).collect();
        let billing: Vec<f64> = (0..n)
            .map(|i| if i == spike_at { 1_000_000.0 } else { 1000.0 })
            .collect();

        df!(
            "Name" => names,
            "Medical Condition" => conditions,
            "Gender" => genders,
            "Billing Amount" => billing,
        )
        .unwrap()
    }

    #[test]
    fn test_billing_run_preserves_rows_and_flags_spike() {
        let df = billing_table(100, 63);
        let outcome = BillingAnalysis::new(AnalysisConfig::default())
            .run(&df)
            .unwrap();

        assert_eq!(outcome.table.height(), 100);
        assert_eq!(outcome.tags.len(), 100);
        assert_eq!(outcome.tags[63], AnomalyTag::Outlier);

        let status = outcome
            .table
            .column(derived::ANOMALY_STATUS)
            .unwrap()
            .str()
            .unwrap();
        assert_eq!(status.get(63), Some("Suspected Anomaly"));
    }

    #[test]
    fn test_billing_summary_counts_add_up() {
        let df = billing_table(80, 5);
        let outcome = BillingAnalysis::new(AnalysisConfig::default())
            .run(&df)
            .unwrap();

        let s = &outcome.summary;
        assert_eq!(s.total_rows, 80);
        assert_eq!(s.normal_count + s.suspected_count, 80);
        assert!(s.suspected_pct > 0.0 && s.suspected_pct < 100.0);
    }

    #[test]
    fn test_billing_missing_column_aborts_early() {
        let df = df!(
            "Name" => &["Ada"],
            "Gender" => &["Female"],
            "Medical Condition" => &["Asthma"],
        )
        .unwrap();

        let err = BillingAnalysis::default().run(&df).unwrap_err();
        assert!(err.to_string().contains("Billing Amount"));
    }
}
