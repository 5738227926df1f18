//! Medical-condition rarity analysis

use super::{append_column, status_series, AnalysisConfig};
use crate::anomaly::{AnomalyTag, IsolationForest, LabelContext};
use crate::error::Result;
use crate::features::{to_feature_matrix, FeatureDeriver};
use crate::schema::{derived, TableSchema};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Scalar summary of one condition analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub total_patients: usize,
    pub common_count: usize,
    pub rare_count: usize,
    /// Percentage of patients tagged "Rare Condition", in [0, 100].
    pub rare_pct: f64,
}

/// Labelled table plus summary for the presentation layer.
#[derive(Debug, Clone)]
pub struct ConditionOutcome {
    pub table: DataFrame,
    pub tags: Vec<AnomalyTag>,
    /// Category -> code mapping used for the condition feature.
    pub condition_codes: BTreeMap<String, i64>,
    pub summary: ConditionSummary,
}

/// Flags rare condition/billing combinations.
///
/// The forest fits over [condition code, billing amount], so a row is flagged
/// when its condition is rare, its billing is unusual for that condition, or
/// both.
#[derive(Debug, Clone, Default)]
pub struct ConditionAnalysis {
    config: AnalysisConfig,
}

impl ConditionAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Run the analysis over an admissions table.
    pub fn run(&self, df: &DataFrame) -> Result<ConditionOutcome> {
        let derived_table = FeatureDeriver::new(TableSchema::condition()).derive(df)?;
        let mut table = derived_table.table;

        let x = to_feature_matrix(
            &table,
            &[derived::CONDITION_CODE, derived::BILLING_AMOUNT_NUMERIC],
        )?;
        let mut forest = IsolationForest::new()
            .with_contamination(self.config.contamination)
            .with_n_estimators(self.config.n_estimators)
            .with_seed(self.config.seed);
        let tags = forest.fit_tag(&x)?;

        append_column(
            &mut table,
            status_series(&tags, LabelContext::Condition, derived::ANOMALY_STATUS),
        )?;

        let rare_count = tags.iter().filter(|t| t.is_outlier()).count();
        let total_patients = tags.len();
        let summary = ConditionSummary {
            total_patients,
            common_count: total_patients - rare_count,
            rare_count,
            rare_pct: if total_patients == 0 {
                0.0
            } else {
                rare_count as f64 / total_patients as f64 * 100.0
            },
        };

        info!(
            patients = summary.total_patients,
            rare = summary.rare_count,
            "condition analysis complete"
        );

        Ok(ConditionOutcome {
            table,
            tags,
            condition_codes: derived_table.condition_codes,
            summary,
        })
    }
}
