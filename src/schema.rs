//! Declared column schemas for the admissions dataset
//!
//! Every analysis validates its input against one declared [`TableSchema`]
//! instead of carrying its own literal column list. Column names match the
//! uploaded CSV header verbatim.

use crate::error::{CarelensError, Result};
use polars::prelude::*;

/// Source columns expected in an uploaded admissions CSV.
pub mod columns {
    pub const NAME: &str = "Name";
    pub const AGE: &str = "Age";
    pub const GENDER: &str = "Gender";
    pub const MEDICAL_CONDITION: &str = "Medical Condition";
    pub const BILLING_AMOUNT: &str = "Billing Amount";
    pub const DATE_OF_ADMISSION: &str = "Date of Admission";
    pub const DISCHARGE_DATE: &str = "Discharge Date";
}

/// Columns appended by the feature deriver and the analyses.
pub mod derived {
    pub const BILLING_AMOUNT_NUMERIC: &str = "Billing Amount Numeric";
    pub const CONDITION_CODE: &str = "Condition Code";
    pub const NORMALIZED_BILLING: &str = "Normalized Billing Amount";
    pub const ANOMALY_STATUS: &str = "Anomaly Status";
    pub const ADMISSION_YEAR: &str = "Admission Year";
}

/// A declared set of required columns for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    required: Vec<&'static str>,
}

impl TableSchema {
    /// Create a schema from an explicit column list.
    pub fn new(required: Vec<&'static str>) -> Self {
        Self { required }
    }

    /// Columns required by the billing anomaly analysis.
    pub fn billing() -> Self {
        Self::new(vec![
            columns::NAME,
            columns::MEDICAL_CONDITION,
            columns::GENDER,
            columns::BILLING_AMOUNT,
        ])
    }

    /// Columns required by the medical-condition anomaly analysis.
    pub fn condition() -> Self {
        Self::new(vec![
            columns::NAME,
            columns::AGE,
            columns::GENDER,
            columns::MEDICAL_CONDITION,
            columns::BILLING_AMOUNT,
        ])
    }

    /// Columns required by the performance-metrics analysis.
    pub fn performance() -> Self {
        Self::new(vec![columns::MEDICAL_CONDITION, columns::BILLING_AMOUNT])
    }

    /// Required column names, in declaration order.
    pub fn required(&self) -> &[&'static str] {
        &self.required
    }

    /// Check that every required column is present.
    ///
    /// Fails with [`CarelensError::MissingColumns`] naming exactly the absent
    /// columns, in schema order.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        let present: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !present.iter().any(|p| p == *name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CarelensError::MissingColumns(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admissions_df() -> DataFrame {
        df!(
            "Name" => &["Ada", "Ben"],
            "Age" => &[34i64, 61],
            "Gender" => &["Female", "Male"],
            "Medical Condition" => &["Asthma", "Diabetes"],
            "Billing Amount" => &[1200.5, 940.0],
        )
        .unwrap()
    }

    #[test]
    fn test_validate_complete_table() {
        let df = admissions_df();
        assert!(TableSchema::condition().validate(&df).is_ok());
        assert!(TableSchema::billing().validate(&df).is_ok());
        assert!(TableSchema::performance().validate(&df).is_ok());
    }

    #[test]
    fn test_validate_names_missing_columns() {
        let df = df!(
            "Name" => &["Ada"],
            "Gender" => &["Female"],
        )
        .unwrap();

        let err = TableSchema::billing().validate(&df).unwrap_err();
        match err {
            CarelensError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["Medical Condition", "Billing Amount"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_single_missing_column() {
        let df = df!(
            "Name" => &["Ada"],
            "Age" => &[34i64],
            "Gender" => &["Female"],
            "Medical Condition" => &["Asthma"],
        )
        .unwrap();

        let err = TableSchema::condition().validate(&df).unwrap_err();
        match err {
            CarelensError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["Billing Amount"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }
}
