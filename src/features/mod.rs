//! Feature derivation for the anomaly analyses
//!
//! Turns a validated admissions table into model-ready numeric columns:
//! - billing amounts coerced to floats (unparsable values become 0.0),
//! - medical conditions encoded to dense integer codes,
//! - admission/discharge dates parsed with a year column for the stats feeds,
//! - z-score scaling for the billing analysis.

mod dates;
mod deriver;
mod scaler;

pub use dates::{parse_date, with_year_column};
pub use deriver::{DerivedTable, FeatureDeriver};
pub use scaler::StandardScaler;

use crate::error::{CarelensError, Result};
use ndarray::Array2;
use polars::prelude::*;

/// Extract named columns as an `n_rows x n_cols` feature matrix.
///
/// Columns are cast to f64; nulls become 0.0 so every row stays representable.
pub fn to_feature_matrix(df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = columns.len();
    let mut data = Vec::with_capacity(n_rows * n_cols);

    let mut casts = Vec::with_capacity(n_cols);
    for name in columns {
        let column = df
            .column(name)
            .map_err(|_| CarelensError::ColumnNotFound(name.to_string()))?;
        let cast = column
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| CarelensError::DataError(e.to_string()))?;
        casts.push(cast);
    }
    let mut chunked = Vec::with_capacity(n_cols);
    for cast in &casts {
        chunked.push(cast.f64().map_err(|e| CarelensError::DataError(e.to_string()))?);
    }

    for row in 0..n_rows {
        for ca in &chunked {
            data.push(ca.get(row).unwrap_or(0.0));
        }
    }

    Array2::from_shape_vec((n_rows, n_cols), data).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_matrix_shape_and_null_fill() {
        let df = df!(
            "x" => &[Some(1.0), None, Some(3.0)],
            "y" => &[10i64, 20, 30],
        )
        .unwrap();

        let x = to_feature_matrix(&df, &["x", "y"]).unwrap();
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(x[[1, 0]], 0.0);
        assert_eq!(x[[2, 1]], 30.0);
    }

    #[test]
    fn test_feature_matrix_unknown_column() {
        let df = df!("x" => &[1.0, 2.0]).unwrap();
        let err = to_feature_matrix(&df, &["missing"]).unwrap_err();
        assert!(matches!(err, CarelensError::ColumnNotFound(_)));
    }
}
