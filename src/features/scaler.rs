//! Z-score scaling for numeric feature columns

use crate::error::{CarelensError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-column fitted scaling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnScale {
    mean: f64,
    std: f64,
}

/// Standard (z-score) scaler: (x - mean) / std per column.
///
/// A zero-variance column scales with std 1.0 so transformation stays total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: HashMap<String, ColumnScale>,
    is_fitted: bool,
}

impl StandardScaler {
    /// Create an unfitted scaler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to the named columns.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for name in columns {
            let column = df
                .column(name)
                .map_err(|_| CarelensError::ColumnNotFound(name.to_string()))?;
            let cast = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| CarelensError::DataError(e.to_string()))?;
            let ca = cast
                .f64()
                .map_err(|e| CarelensError::DataError(e.to_string()))?;

            let mean = ca.mean().unwrap_or(0.0);
            let std = ca.std(1).unwrap_or(1.0);
            self.params.insert(
                name.to_string(),
                ColumnScale {
                    mean,
                    std: if std == 0.0 { 1.0 } else { std },
                },
            );
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted column with its scaled values.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CarelensError::ModelNotFitted);
        }

        let mut result = df.clone();
        for name in self.params.keys() {
            if df.column(name).is_err() {
                continue;
            }
            let scaled = self.scale_column(df, name, name)?;
            result = result
                .with_column(scaled)
                .map_err(|e| CarelensError::DataError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Scaled copy of one fitted column, emitted under `out_name`.
    pub fn scale_column(&self, df: &DataFrame, column: &str, out_name: &str) -> Result<Series> {
        let scale = self
            .params
            .get(column)
            .ok_or(CarelensError::ModelNotFitted)?;

        let cast = df
            .column(column)
            .map_err(|_| CarelensError::ColumnNotFound(column.to_string()))?
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| CarelensError::DataError(e.to_string()))?;
        let ca = cast
            .f64()
            .map_err(|e| CarelensError::DataError(e.to_string()))?;

        let scaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| (v - scale.mean) / scale.std))
            .collect();
        Ok(scaled.with_name(out_name.into()).into_series())
    }
}
