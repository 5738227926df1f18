//! Billing-by-age least-squares regression

use crate::error::{CarelensError, Result};
use crate::features::to_feature_matrix;
use crate::pipeline::train_test_split;
use crate::schema::columns;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One-feature ordinary least squares: y = slope * x + intercept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimpleLinearRegression {
    slope: f64,
    intercept: f64,
    is_fitted: bool,
}

impl SimpleLinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit on paired observations.
    pub fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<&mut Self> {
        if x.len() != y.len() {
            return Err(CarelensError::ShapeError {
                expected: format!("{} targets", x.len()),
                actual: format!("{}", y.len()),
            });
        }
        if x.len() < 2 {
            return Err(CarelensError::DataError(
                "regression needs at least two observations".to_string(),
            ));
        }

        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_y = y.iter().sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var = 0.0;
        for (xi, yi) in x.iter().zip(y.iter()) {
            cov += (xi - mean_x) * (yi - mean_y);
            var += (xi - mean_x).powi(2);
        }

        // A constant feature fits a flat line through the target mean.
        self.slope = if var == 0.0 { 0.0 } else { cov / var };
        self.intercept = mean_y - self.slope * mean_x;
        self.is_fitted = true;
        Ok(self)
    }

    /// Predicted target for one feature value.
    pub fn predict(&self, x: f64) -> Result<f64> {
        if !self.is_fitted {
            return Err(CarelensError::ModelNotFitted);
        }
        Ok(self.slope * x + self.intercept)
    }

    /// Coefficient of determination (R²) on paired observations.
    pub fn score(&self, x: &[f64], y: &[f64]) -> Result<f64> {
        if !self.is_fitted {
            return Err(CarelensError::ModelNotFitted);
        }

        let n = y.len() as f64;
        if n == 0.0 {
            return Ok(0.0);
        }
        let mean_y = y.iter().sum::<f64>() / n;
        let ss_tot: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
        let ss_res: f64 = x
            .iter()
            .zip(y.iter())
            .map(|(xi, yi)| (yi - (self.slope * xi + self.intercept)).powi(2))
            .sum();

        if ss_tot == 0.0 {
            Ok(0.0)
        } else {
            Ok(1.0 - ss_res / ss_tot)
        }
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Fitted billing-by-age model with split scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionInsight {
    pub model: SimpleLinearRegression,
    pub train_r2: f64,
    pub test_r2: f64,
    pub n_train: usize,
    pub n_test: usize,
}

/// Fit billing amount on age with a seeded 80/20 split.
pub fn billing_by_age(df: &DataFrame, seed: u64) -> Result<RegressionInsight> {
    let matrix = to_feature_matrix(df, &[columns::AGE, columns::BILLING_AMOUNT])?;
    let ages: Vec<f64> = matrix.column(0).to_vec();
    let billing: Vec<f64> = matrix.column(1).to_vec();

    let (train_idx, test_idx) = train_test_split(ages.len(), 0.2, seed)?;
    let pick = |idx: &[usize], data: &[f64]| -> Vec<f64> {
        idx.iter().map(|&i| data[i]).collect()
    };

    let x_train = pick(&train_idx, &ages);
    let y_train = pick(&train_idx, &billing);
    let x_test = pick(&test_idx, &ages);
    let y_test = pick(&test_idx, &billing);

    let mut model = SimpleLinearRegression::new();
    model.fit(&x_train, &y_train)?;
    let train_r2 = model.score(&x_train, &y_train)?;
    let test_r2 = model.score(&x_test, &y_test)?;

    Ok(RegressionInsight {
        model,
        train_r2,
        test_r2,
        n_train: train_idx.len(),
        n_test: test_idx.len(),
    })
}
