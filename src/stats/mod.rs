//! Descriptive summaries for the visualization feeds
//!
//! Everything here is derive-on-read: each function takes the loaded table
//! and returns plain data (counts, bins, matrices) for the presentation layer
//! to chart. No function drops or mutates input rows.

use crate::error::{CarelensError, Result};
use crate::features::with_year_column;
use crate::schema::columns;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Age bands used by the age-group distribution. Each band covers the ages
/// up to and including its upper bound that no earlier band claimed.
const AGE_BANDS: [(f64, &str); 5] = [
    (18.0, "0-18"),
    (35.0, "19-35"),
    (50.0, "36-50"),
    (65.0, "51-65"),
    (100.0, "65+"),
];

/// One fixed-width histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Basic statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
}

/// Occurrence counts of each distinct value, most frequent first.
///
/// Ties break lexicographically so the ordering is deterministic.
pub fn value_counts(df: &DataFrame, column: &str) -> Result<Vec<(String, usize)>> {
    let cast = df
        .column(column)
        .map_err(|_| CarelensError::ColumnNotFound(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| CarelensError::DataError(e.to_string()))?;
    let ca = cast
        .str()
        .map_err(|e| CarelensError::DataError(e.to_string()))?;

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in ca.into_iter().flatten() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }

    let mut pairs: Vec<(String, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(pairs)
}

/// The `n` most frequent values of a column.
pub fn top_values(df: &DataFrame, column: &str, n: usize) -> Result<Vec<(String, usize)>> {
    let mut pairs = value_counts(df, column)?;
    pairs.truncate(n);
    Ok(pairs)
}

/// Admissions per calendar year, ascending by year.
///
/// Rows with missing or unparsable dates are excluded from the counts.
pub fn yearly_counts(df: &DataFrame, date_column: &str) -> Result<Vec<(i32, usize)>> {
    let with_year = with_year_column(df, date_column, "__year")?;
    let years = with_year
        .column("__year")
        .map_err(|e| CarelensError::DataError(e.to_string()))?
        .i32()
        .map_err(|e| CarelensError::DataError(e.to_string()))?;

    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for year in years.into_iter().flatten() {
        *counts.entry(year).or_insert(0) += 1;
    }
    Ok(counts.into_iter().collect())
}

/// Patient counts per age band, in band order.
///
/// Ages outside [0, 100] or missing fall into no band.
pub fn age_group_counts(df: &DataFrame) -> Result<Vec<(String, usize)>> {
    let cast = df
        .column(columns::AGE)
        .map_err(|_| CarelensError::ColumnNotFound(columns::AGE.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| CarelensError::DataError(e.to_string()))?;
    let ages = cast
        .f64()
        .map_err(|e| CarelensError::DataError(e.to_string()))?;

    let mut counts = [0usize; AGE_BANDS.len()];
    for age in ages.into_iter().flatten() {
        if age < 0.0 {
            continue;
        }
        for (i, (upper, _)) in AGE_BANDS.iter().enumerate() {
            if age <= *upper {
                counts[i] += 1;
                break;
            }
        }
    }

    Ok(AGE_BANDS
        .iter()
        .zip(counts)
        .map(|((_, label), count)| (label.to_string(), count))
        .collect())
}

/// Histogram of ln(1 + billing) over strictly positive billing amounts.
pub fn log_billing_histogram(df: &DataFrame, n_bins: usize) -> Result<Vec<HistogramBin>> {
    if n_bins == 0 {
        return Err(CarelensError::InvalidParameter {
            name: "n_bins".to_string(),
            value: "0".to_string(),
            reason: "histogram needs at least one bin".to_string(),
        });
    }

    let cast = df
        .column(columns::BILLING_AMOUNT)
        .map_err(|_| CarelensError::ColumnNotFound(columns::BILLING_AMOUNT.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| CarelensError::DataError(e.to_string()))?;
    let ca = cast
        .f64()
        .map_err(|e| CarelensError::DataError(e.to_string()))?;

    let values: Vec<f64> = ca
        .into_iter()
        .flatten()
        .filter(|v| *v > 0.0)
        .map(|v| v.ln_1p())
        .collect();

    if values.is_empty() {
        return Ok(Vec::new());
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = ((hi - lo) / n_bins as f64).max(f64::EPSILON);

    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|i| HistogramBin {
            lower: lo + i as f64 * width,
            upper: lo + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - lo) / width) as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }
    Ok(bins)
}

/// Basic statistics of one numeric column.
pub fn numeric_summary(df: &DataFrame, column: &str) -> Result<ColumnSummary> {
    let series = df
        .column(column)
        .map_err(|_| CarelensError::ColumnNotFound(column.to_string()))?
        .as_materialized_series()
        .clone();
    let cast = series
        .cast(&DataType::Float64)
        .map_err(|e| CarelensError::DataError(e.to_string()))?;
    let ca = cast
        .f64()
        .map_err(|e| CarelensError::DataError(e.to_string()))?;

    Ok(ColumnSummary {
        name: column.to_string(),
        count: series.len(),
        null_count: series.null_count(),
        mean: ca.mean(),
        std: ca.std(1),
        min: ca.min(),
        max: ca.max(),
        median: ca.median(),
    })
}

/// Names of the numeric columns in a table.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| {
            matches!(
                c.dtype(),
                DataType::Float64
                    | DataType::Float32
                    | DataType::Int64
                    | DataType::Int32
                    | DataType::Int16
                    | DataType::Int8
                    | DataType::UInt64
                    | DataType::UInt32
                    | DataType::UInt16
                    | DataType::UInt8
            )
        })
        .map(|c| c.name().to_string())
        .collect()
}

/// Pearson correlation matrix over the table's numeric columns.
///
/// Each pair correlates over the rows where both values are present; a
/// zero-variance column correlates 0 with everything but 1 with itself.
pub fn correlation_matrix(df: &DataFrame) -> Result<(Vec<String>, Array2<f64>)> {
    let names = numeric_columns(df);
    let k = names.len();

    let mut columns_data: Vec<Vec<Option<f64>>> = Vec::with_capacity(k);
    for name in &names {
        let cast = df
            .column(name)
            .map_err(|e| CarelensError::DataError(e.to_string()))?
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| CarelensError::DataError(e.to_string()))?;
        let ca = cast
            .f64()
            .map_err(|e| CarelensError::DataError(e.to_string()))?;
        columns_data.push(ca.into_iter().collect());
    }

    let mut matrix = Array2::zeros((k, k));
    for i in 0..k {
        matrix[[i, i]] = 1.0;
        for j in (i + 1)..k {
            let r = pearson(&columns_data[i], &columns_data[j]);
            matrix[[i, j]] = r;
            matrix[[j, i]] = r;
        }
    }
    Ok((names, matrix))
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    let n = pairs.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        0.0
    } else {
        cov / (var_x.sqrt() * var_y.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_counts_ordering() {
        let df = df!(
            "Gender" => &["Male", "Female", "Female", "Male", "Female"],
        )
        .unwrap();

        let counts = value_counts(&df, "Gender").unwrap();
        assert_eq!(
            counts,
            vec![("Female".to_string(), 3), ("Male".to_string(), 2)]
        );
    }

    #[test]
    fn test_top_values_truncates() {
        let df = df!(
            "Medical Condition" => &["A", "A", "B", "C", "C", "C"],
        )
        .unwrap();
        let top = top_values(&df, "Medical Condition", 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0], ("C".to_string(), 3));
    }

    #[test]
    fn test_yearly_counts_skips_bad_dates() {
        let df = df!(
            "Date of Admission" => &["2022-05-01", "2023-02-14", "junk", "2022-11-30"],
        )
        .unwrap();

        let counts = yearly_counts(&df, "Date of Admission").unwrap();
        assert_eq!(counts, vec![(2022, 2), (2023, 1)]);
    }

    #[test]
    fn test_age_group_banding() {
        let df = df!(
            "Age" => &[5i64, 17, 18, 34, 35, 64, 65, 99, 120],
        )
        .unwrap();

        let groups = age_group_counts(&df).unwrap();
        let by_label: BTreeMap<String, usize> = groups.into_iter().collect();
        assert_eq!(by_label["0-18"], 3); // boundary age 18 stays in its band
        assert_eq!(by_label["19-35"], 2);
        assert_eq!(by_label["36-50"], 0);
        assert_eq!(by_label["51-65"], 2);
        assert_eq!(by_label["65+"], 1); // 120 falls outside every band
    }

    #[test]
    fn test_log_histogram_counts_positive_amounts() {
        let df = df!(
            "Billing Amount" => &[100.0, 200.0, 0.0, -5.0, 400.0],
        )
        .unwrap();

        let bins = log_billing_histogram(&df, 4).unwrap();
        let total: usize = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 3); // zero and negative amounts excluded
    }

    #[test]
    fn test_numeric_summary() {
        let df = df!("x" => &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let summary = numeric_summary(&df, "x").unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, Some(2.5));
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.max, Some(4.0));
    }

    #[test]
    fn test_correlation_matrix_perfect_linear() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0, 4.0],
            "b" => &[2.0, 4.0, 6.0, 8.0],
            "label" => &["w", "x", "y", "z"],
        )
        .unwrap();

        let (names, matrix) = correlation_matrix(&df).unwrap();
        assert_eq!(names, vec!["a", "b"]); // string column excluded
        assert!((matrix[[0, 1]] - 1.0).abs() < 1e-12);
        assert_eq!(matrix[[0, 0]], 1.0);
    }
}
