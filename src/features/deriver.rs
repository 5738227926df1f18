//! Derivation of model feature columns from a raw admissions table

use crate::error::{CarelensError, Result};
use crate::schema::{columns, derived, TableSchema};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// A table augmented with derived feature columns.
#[derive(Debug, Clone)]
pub struct DerivedTable {
    /// Original columns plus "Billing Amount Numeric" and "Condition Code".
    pub table: DataFrame,
    /// Category -> code mapping used for "Condition Code". Re-derived on every
    /// call; codes are stable within one derivation only.
    pub condition_codes: BTreeMap<String, i64>,
}

/// Derives the numeric feature columns the anomaly models consume.
///
/// Validation failures name the missing columns; once validation passes,
/// derivation is total: no value can make it drop a row or error.
#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    schema: TableSchema,
}

impl FeatureDeriver {
    /// Create a deriver that enforces `schema` before deriving.
    pub fn new(schema: TableSchema) -> Self {
        Self { schema }
    }

    /// Schema enforced by this deriver.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Validate the table and append the derived columns.
    pub fn derive(&self, df: &DataFrame) -> Result<DerivedTable> {
        self.schema.validate(df)?;

        let billing = coerce_numeric(
            df.column(columns::BILLING_AMOUNT)?.as_materialized_series(),
            derived::BILLING_AMOUNT_NUMERIC,
        )?;

        let condition = df
            .column(columns::MEDICAL_CONDITION)?
            .as_materialized_series()
            .clone();
        let (codes, mapping) = encode_categories(&condition, derived::CONDITION_CODE)?;

        let mut table = df.clone();
        table = table
            .with_column(billing)
            .map_err(|e| CarelensError::DataError(e.to_string()))?
            .clone();
        table = table
            .with_column(codes)
            .map_err(|e| CarelensError::DataError(e.to_string()))?
            .clone();

        debug!(
            rows = table.height(),
            categories = mapping.len(),
            "derived feature columns"
        );

        Ok(DerivedTable {
            table,
            condition_codes: mapping,
        })
    }
}

/// Coerce a column to f64 under `name`; unparsable or missing values become 0.0.
fn coerce_numeric(series: &Series, name: &str) -> Result<Series> {
    // Non-strict cast: values that fail to parse turn into nulls.
    let cast = series
        .cast(&DataType::Float64)
        .map_err(|e| CarelensError::DataError(e.to_string()))?;
    let ca = cast
        .f64()
        .map_err(|e| CarelensError::DataError(e.to_string()))?;

    let filled: Float64Chunked = ca.into_iter().map(|v| Some(v.unwrap_or(0.0))).collect();
    Ok(filled.with_name(name.into()).into_series())
}

/// Assign a dense integer code per distinct category value.
///
/// Codes follow lexicographic order of the distinct values, so the same set of
/// categories always encodes identically. Null categories code to -1.
fn encode_categories(series: &Series, name: &str) -> Result<(Series, BTreeMap<String, i64>)> {
    let cast = series
        .cast(&DataType::String)
        .map_err(|e| CarelensError::DataError(e.to_string()))?;
    let ca = cast
        .str()
        .map_err(|e| CarelensError::DataError(e.to_string()))?;

    let mut mapping: BTreeMap<String, i64> = BTreeMap::new();
    for value in ca.into_iter().flatten() {
        mapping.entry(value.to_string()).or_insert(0);
    }
    // BTreeMap iterates lexicographically; number the entries in that order.
    let mut next = 0i64;
    for code in mapping.values_mut() {
        *code = next;
        next += 1;
    }

    let codes: Int64Chunked = ca
        .into_iter()
        .map(|v| Some(v.and_then(|s| mapping.get(s).copied()).unwrap_or(-1)))
        .collect();

    Ok((codes.with_name(name.into()).into_series(), mapping))
}
