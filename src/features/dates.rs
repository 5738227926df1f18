//! Date parsing for admission and discharge columns

use crate::error::{CarelensError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Accepted date layouts, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Parse one date string; `None` when no accepted layout matches.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value.trim(), fmt).ok())
}

/// Append a nullable Int32 year column parsed from `source` under `out_name`.
///
/// Invalid or missing dates yield nulls; rows are never dropped.
pub fn with_year_column(df: &DataFrame, source: &str, out_name: &str) -> Result<DataFrame> {
    let cast = df
        .column(source)
        .map_err(|_| CarelensError::ColumnNotFound(source.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| CarelensError::DataError(e.to_string()))?;
    let ca = cast
        .str()
        .map_err(|e| CarelensError::DataError(e.to_string()))?;

    let years: Int32Chunked = ca
        .into_iter()
        .map(|v| v.and_then(parse_date).map(|d| d.year()))
        .collect();

    let mut result = df.clone();
    result = result
        .with_column(years.with_name(out_name.into()).into_series())
        .map_err(|e| CarelensError::DataError(e.to_string()))?
        .clone();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{columns, derived};

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(
            parse_date("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(
            parse_date("03/15/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_year_column_with_invalid_values() {
        let df = df!(
            "Date of Admission" => &["2023-01-10", "garbage", "2024-06-02"],
        )
        .unwrap();

        let result =
            with_year_column(&df, columns::DATE_OF_ADMISSION, derived::ADMISSION_YEAR).unwrap();
        assert_eq!(result.height(), 3);

        let years = result.column(derived::ADMISSION_YEAR).unwrap().i32().unwrap();
        assert_eq!(years.get(0), Some(2023));
        assert_eq!(years.get(1), None);
        assert_eq!(years.get(2), Some(2024));
    }
}
