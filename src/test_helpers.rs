//! Shared fixtures for unit tests.

use polars::prelude::*;

use crate::extract::normalize;
use crate::schema::reading;

pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Build a normalized reading table from `(timestamp, sensor_name, value, unit)` rows.
pub fn readings(rows: &[(&str, &str, f64, &str)]) -> DataFrame {
    let times: Vec<&str> = rows.iter().map(|r| r.0).collect();
    let names: Vec<&str> = rows.iter().map(|r| r.1).collect();
    let values: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let units: Vec<&str> = rows.iter().map(|r| r.3).collect();

    let df = DataFrame::new(vec![
        Column::new(reading::RECORD_DATETIME.into(), times),
        Column::new(reading::SENSOR_NAME.into(), names),
        Column::new(reading::VALUE_CALIBRATION.into(), values),
        Column::new(reading::SENSOR_UNIT.into(), units),
    ])
    .unwrap();

    normalize(df, Some(FORMAT)).unwrap()
}

pub fn strings(df: &DataFrame, column: &str) -> Vec<String> {
    df.column(column)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect()
}

pub fn floats(df: &DataFrame, column: &str) -> Vec<f64> {
    df.column(column)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}
