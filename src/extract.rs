use polars::datatypes::TimeUnit;
use polars::prelude::StrptimeOptions;
use polars::prelude::*;

use crate::category::{classify, Category};
use crate::error::ClimateError;
use crate::schema::reading;

/// Sort order of every category table: sensor identity, then time.
pub(crate) const SORT_KEY: [&str; 2] = [reading::SENSOR_NAME, reading::RECORD_DATETIME];

/// Readings of one category, sorted by (sensor_name, record_datetime).
///
/// Empty is a valid state: the category had no matching rows.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    category: Category,
    frame: DataFrame,
}

impl CategoryTable {
    /// Wrap an already filtered and sorted frame.
    pub(crate) fn new(category: Category, frame: DataFrame) -> Self {
        Self { category, frame }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), ClimateError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(ClimateError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Validate and coerce an uploaded table into the reading schema.
///
/// - `sensor_name` and `sensor_unit` become strings.
/// - `value_calibration` becomes Float64; values that do not parse turn
///   into nulls and are rejected later by the index calculators.
/// - a textual `record_datetime` is parsed with `timestamp_format` when one
///   is given, falling back to an inferred format when it does not match;
///   without a format it is kept as text.
///
/// Extra columns are preserved.
pub fn normalize(df: DataFrame, timestamp_format: Option<&str>) -> Result<DataFrame, ClimateError> {
    require_columns(&df, &reading::REQUIRED)?;

    let value_is_text = df.column(reading::VALUE_CALIBRATION)?.dtype() == &DataType::String;
    let time_is_text = df.column(reading::RECORD_DATETIME)?.dtype() == &DataType::String;

    let value_expr = if value_is_text {
        col(reading::VALUE_CALIBRATION)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .cast(DataType::Float64)
    } else {
        col(reading::VALUE_CALIBRATION).cast(DataType::Float64)
    };

    let df = df
        .lazy()
        .with_columns([
            col(reading::SENSOR_NAME).cast(DataType::String),
            col(reading::SENSOR_UNIT).cast(DataType::String),
            value_expr,
        ])
        .collect()?;

    match timestamp_format {
        Some(format) if time_is_text => {
            match parse_datetime_column(df.clone(), reading::RECORD_DATETIME, Some(format)) {
                Ok(parsed) => Ok(parsed),
                Err(err) => {
                    log::warn!(
                        "{} does not match {format:?} ({err}), inferring the format",
                        reading::RECORD_DATETIME
                    );
                    parse_datetime_column(df, reading::RECORD_DATETIME, None)
                }
            }
        }
        _ => Ok(df),
    }
}

/// Parse a string column to Datetime. Without a format, polars infers one
/// from the first value. Unparseable values are an error.
fn parse_datetime_column(
    df: DataFrame,
    column: &str,
    format: Option<&str>,
) -> Result<DataFrame, ClimateError> {
    let df = df
        .lazy()
        .with_columns([col(column)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .str()
            .to_datetime(
                Some(TimeUnit::Microseconds),
                None,
                StrptimeOptions {
                    format: format.map(Into::into),
                    strict: true,
                    ..Default::default()
                },
                lit("raise"),
            )])
        .collect()?;
    Ok(df)
}

/// Rows of `df` whose sensor name matches `category`, stably sorted by
/// (sensor_name, record_datetime). All original columns are kept.
pub fn extract(df: &DataFrame, category: Category) -> Result<CategoryTable, ClimateError> {
    let mask = classify(df, category)?;
    let frame = df
        .filter(&mask)?
        .sort(SORT_KEY, SortMultipleOptions::default().with_maintain_order(true))?;

    log::debug!("extracted {} {} reading(s)", frame.height(), category);
    Ok(CategoryTable::new(category, frame))
}

/// Concatenate two category tables into one, re-sorted the same way.
pub fn stack(first: &CategoryTable, second: &CategoryTable) -> Result<DataFrame, ClimateError> {
    let stacked = first
        .frame
        .vstack(&second.frame)?
        .sort(SORT_KEY, SortMultipleOptions::default().with_maintain_order(true))?;
    Ok(stacked)
}
