use std::fmt;

use polars::prelude::*;

use crate::category::Category;
use crate::error::ClimateError;
use crate::extract::{CategoryTable, SORT_KEY};
use crate::schema::{self, reading};

/// Which join produced an aligned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPath {
    /// Inner join on (record_datetime, sensor_name).
    Strict,
    /// Inner join on record_datetime only, after the strict join found nothing.
    Fallback,
    /// No overlap (or an empty input); no rows.
    Empty,
}

impl fmt::Display for JoinPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinPath::Strict => "strict",
            JoinPath::Fallback => "fallback",
            JoinPath::Empty => "empty",
        })
    }
}

/// Row-aligned pairing of two category tables.
///
/// Non-key columns carry the origin suffix of their category
/// (`value_calibration_temp`, `sensor_unit_hum`, ...).
#[derive(Debug, Clone)]
pub struct AlignedTable {
    left: Category,
    right: Category,
    path: JoinPath,
    frame: DataFrame,
}

impl AlignedTable {
    pub fn left(&self) -> Category {
        self.left
    }

    pub fn right(&self) -> Category {
        self.right
    }

    pub fn path(&self) -> JoinPath {
        self.path
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Name of the measured-value column contributed by `category`.
    pub fn value_column(&self, category: Category) -> String {
        schema::suffixed(reading::VALUE_CALIBRATION, category.suffix())
    }
}

/// Align two category tables.
///
/// Tries the strict (timestamp, sensor) join first. Only when that yields
/// nothing and both inputs have rows (or one side carries no `sensor_name`)
/// does it fall back to a timestamp-only join, reconciling `sensor_name`
/// from the left side, then the right, then an empty placeholder.
///
/// The fallback pairs every left sensor with every right sensor sharing a
/// timestamp.
pub fn align(left: &CategoryTable, right: &CategoryTable) -> Result<AlignedTable, ClimateError> {
    let (lc, rc) = (left.category(), right.category());

    if has_identity(left) && has_identity(right) {
        let strict = strict_join(left, right)?;
        if strict.height() > 0 {
            log::info!("{lc}/{rc}: strict alignment, {} row(s)", strict.height());
            return Ok(AlignedTable {
                left: lc,
                right: rc,
                path: JoinPath::Strict,
                frame: strict,
            });
        }

        if left.is_empty() || right.is_empty() {
            log::info!("{lc}/{rc}: empty input, no alignment");
            return Ok(AlignedTable {
                left: lc,
                right: rc,
                path: JoinPath::Empty,
                frame: strict,
            });
        }
    } else {
        log::debug!("{lc}/{rc}: no sensor_name on one side, strict alignment skipped");
    }

    let fallback = fallback_join(left, right)?;
    let path = if fallback.height() > 0 {
        JoinPath::Fallback
    } else {
        JoinPath::Empty
    };

    if fallback.height() > left.height().max(right.height()) {
        log::warn!(
            "{lc}/{rc}: timestamp-only alignment multiplied {} x {} reading(s) into {} row(s)",
            left.height(),
            right.height(),
            fallback.height()
        );
    }
    log::info!("{lc}/{rc}: {path} alignment, {} row(s)", fallback.height());

    Ok(AlignedTable {
        left: lc,
        right: rc,
        path,
        frame: fallback,
    })
}

fn has_identity(table: &CategoryTable) -> bool {
    table.frame().column(reading::SENSOR_NAME).is_ok()
}

fn strict_join(left: &CategoryTable, right: &CategoryTable) -> Result<DataFrame, ClimateError> {
    let keys: Vec<Expr> = reading::KEY.iter().map(|c| col(*c)).collect();

    let df = suffix_columns(left, &reading::KEY)
        .join(
            suffix_columns(right, &reading::KEY),
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;
    sorted(df)
}

fn fallback_join(left: &CategoryTable, right: &CategoryTable) -> Result<DataFrame, ClimateError> {
    let time_key = [reading::RECORD_DATETIME];

    let joined = suffix_columns(left, &time_key)
        .join(
            suffix_columns(right, &time_key),
            [col(reading::RECORD_DATETIME)],
            [col(reading::RECORD_DATETIME)],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;

    let left_id = schema::suffixed(reading::SENSOR_NAME, left.category().suffix());
    let right_id = schema::suffixed(reading::SENSOR_NAME, right.category().suffix());

    let identity = if joined.column(&left_id).is_ok() && joined.column(&right_id).is_ok() {
        when(col(left_id.as_str()).is_not_null())
            .then(col(left_id.as_str()))
            .otherwise(col(right_id.as_str()))
            .fill_null(lit(""))
    } else {
        lit("")
    };

    let reconciled = joined
        .lazy()
        .with_columns([identity.alias(reading::SENSOR_NAME)])
        .collect()?;

    // Keep the key columns first, as in the strict join.
    let mut order: Vec<String> = reading::KEY.iter().map(|c| c.to_string()).collect();
    order.extend(
        reconciled
            .get_column_names_str()
            .into_iter()
            .filter(|c| !reading::KEY.contains(c))
            .map(|c| c.to_string()),
    );

    sorted(reconciled.select(order)?)
}

/// Join output order is not guaranteed; restore the category-table order.
fn sorted(df: DataFrame) -> Result<DataFrame, ClimateError> {
    Ok(df.sort(SORT_KEY, SortMultipleOptions::default().with_maintain_order(true))?)
}

/// Rename every column outside `keep` to `<column>_<category suffix>`.
fn suffix_columns(table: &CategoryTable, keep: &[&str]) -> LazyFrame {
    let suffix = table.category().suffix();
    let (old, new): (Vec<String>, Vec<String>) = table
        .frame()
        .get_column_names_str()
        .into_iter()
        .filter(|c| !keep.contains(c))
        .map(|c| (c.to_string(), schema::suffixed(c, suffix)))
        .unzip();

    table.frame().clone().lazy().rename(old, new, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::test_helpers::{floats, readings, strings};

    fn tables(df: &DataFrame, left: Category, right: Category) -> (CategoryTable, CategoryTable) {
        (extract(df, left).unwrap(), extract(df, right).unwrap())
    }

    #[test]
    fn test_strict_alignment_on_shared_keys() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "room_temp_hum", 30.0, "C"),
            ("2024-05-01 09:00:00", "room_temp_hum", 31.0, "C"),
        ]);
        // The same sensor name is both a temperature and a humidity sensor.
        let (temp, hum) = tables(&df, Category::Temperature, Category::Humidity);

        let aligned = align(&temp, &hum).unwrap();
        assert_eq!(aligned.path(), JoinPath::Strict);
        assert_eq!(aligned.frame().height(), temp.height());
        assert!(aligned.frame().column("value_calibration_temp").is_ok());
        assert!(aligned.frame().column("value_calibration_hum").is_ok());
        assert!(aligned.frame().column("sensor_unit_hum").is_ok());
        assert_eq!(strings(aligned.frame(), reading::SENSOR_NAME), vec!["room_temp_hum"; 2]);
    }

    #[test]
    fn test_fallback_reconciles_identity_from_left() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "temp_1", 30.0, "C"),
            ("2024-05-01 08:00:00", "humidity_1", 80.0, "%"),
            ("2024-05-01 09:00:00", "temp_1", 29.0, "C"),
        ]);
        let (temp, hum) = tables(&df, Category::Temperature, Category::Humidity);

        let aligned = align(&temp, &hum).unwrap();
        assert_eq!(aligned.path(), JoinPath::Fallback);
        assert_eq!(aligned.frame().height(), 1);
        assert_eq!(strings(aligned.frame(), reading::SENSOR_NAME), vec!["temp_1"]);
        assert_eq!(strings(aligned.frame(), "sensor_name_hum"), vec!["humidity_1"]);
        assert_eq!(floats(aligned.frame(), &aligned.value_column(Category::Humidity)), vec![80.0]);
        let names = aligned.frame().get_column_names_str();
        assert_eq!(&names[..2], &reading::KEY[..]);
    }

    #[test]
    fn test_fallback_uses_right_identity_when_left_is_null() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "temp_1", 30.0, "C"),
            ("2024-05-01 08:00:00", "wind_1", 3.0, "m/s"),
        ]);
        let (temp, wind) = tables(&df, Category::Temperature, Category::Wind);
        let temp = without_names(&temp);

        let aligned = align(&temp, &wind).unwrap();
        assert_eq!(aligned.path(), JoinPath::Fallback);
        assert_eq!(strings(aligned.frame(), reading::SENSOR_NAME), vec!["wind_1"]);
    }

    fn without_names(table: &CategoryTable) -> CategoryTable {
        let frame = table
            .frame()
            .clone()
            .lazy()
            .with_columns([lit(NULL).cast(DataType::String).alias(reading::SENSOR_NAME)])
            .collect()
            .unwrap();
        CategoryTable::new(table.category(), frame)
    }

    #[test]
    fn test_fallback_uses_placeholder_when_both_names_are_null() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "temp_1", 30.0, "C"),
            ("2024-05-01 08:00:00", "hum_1", 60.0, "%"),
        ]);
        let (temp, hum) = tables(&df, Category::Temperature, Category::Humidity);

        let aligned = align(&without_names(&temp), &without_names(&hum)).unwrap();
        assert_eq!(aligned.path(), JoinPath::Fallback);
        assert_eq!(aligned.frame().height(), 1);
        assert_eq!(strings(aligned.frame(), reading::SENSOR_NAME), vec![""]);
        assert_eq!(aligned.frame().column(reading::SENSOR_NAME).unwrap().null_count(), 0);
    }

    #[test]
    fn test_fallback_uses_placeholder_when_identity_column_is_missing() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "temp_1", 30.0, "C"),
            ("2024-05-01 08:00:00", "wind_1", 3.0, "m/s"),
        ]);
        let (temp, wind) = tables(&df, Category::Temperature, Category::Wind);
        let anonymous = temp.frame().drop(reading::SENSOR_NAME).unwrap();
        let temp = CategoryTable::new(Category::Temperature, anonymous);

        let aligned = align(&temp, &wind).unwrap();
        assert_eq!(aligned.path(), JoinPath::Fallback);
        assert!(aligned.frame().column("sensor_name_temp").is_err());
        assert_eq!(strings(aligned.frame(), "sensor_name_wind"), vec!["wind_1"]);
        assert_eq!(strings(aligned.frame(), reading::SENSOR_NAME), vec![""]);
    }

    #[test]
    fn test_fallback_cross_multiplies_shared_timestamps() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "temp_1", 30.0, "C"),
            ("2024-05-01 08:00:00", "temp_2", 31.0, "C"),
            ("2024-05-01 08:00:00", "hum_1", 70.0, "%"),
            ("2024-05-01 08:00:00", "hum_2", 75.0, "%"),
        ]);
        let (temp, hum) = tables(&df, Category::Temperature, Category::Humidity);

        let aligned = align(&temp, &hum).unwrap();
        assert_eq!(aligned.path(), JoinPath::Fallback);
        assert_eq!(aligned.frame().height(), 4);
    }

    #[test]
    fn test_disjoint_timestamps_are_empty() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "temp_1", 30.0, "C"),
            ("2024-05-01 09:00:00", "hum_1", 70.0, "%"),
        ]);
        let (temp, hum) = tables(&df, Category::Temperature, Category::Humidity);

        let aligned = align(&temp, &hum).unwrap();
        assert_eq!(aligned.path(), JoinPath::Empty);
        assert!(aligned.is_empty());
    }

    #[test]
    fn test_empty_input_skips_fallback() {
        let df = readings(&[("2024-05-01 08:00:00", "temp_1", 30.0, "C")]);
        let (temp, wind) = tables(&df, Category::Temperature, Category::Wind);
        assert!(wind.is_empty());

        let aligned = align(&temp, &wind).unwrap();
        assert_eq!(aligned.path(), JoinPath::Empty);
        assert!(aligned.is_empty());
        assert!(aligned.frame().column("value_calibration_wind").is_ok());
    }
}
