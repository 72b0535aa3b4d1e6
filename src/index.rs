use std::fmt;

use polars::prelude::*;

use crate::align::AlignedTable;
use crate::category::Category;
use crate::error::ClimateError;
use crate::schema::derived;

// ── Formulas ────────────────────────────────────────────────────────────────

/// Temperature-Humidity Index: `T - (0.55 - 0.0055 * H) * (T - 14.5)`.
///
/// No unit conversion; `humidity` is relative humidity in percent.
pub fn thi(temperature: f64, humidity: f64) -> f64 {
    temperature - (0.55 - 0.0055 * humidity) * (temperature - 14.5)
}

/// Wind Chill Index: `T - 0.7 * W`.
pub fn wci(temperature: f64, wind_speed: f64) -> f64 {
    temperature - wind_speed * 0.7
}

// ── THI policy table ────────────────────────────────────────────────────────

/// Heat-stress band of a THI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThiCategory {
    Severe,
    Moderate,
    Caution,
    Safe,
}

impl ThiCategory {
    /// Most severe first.
    pub const ALL: [ThiCategory; 4] = [
        ThiCategory::Severe,
        ThiCategory::Moderate,
        ThiCategory::Caution,
        ThiCategory::Safe,
    ];

    /// Inclusive lower bounds, highest first.
    pub const BANDS: [(f64, ThiCategory); 4] = [
        (30.0, ThiCategory::Severe),
        (28.0, ThiCategory::Moderate),
        (27.0, ThiCategory::Caution),
        (f64::NEG_INFINITY, ThiCategory::Safe),
    ];

    pub const ADVICE: [&'static str; 7] = [
        "Keep housing ventilation sufficient and unobstructed.",
        "Use fans or evaporative cooling when temperatures are high.",
        "Provide enough fresh drinking water.",
        "Reduce stocking density where possible.",
        "Spray the floor or roof of the house during hot weather.",
        "Monitor temperature and humidity regularly, especially around midday.",
        "Act immediately if the share of moderate or severe stress increases.",
    ];

    pub fn from_value(value: f64) -> Self {
        Self::BANDS
            .iter()
            .find(|(lower, _)| value >= *lower)
            .map(|(_, category)| *category)
            .unwrap_or(ThiCategory::Safe)
    }

    pub fn label(self) -> &'static str {
        match self {
            ThiCategory::Severe => "Severe Stress",
            ThiCategory::Moderate => "Moderate Stress",
            ThiCategory::Caution => "Caution (Mild Stress)",
            ThiCategory::Safe => "Safe (Normal)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

// ── WCI policy table ────────────────────────────────────────────────────────

/// Cold-stress band of a WCI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WciCategory {
    ChillRisk,
    FairlyCold,
    Safe,
}

impl WciCategory {
    /// Most severe first.
    pub const ALL: [WciCategory; 3] = [
        WciCategory::ChillRisk,
        WciCategory::FairlyCold,
        WciCategory::Safe,
    ];

    /// Inclusive lower bounds, highest first.
    pub const BANDS: [(f64, WciCategory); 3] = [
        (27.0, WciCategory::Safe),
        (24.0, WciCategory::FairlyCold),
        (f64::NEG_INFINITY, WciCategory::ChillRisk),
    ];

    pub const ADVICE: [&'static str; 5] = [
        "Close gaps in the house during strong wind or at night.",
        "Add curtains or windbreaks on open sides of the house.",
        "Keep birds out of direct exposure to strong wind.",
        "Provide supplementary heating when temperature and wind chill are very low.",
        "Monitor wind speed and temperature regularly, especially in extreme weather.",
    ];

    pub fn from_value(value: f64) -> Self {
        Self::BANDS
            .iter()
            .find(|(lower, _)| value >= *lower)
            .map(|(_, category)| *category)
            .unwrap_or(WciCategory::ChillRisk)
    }

    pub fn label(self) -> &'static str {
        match self {
            WciCategory::ChillRisk => "Chill Risk (High Wind Chill)",
            WciCategory::FairlyCold => "Fairly Cold (Caution)",
            WciCategory::Safe => "Safe (Normal)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

// ── Derivation over aligned tables ──────────────────────────────────────────

/// Which stress index to derive from an aligned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKind {
    Thi,
    Wci,
}

impl IndexKind {
    pub const ALL: [IndexKind; 2] = [IndexKind::Thi, IndexKind::Wci];

    /// Categories that must be aligned (left, right) to compute this index.
    pub fn inputs(self) -> (Category, Category) {
        match self {
            IndexKind::Thi => (Category::Temperature, Category::Humidity),
            IndexKind::Wci => (Category::Temperature, Category::Wind),
        }
    }

    pub fn value_column(self) -> &'static str {
        match self {
            IndexKind::Thi => derived::THI,
            IndexKind::Wci => derived::WCI,
        }
    }

    pub fn category_column(self) -> &'static str {
        match self {
            IndexKind::Thi => derived::THI_CATEGORY,
            IndexKind::Wci => derived::WCI_CATEGORY,
        }
    }

    pub fn compute(self, temperature: f64, other: f64) -> f64 {
        match self {
            IndexKind::Thi => thi(temperature, other),
            IndexKind::Wci => wci(temperature, other),
        }
    }

    /// Standing prevention advice shown next to this index.
    pub fn advice(self) -> &'static [&'static str] {
        match self {
            IndexKind::Thi => &ThiCategory::ADVICE,
            IndexKind::Wci => &WciCategory::ADVICE,
        }
    }

    pub fn label(self, value: f64) -> &'static str {
        match self {
            IndexKind::Thi => ThiCategory::from_value(value).label(),
            IndexKind::Wci => WciCategory::from_value(value).label(),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexKind::Thi => "THI",
            IndexKind::Wci => "WCI",
        })
    }
}

/// Attach the index value and its category label to every aligned row.
///
/// Source columns are left untouched. A null or NaN in either value column
/// fails the whole table with [`ClimateError::NonNumeric`].
pub fn derive(kind: IndexKind, aligned: &AlignedTable) -> Result<DataFrame, ClimateError> {
    let (left, right) = kind.inputs();
    if (aligned.left(), aligned.right()) != (left, right) {
        return Err(ClimateError::InvalidData(format!(
            "{kind} needs {left}/{right} alignment, got {}/{}",
            aligned.left(),
            aligned.right()
        )));
    }

    let frame = aligned.frame();
    let temperature = numeric(frame, &aligned.value_column(left))?;
    let other = numeric(frame, &aligned.value_column(right))?;

    let values: Vec<f64> = temperature
        .into_no_null_iter()
        .zip(other.into_no_null_iter())
        .map(|(t, x)| kind.compute(t, x))
        .collect();
    let labels: Vec<&str> = values.iter().map(|v| kind.label(*v)).collect();

    let mut out = frame.clone();
    out.with_column(Column::new(kind.value_column().into(), values))?;
    out.with_column(Column::new(kind.category_column().into(), labels))?;
    Ok(out)
}

pub fn derive_thi(aligned: &AlignedTable) -> Result<DataFrame, ClimateError> {
    derive(IndexKind::Thi, aligned)
}

pub fn derive_wci(aligned: &AlignedTable) -> Result<DataFrame, ClimateError> {
    derive(IndexKind::Wci, aligned)
}

fn numeric<'a>(frame: &'a DataFrame, column: &str) -> Result<&'a Float64Chunked, ClimateError> {
    let values = frame
        .column(column)
        .map_err(|_| ClimateError::MissingColumn(column.to_string()))?
        .f64()?;

    let bad = values
        .into_iter()
        .filter(|v| v.map_or(true, f64::is_nan))
        .count();
    if bad > 0 {
        return Err(ClimateError::NonNumeric {
            column: column.to_string(),
            rows: bad,
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::align::align;
    use crate::extract::extract;
    use crate::test_helpers::{floats, readings, strings};

    #[test]
    fn test_thi_reference_value() {
        assert_relative_eq!(thi(20.0, 50.0), 18.4875, epsilon = 1e-9);
        assert_eq!(ThiCategory::from_value(thi(20.0, 50.0)), ThiCategory::Safe);
    }

    #[test]
    fn test_thi_bands_are_lower_bound_inclusive() {
        assert_eq!(ThiCategory::from_value(26.999), ThiCategory::Safe);
        assert_eq!(ThiCategory::from_value(27.0), ThiCategory::Caution);
        assert_eq!(ThiCategory::from_value(28.0), ThiCategory::Moderate);
        assert_eq!(ThiCategory::from_value(29.99), ThiCategory::Moderate);
        assert_eq!(ThiCategory::from_value(30.0), ThiCategory::Severe);
    }

    #[test]
    fn test_wci_bands() {
        assert_eq!(WciCategory::from_value(wci(30.0, 10.0)), WciCategory::ChillRisk);
        assert_relative_eq!(wci(30.0, 5.0), 26.5);
        assert_eq!(WciCategory::from_value(wci(30.0, 5.0)), WciCategory::FairlyCold);
        assert_eq!(WciCategory::from_value(wci(30.0, 0.0)), WciCategory::Safe);
        assert_eq!(WciCategory::from_value(24.0), WciCategory::FairlyCold);
        assert_eq!(WciCategory::from_value(27.0), WciCategory::Safe);
    }

    #[test]
    fn test_labels_round_trip_through_policy_tables() {
        for category in ThiCategory::ALL {
            assert_eq!(ThiCategory::from_label(category.label()), Some(category));
        }
        for category in WciCategory::ALL {
            assert_eq!(WciCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(ThiCategory::from_label("Stress"), None);
    }

    #[test]
    fn test_each_index_has_its_own_advice() {
        assert_eq!(IndexKind::Thi.advice().len(), 7);
        assert_eq!(IndexKind::Wci.advice().len(), 5);
        assert!(IndexKind::Wci.advice().iter().any(|line| line.contains("wind")));
    }

    #[test]
    fn test_derive_thi_attaches_value_and_label() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "temp_1", 20.0, "C"),
            ("2024-05-01 08:00:00", "humidity_1", 50.0, "%"),
            ("2024-05-01 12:00:00", "temp_1", 34.0, "C"),
            ("2024-05-01 12:00:00", "humidity_1", 80.0, "%"),
        ]);
        let temp = extract(&df, Category::Temperature).unwrap();
        let hum = extract(&df, Category::Humidity).unwrap();
        let aligned = align(&temp, &hum).unwrap();

        let out = derive_thi(&aligned).unwrap();
        let values = floats(&out, derived::THI);
        assert_relative_eq!(values[0], 18.4875, epsilon = 1e-9);
        // 34 - (0.55 - 0.44) * 19.5 = 31.855
        assert_relative_eq!(values[1], 31.855, epsilon = 1e-9);
        assert_eq!(
            strings(&out, derived::THI_CATEGORY),
            vec!["Safe (Normal)", "Severe Stress"]
        );
        assert_eq!(floats(&out, "value_calibration_temp"), vec![20.0, 34.0]);
    }

    #[test]
    fn test_derive_rejects_mismatched_alignment() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "temp_1", 20.0, "C"),
            ("2024-05-01 08:00:00", "wind_1", 2.0, "m/s"),
        ]);
        let temp = extract(&df, Category::Temperature).unwrap();
        let wind = extract(&df, Category::Wind).unwrap();
        let aligned = align(&temp, &wind).unwrap();

        assert!(matches!(derive_thi(&aligned), Err(ClimateError::InvalidData(_))));
        assert!(derive_wci(&aligned).is_ok());
    }

    #[test]
    fn test_derive_fails_on_non_numeric_value() {
        let df = readings(&[
            ("2024-05-01 08:00:00", "temp_1", f64::NAN, "C"),
            ("2024-05-01 08:00:00", "wind_1", 2.0, "m/s"),
        ]);
        let temp = extract(&df, Category::Temperature).unwrap();
        let wind = extract(&df, Category::Wind).unwrap();
        let aligned = align(&temp, &wind).unwrap();

        match derive_wci(&aligned) {
            Err(ClimateError::NonNumeric { column, rows }) => {
                assert_eq!(column, "value_calibration_temp");
                assert_eq!(rows, 1);
            }
            other => panic!("expected non-numeric error, got {other:?}"),
        }
    }
}
