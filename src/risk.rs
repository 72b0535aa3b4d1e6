use std::fmt;

use polars::prelude::*;

use crate::category::Category;
use crate::error::ClimateError;
use crate::extract::SORT_KEY;
use crate::index::{ThiCategory, WciCategory};
use crate::schema::{self, combined, derived, reading};

/// Overall housing risk from THI and WCI together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskTier {
    High,
    Caution,
    Safe,
}

impl RiskTier {
    /// Most severe first.
    pub const ALL: [RiskTier; 3] = [RiskTier::High, RiskTier::Caution, RiskTier::Safe];

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::High => "High Risk: immediate environmental remediation",
            RiskTier::Caution => "Caution: monitor and take preventive action",
            RiskTier::Safe => "Safe",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            RiskTier::High => {
                "improve ventilation, add cooling/heating, reduce density, shield from wind"
            }
            RiskTier::Caution => {
                "monitor temperature, humidity, and wind regularly; act preventively"
            }
            RiskTier::Safe => "maintain current housing conditions",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fuse heat and cold stress into one tier. First matching rule wins:
/// any moderate/severe heat stress or high wind chill is high risk, any
/// mild stress or fairly-cold reading is caution, everything else is safe.
pub fn fuse(thi: ThiCategory, wci: WciCategory) -> RiskTier {
    match (thi, wci) {
        (ThiCategory::Severe | ThiCategory::Moderate, _) | (_, WciCategory::ChillRisk) => {
            RiskTier::High
        }
        (ThiCategory::Caution, _) | (_, WciCategory::FairlyCold) => RiskTier::Caution,
        (ThiCategory::Safe, WciCategory::Safe) => RiskTier::Safe,
    }
}

/// Inner-join a THI table and a WCI table on (record_datetime, sensor_name)
/// and attach the fused `risk_tier` and `recommendation` per row.
///
/// Rows present on only one side are dropped. An empty result is valid.
pub fn combine(thi_table: &DataFrame, wci_table: &DataFrame) -> Result<DataFrame, ClimateError> {
    let thi_side = [
        reading::RECORD_DATETIME.to_string(),
        reading::SENSOR_NAME.to_string(),
        schema::suffixed(reading::VALUE_CALIBRATION, Category::Temperature.suffix()),
        schema::suffixed(reading::VALUE_CALIBRATION, Category::Humidity.suffix()),
        derived::THI.to_string(),
        derived::THI_CATEGORY.to_string(),
    ];
    let wci_side = [
        reading::RECORD_DATETIME.to_string(),
        reading::SENSOR_NAME.to_string(),
        schema::suffixed(reading::VALUE_CALIBRATION, Category::Wind.suffix()),
        derived::WCI.to_string(),
        derived::WCI_CATEGORY.to_string(),
    ];

    let keys: Vec<Expr> = reading::KEY.iter().map(|c| col(*c)).collect();
    let joined = thi_table
        .select(thi_side)?
        .lazy()
        .join(
            wci_table.select(wci_side)?.lazy(),
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?
        .sort(SORT_KEY, SortMultipleOptions::default().with_maintain_order(true))?;

    let thi_labels = joined.column(derived::THI_CATEGORY)?.str()?;
    let wci_labels = joined.column(derived::WCI_CATEGORY)?.str()?;

    let mut tiers: Vec<&str> = Vec::with_capacity(joined.height());
    let mut advice: Vec<&str> = Vec::with_capacity(joined.height());
    for (thi_label, wci_label) in thi_labels.into_iter().zip(wci_labels.into_iter()) {
        let thi = thi_label.and_then(ThiCategory::from_label).ok_or_else(|| {
            ClimateError::InvalidData(format!("Unknown THI category: {thi_label:?}"))
        })?;
        let wci = wci_label.and_then(WciCategory::from_label).ok_or_else(|| {
            ClimateError::InvalidData(format!("Unknown WCI category: {wci_label:?}"))
        })?;

        let tier = fuse(thi, wci);
        tiers.push(tier.label());
        advice.push(tier.recommendation());
    }

    let mut out = joined.clone();
    out.with_column(Column::new(combined::RISK_TIER.into(), tiers))?;
    out.with_column(Column::new(combined::RECOMMENDATION.into(), advice))?;
    Ok(out)
}
