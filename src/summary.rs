use std::collections::HashMap;

use polars::prelude::*;

use crate::error::ClimateError;
use crate::index::{ThiCategory, WciCategory};
use crate::risk::RiskTier;

/// A closed set of category labels that can be summarized.
pub trait Interpretation: Copy + 'static {
    /// Every category, most severe first.
    const ORDER: &'static [Self];

    fn label(self) -> &'static str;

    /// One narrative sentence for `count` rows out of `total`.
    fn sentence(self, count: usize, total: usize) -> String;
}

/// Share of `count` in `total`, in percent, rounded to one decimal.
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

impl Interpretation for ThiCategory {
    const ORDER: &'static [Self] = &ThiCategory::ALL;

    fn label(self) -> &'static str {
        ThiCategory::label(self)
    }

    fn sentence(self, count: usize, total: usize) -> String {
        let p = percent(count, total);
        match self {
            ThiCategory::Severe => format!(
                "{count} reading(s) ({p:.1}%) show SEVERE STRESS. Take immediate environmental remediation!"
            ),
            ThiCategory::Moderate => format!(
                "{count} reading(s) ({p:.1}%) show MODERATE STRESS. Improve ventilation and temperature management!"
            ),
            ThiCategory::Caution => format!(
                "{count} reading(s) ({p:.1}%) are in CAUTION (MILD STRESS). Monitor housing conditions regularly."
            ),
            ThiCategory::Safe => {
                format!("Most readings ({count}/{total}) are SAFE (NORMAL).")
            }
        }
    }
}

impl Interpretation for WciCategory {
    const ORDER: &'static [Self] = &WciCategory::ALL;

    fn label(self) -> &'static str {
        WciCategory::label(self)
    }

    fn sentence(self, count: usize, total: usize) -> String {
        let p = percent(count, total);
        match self {
            WciCategory::ChillRisk => format!(
                "{count} reading(s) ({p:.1}%) are at risk of chilling from high wind chill."
            ),
            WciCategory::FairlyCold => {
                format!("{count} reading(s) ({p:.1}%) are fairly cold; stay alert.")
            }
            WciCategory::Safe => {
                format!("Most readings ({count}/{total}) are safe from wind chill.")
            }
        }
    }
}

impl Interpretation for RiskTier {
    const ORDER: &'static [Self] = &RiskTier::ALL;

    fn label(self) -> &'static str {
        RiskTier::label(self)
    }

    fn sentence(self, count: usize, total: usize) -> String {
        let p = percent(count, total);
        match self {
            RiskTier::High => format!(
                "{count} reading(s) ({p:.1}%) are HIGH RISK: {}.",
                self.recommendation()
            ),
            RiskTier::Caution => format!(
                "{count} reading(s) ({p:.1}%) call for CAUTION: {}.",
                self.recommendation()
            ),
            RiskTier::Safe => format!(
                "Most readings ({count}/{total}) are SAFE: {}.",
                self.recommendation()
            ),
        }
    }
}

/// Category counts and narrative text for one derived table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub counts: HashMap<String, usize>,
    pub narrative: String,
}

impl Summary {
    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn percentages(&self) -> HashMap<String, f64> {
        self.counts
            .iter()
            .map(|(label, count)| (label.clone(), percent(*count, self.total)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Count the labels in `column` and write one sentence per non-zero
/// category, most severe first. Null labels are not counted.
pub fn summarize<C: Interpretation>(df: &DataFrame, column: &str) -> Result<Summary, ClimateError> {
    let labels = df.column(column)?.str()?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels.into_iter().flatten() {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();

    let narrative = C::ORDER
        .iter()
        .filter_map(|category| {
            let count = counts.get(category.label()).copied().unwrap_or(0);
            (count > 0).then(|| category.sentence(count, total))
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Summary {
        total,
        counts,
        narrative,
    })
}
