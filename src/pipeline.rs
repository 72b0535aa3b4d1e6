use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use polars::prelude::*;

use crate::align::{align, AlignedTable, JoinPath};
use crate::category::Category;
use crate::error::ClimateError;
use crate::extract::{extract, normalize, stack, CategoryTable};
use crate::index::{derive, IndexKind, ThiCategory, WciCategory};
use crate::risk::{combine, RiskTier};
use crate::schema::combined;
use crate::summary::{summarize, Summary};

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Categories to extract; derived products need all of their inputs.
    pub enabled: BTreeSet<Category>,
    /// strptime format tried first for a textual `record_datetime`; values
    /// that do not match are parsed with an inferred format. `None` keeps text.
    pub timestamp_format: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: Category::ALL.into_iter().collect(),
            timestamp_format: Some(DEFAULT_TIMESTAMP_FORMAT.to_string()),
        }
    }
}

impl PipelineConfig {
    pub fn with_enabled(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.enabled = categories.into_iter().collect();
        self
    }

    pub fn with_timestamp_format(mut self, format: Option<&str>) -> Self {
        self.timestamp_format = format.map(str::to_string);
        self
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        self.enabled.contains(&category)
    }
}

/// A derived output that can fail independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    Index(IndexKind),
    Combined,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Product::Index(kind) => write!(f, "{kind} table"),
            Product::Combined => f.write_str("combined THI/WCI table"),
        }
    }
}

#[derive(Debug)]
pub struct ProductFailure {
    pub product: Product,
    pub error: ClimateError,
}

/// THI or WCI table with its alignment path and summary.
#[derive(Debug, Clone)]
pub struct IndexTable {
    pub kind: IndexKind,
    pub path: JoinPath,
    pub frame: DataFrame,
    pub summary: Summary,
    pub advice: &'static [&'static str],
}

/// THI and WCI joined per row with the fused risk tier.
#[derive(Debug, Clone)]
pub struct CombinedTable {
    pub frame: DataFrame,
    pub summary: Summary,
}

/// Everything one run produced. Missing products were either disabled,
/// empty, or listed in `failures`.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub categories: BTreeMap<Category, CategoryTable>,
    /// Temperature and humidity readings stacked into one sorted table.
    pub temperature_humidity: Option<DataFrame>,
    pub indices: BTreeMap<IndexKind, IndexTable>,
    pub combined: Option<CombinedTable>,
    pub failures: Vec<ProductFailure>,
}

impl PipelineOutput {
    pub fn category(&self, category: Category) -> Option<&CategoryTable> {
        self.categories.get(&category)
    }

    pub fn thi(&self) -> Option<&IndexTable> {
        self.indices.get(&IndexKind::Thi)
    }

    pub fn wci(&self) -> Option<&IndexTable> {
        self.indices.get(&IndexKind::Wci)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Classification -> extraction -> alignment -> indices -> fusion -> summaries.
///
/// Stateless: each call works on its own copy of every intermediate table.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline over an uploaded table.
    ///
    /// Input errors (missing columns, unparseable timestamps) fail the run.
    /// A derived product that fails is recorded in `failures` and the
    /// remaining products are still built.
    pub fn run(&self, df: DataFrame) -> Result<PipelineOutput, ClimateError> {
        let df = normalize(df, self.config.timestamp_format.as_deref())?;
        log::debug!("normalized input: {:?}", df.shape());

        let mut output = PipelineOutput::default();

        for category in Category::ALL {
            if self.config.is_enabled(category) {
                let table = extract(&df, category)?;
                log::info!("{category}: {} reading(s)", table.height());
                output.categories.insert(category, table);
            }
        }

        if let (Some(temp), Some(hum)) = (
            nonempty(&output, Category::Temperature),
            nonempty(&output, Category::Humidity),
        ) {
            output.temperature_humidity = Some(stack(temp, hum)?);
        }

        for kind in IndexKind::ALL {
            let (left, right) = kind.inputs();
            let (Some(left), Some(right)) = (nonempty(&output, left), nonempty(&output, right))
            else {
                log::info!("{kind}: inputs disabled or empty, skipped");
                continue;
            };

            let aligned = align(left, right)?;
            if aligned.is_empty() {
                log::info!("{kind}: no temporal overlap, skipped");
                continue;
            }

            match index_table(kind, &aligned) {
                Ok(table) => {
                    output.indices.insert(kind, table);
                }
                Err(error) => {
                    log::warn!("{kind}: {error}");
                    output.failures.push(ProductFailure {
                        product: Product::Index(kind),
                        error,
                    });
                }
            }
        }

        let all_enabled = Category::ALL.iter().all(|c| self.config.is_enabled(*c));
        if all_enabled {
            if let (Some(thi), Some(wci)) = (output.thi(), output.wci()) {
                match combined_table(&thi.frame, &wci.frame) {
                    Ok(Some(table)) => output.combined = Some(table),
                    Ok(None) => log::info!("combined: THI and WCI rows never coincide, skipped"),
                    Err(error) => {
                        log::warn!("combined: {error}");
                        output.failures.push(ProductFailure {
                            product: Product::Combined,
                            error,
                        });
                    }
                }
            }
        }

        Ok(output)
    }
}

fn nonempty(output: &PipelineOutput, category: Category) -> Option<&CategoryTable> {
    output.category(category).filter(|t| !t.is_empty())
}

fn index_table(kind: IndexKind, aligned: &AlignedTable) -> Result<IndexTable, ClimateError> {
    let frame = derive(kind, aligned)?;
    let summary = match kind {
        IndexKind::Thi => summarize::<ThiCategory>(&frame, kind.category_column())?,
        IndexKind::Wci => summarize::<WciCategory>(&frame, kind.category_column())?,
    };
    Ok(IndexTable {
        kind,
        path: aligned.path(),
        frame,
        summary,
        advice: kind.advice(),
    })
}

fn combined_table(thi: &DataFrame, wci: &DataFrame) -> Result<Option<CombinedTable>, ClimateError> {
    let frame = combine(thi, wci)?;
    if frame.height() == 0 {
        return Ok(None);
    }
    let summary = summarize::<RiskTier>(&frame, combined::RISK_TIER)?;
    Ok(Some(CombinedTable { frame, summary }))
}
