use std::path::PathBuf;

use polars::prelude::DataFrame;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict, PyModule};
use pyo3_polars::PyDataFrame;

use crate::cache::ContentCache;
use crate::category::Category;
use crate::io;
use crate::pipeline::{Pipeline, PipelineConfig, DEFAULT_TIMESTAMP_FORMAT};
use crate::schema;

#[pyclass]
pub struct ClimateModel {
    base_path: PathBuf,
    uploads: ContentCache<DataFrame>,
}

#[pymethods]
impl ClimateModel {
    #[new]
    #[pyo3(signature = (base_path = "."))]
    fn new(base_path: &str) -> Self {
        Self {
            base_path: PathBuf::from(base_path),
            uploads: ContentCache::new(),
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load a CSV file (relative to the base path) with all columns as strings.
    fn load_csv(&self, filename: &str) -> PyResult<PyDataFrame> {
        let df = io::read_csv_path(self.base_path.join(filename))?;
        Ok(PyDataFrame(df))
    }

    /// Parse uploaded CSV bytes. Identical content is parsed only once.
    fn load_bytes(&mut self, data: &[u8]) -> PyResult<PyDataFrame> {
        let df = self.uploads.get_or_try_insert_with(data, io::read_csv_bytes)?;
        Ok(PyDataFrame(df))
    }

    // ── Pipeline ────────────────────────────────────────────────────────────

    /// Run classification, alignment, indices and fusion over a reading table.
    ///
    /// Returns a dict with one DataFrame per enabled category (`temperature`,
    /// `humidity`, `wind`), `temperature_humidity`, `thi` / `wci` with their
    /// `_summary`, `_counts`, `_path` and `_advice` entries, `combined` with
    /// `combined_summary` and `combined_counts`, and `failures`.
    ///
    /// Pass `timestamp_format=None` to keep a textual `record_datetime` as is.
    #[pyo3(signature = (
        df,
        temperature = true,
        humidity = true,
        wind = true,
        timestamp_format = Some(DEFAULT_TIMESTAMP_FORMAT),
    ))]
    fn run<'py>(
        &self,
        py: Python<'py>,
        df: PyDataFrame,
        temperature: bool,
        humidity: bool,
        wind: bool,
        timestamp_format: Option<&str>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let enabled = [
            (Category::Temperature, temperature),
            (Category::Humidity, humidity),
            (Category::Wind, wind),
        ]
        .into_iter()
        .filter(|(_, on)| *on)
        .map(|(category, _)| category);

        let config = PipelineConfig::default()
            .with_enabled(enabled)
            .with_timestamp_format(timestamp_format);
        let output = Pipeline::new(config).run(df.0)?;

        let result = PyDict::new(py);
        for (category, table) in &output.categories {
            result.set_item(
                category.as_str().to_lowercase(),
                PyDataFrame(table.frame().clone()),
            )?;
        }
        if let Some(stacked) = output.temperature_humidity {
            result.set_item("temperature_humidity", PyDataFrame(stacked))?;
        }
        for (kind, table) in output.indices {
            let key = kind.value_column();
            result.set_item(key, PyDataFrame(table.frame))?;
            result.set_item(format!("{key}_summary"), table.summary.narrative)?;
            result.set_item(format!("{key}_counts"), table.summary.counts)?;
            result.set_item(format!("{key}_path"), table.path.to_string())?;
            result.set_item(format!("{key}_advice"), table.advice.to_vec())?;
        }
        if let Some(combined) = output.combined {
            result.set_item("combined", PyDataFrame(combined.frame))?;
            result.set_item("combined_summary", combined.summary.narrative)?;
            result.set_item("combined_counts", combined.summary.counts)?;
        }

        let failures: Vec<String> = output
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.product, f.error))
            .collect();
        result.set_item("failures", failures)?;

        Ok(result)
    }

    // ── Export ──────────────────────────────────────────────────────────────

    /// Serialize a DataFrame to CSV bytes.
    #[staticmethod]
    fn export_csv<'py>(py: Python<'py>, df: PyDataFrame) -> PyResult<Bound<'py, PyBytes>> {
        let bytes = io::write_csv_bytes(&df.0)?;
        Ok(PyBytes::new(py, &bytes))
    }

    // ── Cache ───────────────────────────────────────────────────────────────

    #[getter]
    fn cached_uploads(&self) -> usize {
        self.uploads.len()
    }

    fn clear_cache(&mut self) {
        self.uploads.clear();
    }
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Reading
    let reading = PyModule::new(m.py(), "reading")?;
    reading.add("RECORD_DATETIME", schema::reading::RECORD_DATETIME)?;
    reading.add("SENSOR_NAME", schema::reading::SENSOR_NAME)?;
    reading.add("VALUE_CALIBRATION", schema::reading::VALUE_CALIBRATION)?;
    reading.add("SENSOR_UNIT", schema::reading::SENSOR_UNIT)?;
    reading.add("REQUIRED", schema::reading::REQUIRED.to_vec())?;
    m.add_submodule(&reading)?;

    // Derived indices
    let derived = PyModule::new(m.py(), "derived")?;
    derived.add("THI", schema::derived::THI)?;
    derived.add("THI_CATEGORY", schema::derived::THI_CATEGORY)?;
    derived.add("WCI", schema::derived::WCI)?;
    derived.add("WCI_CATEGORY", schema::derived::WCI_CATEGORY)?;
    m.add_submodule(&derived)?;

    // Combined risk
    let combined = PyModule::new(m.py(), "combined")?;
    combined.add("RISK_TIER", schema::combined::RISK_TIER)?;
    combined.add("RECOMMENDATION", schema::combined::RECOMMENDATION)?;
    m.add_submodule(&combined)?;

    Ok(())
}

#[pymodule]
fn barn_climate(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ClimateModel>()?;
    add_schema_exports(m)?;
    Ok(())
}
