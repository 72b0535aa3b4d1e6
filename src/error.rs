use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClimateError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Non-numeric value in column {column}: {rows} row(s)")]
    NonNumeric { column: String, rows: usize },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("InvalidData: {0}")]
    InvalidData(String),

    #[error("{0}")]
    General(String),
}

#[cfg(feature = "python")]
impl From<ClimateError> for pyo3::PyErr {
    fn from(err: ClimateError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<pyo3::PyErr> for ClimateError {
    fn from(err: pyo3::PyErr) -> Self {
        ClimateError::General(err.to_string())
    }
}
