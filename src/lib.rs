//! Environmental stress indices for livestock housing.
//!
//! Sensor readings are classified by name into temperature, humidity and
//! wind tables, aligned by timestamp and sensor, and turned into a
//! Temperature-Humidity Index, a Wind Chill Index and a fused risk tier.

pub mod align;
pub mod cache;
pub mod category;
pub mod error;
pub mod extract;
pub mod index;
pub mod io;
pub mod pipeline;
pub mod risk;
pub mod schema;
pub mod summary;

#[cfg(feature = "python")]
mod python;

#[cfg(test)]
mod test_helpers;

pub use align::{align, AlignedTable, JoinPath};
pub use category::Category;
pub use error::ClimateError;
pub use extract::CategoryTable;
pub use index::{IndexKind, ThiCategory, WciCategory};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput};
pub use risk::{fuse, RiskTier};
pub use summary::Summary;
