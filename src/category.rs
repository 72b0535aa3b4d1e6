use std::fmt;

use polars::prelude::*;

use crate::error::ClimateError;
use crate::schema::reading;

/// Recognized sensor type.
///
/// Derived from `sensor_name`, never stored in the input. A single reading
/// may match several categories; each category is tested independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Temperature,
    Humidity,
    Wind,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Temperature, Category::Humidity, Category::Wind];

    /// Lower-case keywords matched as substrings of the sensor name.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Temperature => &["temp", "temperature"],
            Category::Humidity => &["humidity", "hum"],
            Category::Wind => &["wind"],
        }
    }

    /// Suffix appended to this category's columns after an alignment join.
    pub fn suffix(self) -> &'static str {
        match self {
            Category::Temperature => "temp",
            Category::Humidity => "hum",
            Category::Wind => "wind",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Temperature => "Temperature",
            Category::Humidity => "Humidity",
            Category::Wind => "Wind",
        }
    }

    /// Case-insensitive substring match against this category's keywords.
    pub fn matches(self, sensor_name: &str) -> bool {
        if sensor_name.is_empty() {
            return false;
        }
        let name = sensor_name.to_lowercase();
        self.keywords().iter().any(|kw| name.contains(kw))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-row membership mask for `category`.
///
/// `sensor_name` must already be a string column; null names never match.
pub fn classify(df: &DataFrame, category: Category) -> Result<BooleanChunked, ClimateError> {
    let names = df.column(reading::SENSOR_NAME)?.str()?;
    let mask: BooleanChunked = names
        .into_iter()
        .map(|name| Some(name.is_some_and(|n| category.matches(n))))
        .collect();
    Ok(mask)
}
