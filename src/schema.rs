//! Column-name constants for barn-climate tables.
//! Single source of truth - exported to Python via PyO3 when the
//! `python` feature is enabled.

// ── Reading columns (uploaded table) ────────────────────────────────────────
pub mod reading {
    pub const RECORD_DATETIME: &str = "record_datetime";
    pub const SENSOR_NAME: &str = "sensor_name";
    pub const VALUE_CALIBRATION: &str = "value_calibration";
    pub const SENSOR_UNIT: &str = "sensor_unit";

    pub const REQUIRED: [&str; 4] = [RECORD_DATETIME, SENSOR_NAME, VALUE_CALIBRATION, SENSOR_UNIT];

    /// Join keys shared by the strict alignment and the THI x WCI fusion join.
    pub const KEY: [&str; 2] = [RECORD_DATETIME, SENSOR_NAME];
}

// ── Derived index columns ───────────────────────────────────────────────────
pub mod derived {
    pub const THI: &str = "thi";
    pub const THI_CATEGORY: &str = "thi_category";
    pub const WCI: &str = "wci";
    pub const WCI_CATEGORY: &str = "wci_category";
}

// ── Combined risk columns ───────────────────────────────────────────────────
pub mod combined {
    pub const RISK_TIER: &str = "risk_tier";
    pub const RECOMMENDATION: &str = "recommendation";
}

/// `value_calibration` -> `value_calibration_temp` etc.
pub fn suffixed(column: &str, suffix: &str) -> String {
    format!("{column}_{suffix}")
}
