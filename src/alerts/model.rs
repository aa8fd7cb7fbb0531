//! Alert table rows

/// Flood threshold for one location/parameter pair; the id is assigned by
/// the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlertThreshold {
    pub location_name: String,
    pub parameter: String,
    pub threshold_value: f64,
    pub is_active: bool,
}

impl NewAlertThreshold {
    pub fn new(location_name: impl Into<String>, parameter: impl Into<String>, threshold_value: f64) -> Self {
        Self {
            location_name: location_name.into(),
            parameter: parameter.into(),
            threshold_value,
            is_active: true,
        }
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Row inserted into an empty store at startup (discharge in m³/s)
    pub fn seed() -> Self {
        Self::new("Rajaram Bridge", "FLOW", 50_000.0)
    }
}

/// A triggered alert. The timestamp and `is_resolved = false` are assigned
/// by the database on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlertLog {
    pub location_name: String,
    pub parameter: String,
    pub triggered_value: f64,
    pub threshold_value: f64,
    pub log_message: String,
}

impl NewAlertLog {
    /// Fixed simulated exceedance used by the placeholder trigger
    pub fn placeholder() -> Self {
        Self {
            location_name: "Rajaram Bridge".to_string(),
            parameter: "FLOW".to_string(),
            triggered_value: 99_999.99,
            threshold_value: 50_000.0,
            log_message: "Simulated alert triggered for testing purposes.".to_string(),
        }
    }
}
