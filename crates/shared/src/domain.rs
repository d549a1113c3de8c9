use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque shipment identifier, unique within a loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipmentId(pub String);

impl ShipmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShipmentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One delayed shipment eligible for root-cause analysis.
///
/// Field names match the catalog source document and the outbound
/// `shipment_data` payload verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: ShipmentId,
    pub delay_minutes: u32,
    /// Space-separated date/time string, e.g. `"2024-01-01 10:00"`.
    pub planned_arrival_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
}

impl Shipment {
    /// Date portion of `planned_arrival_time`, truncated at the first space.
    pub fn planned_arrival_date(&self) -> &str {
        match self.planned_arrival_time.split_once(' ') {
            Some((date, _)) => date,
            None => &self.planned_arrival_time,
        }
    }
}

/// Provenance of a finished analysis report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    Remote,
    Synthesized,
}

/// Terminal artifact of one analysis request; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub report_text: String,
    pub source: ReportSource,
}
