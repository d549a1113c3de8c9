use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Shipment, ShipmentId};

pub const GENERATE_RCA_REPORT_ACTION: &str = "generate_rca_report";

/// Acknowledgement used when the engine answers 2xx without a usable
/// `report` or `message` field.
pub const REPORT_ACK_BOILERPLATE: &str =
    "The workflow engine accepted the analysis request but returned no report body.";

/// Outbound body POSTed to the workflow-automation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReportRequest {
    pub action: String,
    pub shipment_id: ShipmentId,
    pub shipment_data: Shipment,
    pub timestamp: DateTime<Utc>,
}

impl GenerateReportRequest {
    pub fn new(shipment: Shipment, timestamp: DateTime<Utc>) -> Self {
        Self {
            action: GENERATE_RCA_REPORT_ACTION.to_string(),
            shipment_id: shipment.shipment_id.clone(),
            shipment_data: shipment,
            timestamp,
        }
    }
}

/// Engine response. Both fields are optional on the wire; anything that does
/// not parse as this shape collapses to `Self::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateReportResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GenerateReportResponse {
    /// First non-empty of `report` then `message`, falling back to the
    /// boilerplate acknowledgement.
    pub fn report_text(&self) -> String {
        [self.report.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
            .unwrap_or(REPORT_ACK_BOILERPLATE)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShipmentId;

    fn sample_shipment() -> Shipment {
        Shipment {
            shipment_id: ShipmentId::from("S1"),
            delay_minutes: 45,
            planned_arrival_time: "2024-01-01 10:00".to_string(),
            root_cause: None,
        }
    }

    #[test]
    fn request_carries_action_and_full_shipment_record() {
        let request = GenerateReportRequest::new(sample_shipment(), Utc::now());
        let value = serde_json::to_value(&request).expect("serialize request");
        assert_eq!(value["action"], GENERATE_RCA_REPORT_ACTION);
        assert_eq!(value["shipment_id"], "S1");
        assert_eq!(value["shipment_data"]["delay_minutes"], 45);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn report_field_wins_over_message() {
        let response = GenerateReportResponse {
            report: Some("from report".to_string()),
            message: Some("from message".to_string()),
        };
        assert_eq!(response.report_text(), "from report");
    }

    #[test]
    fn empty_report_falls_through_to_message() {
        let response = GenerateReportResponse {
            report: Some("   ".to_string()),
            message: Some("from message".to_string()),
        };
        assert_eq!(response.report_text(), "from message");
    }

    #[test]
    fn missing_fields_yield_boilerplate() {
        assert_eq!(
            GenerateReportResponse::default().report_text(),
            REPORT_ACK_BOILERPLATE
        );
    }

    #[test]
    fn unknown_response_fields_are_ignored() {
        let response: GenerateReportResponse =
            serde_json::from_str(r#"{"report":"X","workflow_run_id":42}"#).expect("parse");
        assert_eq!(response.report_text(), "X");
    }
}
