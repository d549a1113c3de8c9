use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{GenerateReportRequest, GenerateReportResponse};

/// Outbound seam to the workflow-automation engine. The controller issues at
/// most one call per analysis request and never retries through this trait.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn generate_report(
        &self,
        request: &GenerateReportRequest,
    ) -> Result<GenerateReportResponse>;
}

/// Stand-in when no engine endpoint is configured: every call errors, so
/// every analysis resolves with a synthesized report.
pub struct MissingAnalysisEngine;

#[async_trait]
impl AnalysisEngine for MissingAnalysisEngine {
    async fn generate_report(
        &self,
        request: &GenerateReportRequest,
    ) -> Result<GenerateReportResponse> {
        Err(anyhow!(
            "analysis engine endpoint is not configured (shipment {})",
            request.shipment_id
        ))
    }
}

pub struct HttpAnalysisEngine {
    http: Client,
    endpoint_url: String,
}

impl HttpAnalysisEngine {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint_url: endpoint_url.into(),
        }
    }
}

#[async_trait]
impl AnalysisEngine for HttpAnalysisEngine {
    async fn generate_report(
        &self,
        request: &GenerateReportRequest,
    ) -> Result<GenerateReportResponse> {
        let body = self
            .http
            .post(&self.endpoint_url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        // Any 2xx body that is not the expected shape counts as a success
        // with no report text.
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }
}
