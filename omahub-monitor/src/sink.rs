use crate::error::Result;
use crate::report::PerformanceReport;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs reports as JSON to the analytics endpoint.
#[derive(Clone, Debug)]
pub struct HttpReportSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReportSink {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one report. Non-2xx answers are logged but are not errors.
    ///
    /// # Errors
    ///
    /// Transport failures (connection refused, timeout).
    pub async fn send(&self, report: &PerformanceReport) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            log::debug!("Report delivered to {} ({})", self.endpoint, status);
        } else {
            log::warn!("Analytics endpoint {} answered {}", self.endpoint, status);
        }
        Ok(())
    }
}
