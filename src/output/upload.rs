use crate::model::ScanReport;
use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::info;

/// POSTs the JSON report to a collection endpoint.
///
/// # Errors
///
/// Returns an error on transport failure, timeout or a non-2xx response.
/// Callers log it; a failed upload never fails the scan.
pub async fn upload_report(url: &str, report: &ScanReport, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("hulud-detect/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .post(url)
        .json(report)
        .send()
        .await
        .with_context(|| format!("failed to upload report to {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("{} rejected the report with HTTP {}", url, status.as_u16());
    }

    info!(url, findings = report.findings.len(), "report uploaded");
    Ok(())
}
