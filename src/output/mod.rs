mod cli;
mod csv;
mod json;
mod upload;

pub use self::csv::{generate_csv_string, print_csv};
pub use cli::{print_cli_table, render_table};
pub use json::print_json;
pub use upload::upload_report;

use crate::model::ScanReport;
use anyhow::Result;

/// Output format for scan reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// One row per finding, for spreadsheets and log pipelines
    Csv,
    /// The full report as JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Unknown format: {}. Use 'table', 'csv', or 'json'",
                s
            )),
        }
    }
}

pub fn print_report(report: &ScanReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_cli_table(report),
        OutputFormat::Csv => print_csv(report),
        OutputFormat::Json => print_json(report),
    }
}

/// Format report to string for file output. Tables are written without
/// terminal colors.
pub fn format_report_to_string(report: &ScanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report, false)),
        OutputFormat::Csv => generate_csv_string(report),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::{FeedOrigin, Finding, FindingType, IntelSummary, ScanReport, ScanRoot};
    use chrono::{TimeZone, Utc};

    pub fn report() -> ScanReport {
        ScanReport {
            scan_time: Utc.with_ymd_and_hms(2025, 11, 24, 12, 0, 0).unwrap(),
            roots: vec![ScanRoot::project("/work/app")],
            intel: IntelSummary {
                entries: 2,
                wildcard_entries: 1,
                csv_origin: FeedOrigin::Network,
                json_origin: FeedOrigin::Offline,
            },
            packages_checked: 40,
            findings: vec![
                Finding::new(
                    FindingType::WildcardLockHit,
                    "@scope/evil",
                    Some("1.0.0".to_string()),
                    "/work/app/yarn.lock",
                    "project",
                ),
                Finding::new(
                    FindingType::GhostPackage,
                    "ghost, \"quoted\"",
                    None,
                    "/work/app/node_modules/ghost",
                    "project",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("TABLE").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str("csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_json_string_is_the_report() {
        let text = format_report_to_string(&fixtures::report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["packages_checked"], 40);
        assert_eq!(value["intel"]["json_origin"], "offline");
        assert_eq!(value["findings"][0]["type"], "WILDCARD_LOCK_HIT");
        assert!(value["findings"][1].get("version").is_none());
    }
}
