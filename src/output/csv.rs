use crate::model::ScanReport;
use anyhow::{anyhow, Context, Result};

const HEADER: [&str; 6] = ["type", "severity", "package", "version", "path", "root"];

pub fn print_csv(report: &ScanReport) -> Result<()> {
    print!("{}", generate_csv_string(report)?);
    Ok(())
}

/// One row per finding, in report order. Quoting follows RFC 4180.
pub fn generate_csv_string(report: &ScanReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for finding in &report.findings {
        let path = finding.path().to_string_lossy().into_owned();
        writer.write_record([
            finding.kind().as_str(),
            finding.severity().as_str(),
            finding.package(),
            finding.version().unwrap_or(""),
            path.as_str(),
            finding.root(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_csv_rows() {
        let text = generate_csv_string(&fixtures::report()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "type,severity,package,version,path,root");
        assert_eq!(
            lines[1],
            "WILDCARD_LOCK_HIT,HIGH,@scope/evil,1.0.0,/work/app/yarn.lock,project"
        );
        assert_eq!(
            lines[2],
            r#"GHOST_PACKAGE,WARNING,"ghost, ""quoted""",,/work/app/node_modules/ghost,project"#
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_parses_back() {
        let text = generate_csv_string(&fixtures::report()).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let packages: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[2].to_string())
            .collect();

        assert_eq!(packages, vec!["@scope/evil", "ghost, \"quoted\""]);
    }
}
