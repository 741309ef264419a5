use crate::model::{ScanReport, Severity};
use anyhow::Result;
use std::fmt::Write as _;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Root")]
    root: String,
    #[tabled(rename = "Path")]
    path: String,
}

#[derive(Tabled)]
struct RootRow {
    #[tabled(rename = "Root")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Path")]
    path: String,
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    print!("{}", render_table(report, true));
    Ok(())
}

/// Renders the human-readable report. `color` adds ANSI severity colors.
pub fn render_table(report: &ScanReport, color: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Scan completed at: {}",
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "Threat intel: {} packages ({} all versions), CSV from {}, JSON from {}",
        report.intel.entries,
        report.intel.wildcard_entries,
        report.intel.csv_origin.as_str(),
        report.intel.json_origin.as_str()
    );
    let _ = writeln!(out);

    let roots: Vec<RootRow> = report
        .roots
        .iter()
        .map(|r| RootRow {
            label: r.label.clone(),
            kind: r.kind.display_name().to_string(),
            path: r.path.display().to_string(),
        })
        .collect();
    let _ = writeln!(out, "Scanned {} locations:", roots.len());
    let _ = writeln!(out, "{}", Table::new(roots).with(Style::rounded()));

    let _ = writeln!(out);
    if report.findings.is_empty() {
        let _ = writeln!(out, "No findings.");
    } else {
        let _ = writeln!(out, "Found {} findings:", report.findings.len());
        let _ = writeln!(out);

        let rows: Vec<FindingRow> = report
            .findings
            .iter()
            .map(|f| FindingRow {
                severity: format_severity(f.severity(), color),
                kind: f.kind().to_string(),
                package: truncate(f.package(), 40),
                version: f.version().unwrap_or("-").to_string(),
                root: f.root().to_string(),
                path: truncate_left(&f.path().display().to_string(), 60),
            })
            .collect();
        let _ = writeln!(out, "{}", Table::new(rows).with(Style::rounded()));
    }

    let _ = writeln!(out);
    write_summary(&mut out, report, color);
    out
}

fn write_summary(out: &mut String, report: &ScanReport, color: bool) {
    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "  Packages checked: {}", report.packages_checked);
    let _ = writeln!(
        out,
        "  Findings: {} critical, {} high, {} warning, {} info",
        report.count(Severity::Critical),
        report.count(Severity::High),
        report.count(Severity::Warning),
        report.count(Severity::Info)
    );
    let _ = writeln!(out);

    let verdict = if report.count(Severity::Critical) + report.count(Severity::High) > 0 {
        paint("COMPROMISED: remove the flagged packages and rotate credentials", "31", color)
    } else if report.is_compromised() {
        paint("SUSPICIOUS: review the flagged directories", "33", color)
    } else {
        paint("CLEAN: no compromised packages found", "32", color)
    };
    let _ = writeln!(out, "{}", verdict);
}

fn format_severity(severity: Severity, color: bool) -> String {
    let code = match severity {
        Severity::Critical => "31",
        Severity::High => "91",
        Severity::Warning => "33",
        Severity::Info => return severity.to_string(),
    };
    paint(severity.as_str(), code, color)
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

/// Keeps the end of long paths, where the package and file names are.
fn truncate_left(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(len - (max_len - 3)).collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_render_without_color() {
        let text = render_table(&fixtures::report(), false);

        assert!(text.contains("Scan completed at: 2025-11-24 12:00:00 UTC"));
        assert!(text.contains("CSV from network, JSON from offline snapshot"));
        assert!(text.contains("@scope/evil"));
        assert!(text.contains("WILDCARD_LOCK_HIT"));
        assert!(text.contains("0 critical, 1 high, 1 warning, 0 info"));
        assert!(text.contains("COMPROMISED"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_render_clean_report() {
        let mut report = fixtures::report();
        report.findings.clear();
        let text = render_table(&report, true);

        assert!(text.contains("No findings."));
        assert!(text.contains("CLEAN"));
    }

    #[test]
    fn test_format_severity_colors() {
        assert_eq!(format_severity(Severity::Critical, true), "\x1b[31mCRITICAL\x1b[0m");
        assert_eq!(format_severity(Severity::Info, true), "INFO");
        assert_eq!(format_severity(Severity::High, false), "HIGH");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate_left("/a/b/c/d/e/f", 8), "...d/e/f");
        assert_eq!(truncate_left("/a/b", 8), "/a/b");
    }
}
