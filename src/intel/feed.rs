//! Parsers for the two threat-intel feed formats.
//!
//! - CSV: one package per row, first column is the name. Every row means
//!   "all versions are compromised".
//! - JSON: an object mapping package name to either an array of exact
//!   versions or the sentinel `"*"`.
//!
//! Malformed rows and entries are skipped. Only a JSON body that is not an
//! object at all is reported as an error, so the caller can fall back to the
//! offline snapshot. [`validate`] is stricter and runs on every fetched body
//! before it is cached.

use super::index::IocEntry;
use super::FeedKind;
use crate::error::FeedError;
use serde_json::Value;
use tracing::debug;

const WILDCARD: &str = "*";

/// Parses the CSV feed into wildcard entries.
pub fn parse_csv(body: &str) -> Vec<IocEntry> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(body.as_bytes());

    let mut entries = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                debug!(row, error = %e, "skipping malformed CSV feed row");
                continue;
            }
        };

        let Some(name) = record.get(0).map(|s| s.trim_matches('"')) else {
            continue;
        };

        if name.is_empty() || is_header_cell(name) {
            continue;
        }

        entries.push(IocEntry::wildcard(name));
    }

    entries
}

fn is_header_cell(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("package")
        || cell.eq_ignore_ascii_case("name")
        || cell.eq_ignore_ascii_case("package_name")
}

/// Parses the JSON feed into wildcard or version-keyed entries.
///
/// # Errors
///
/// Returns an error if the body is not a JSON object.
pub fn parse_json(body: &str) -> Result<Vec<IocEntry>, serde_json::Error> {
    let map: serde_json::Map<String, Value> = serde_json::from_str(body)?;

    let mut entries = Vec::with_capacity(map.len());

    for (name, value) in map {
        if name.is_empty() {
            continue;
        }

        match value {
            Value::String(s) if s == WILDCARD => entries.push(IocEntry::wildcard(name)),
            Value::Array(items) => {
                let versions: Vec<String> = items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                        _ => None,
                    })
                    .collect();

                if versions.iter().any(|v| v == WILDCARD) {
                    entries.push(IocEntry::wildcard(name));
                } else if versions.is_empty() {
                    debug!(package = %name, "skipping JSON feed entry with no versions");
                } else {
                    entries.push(IocEntry::versions(name, versions));
                }
            }
            other => {
                debug!(package = %name, value = %other, "skipping malformed JSON feed entry");
            }
        }
    }

    Ok(entries)
}

/// Checks that a fetched body really is a feed of `kind`.
///
/// Error pages served with HTTP 200 (captive portals, CDN interstitials)
/// fail here and are never cached.
pub fn validate(kind: FeedKind, body: &str) -> Result<(), FeedError> {
    match kind {
        FeedKind::Json => {
            parse_json(body)?;
            Ok(())
        }
        FeedKind::Csv => {
            if body.trim_start().starts_with('<') {
                return Err(FeedError::Markup);
            }
            match parse_csv(body).into_iter().find(|e| !is_package_name(&e.name)) {
                Some(bad) => Err(FeedError::BadName { name: bad.name }),
                None => Ok(()),
            }
        }
    }
}

fn is_package_name(name: &str) -> bool {
    !name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '{' | '}' | '"' | '\'' | ';'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_every_row_is_wildcard() {
        let body = "Package,Version\n@asyncapi/specs,= 6.8.2\nposthog-node,= 4.18.1 || = 5.11.3\n";
        let entries = parse_csv(body);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "@asyncapi/specs");
        assert_eq!(entries[1].name, "posthog-node");
        assert!(entries.iter().all(|e| e.is_wildcard()));
    }

    #[test]
    fn test_parse_csv_skips_blank_and_comment_rows() {
        let body = "# generated snapshot\n\nleft-pad\n  \n\"@scope/quoted\"\n";
        let names: Vec<String> = parse_csv(body).into_iter().map(|e| e.name).collect();

        assert_eq!(names, vec!["left-pad", "@scope/quoted"]);
    }

    #[test]
    fn test_parse_csv_without_header() {
        let entries = parse_csv("alpha\nbeta");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parse_json_versions_and_sentinel() {
        let body = r#"{
            "@ctrl/tinycolor": ["4.1.1", "4.1.2"],
            "evil-pkg": "*",
            "also-evil": ["1.0.0", "*"]
        }"#;
        let entries = parse_json(body).unwrap();
        let find = |n: &str| entries.iter().find(|e| e.name == n).unwrap();

        assert!(!find("@ctrl/tinycolor").is_wildcard());
        assert!(find("@ctrl/tinycolor").matches_version("4.1.2"));
        assert!(find("evil-pkg").is_wildcard());
        assert!(find("also-evil").is_wildcard());
    }

    #[test]
    fn test_parse_json_skips_malformed_entries() {
        let body = r#"{
            "good": ["1.0.0", 7, null],
            "number": 3,
            "other-string": "1.0.0",
            "empty": [],
            "": ["1.0.0"]
        }"#;
        let entries = parse_json(body).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "good");
        assert!(entries[0].matches_version("1.0.0"));
    }

    #[test]
    fn test_parse_json_rejects_non_object() {
        assert!(parse_json("[1, 2, 3]").is_err());
        assert!(parse_json("<html>rate limited</html>").is_err());
    }

    #[test]
    fn test_validate_accepts_real_feeds() {
        assert!(validate(FeedKind::Csv, "Package,Version\n@asyncapi/specs,= 6.8.2\n").is_ok());
        assert!(validate(FeedKind::Csv, "").is_ok());
        assert!(validate(FeedKind::Json, r#"{"evil": "*"}"#).is_ok());
    }

    #[test]
    fn test_validate_rejects_error_pages() {
        let page = "<!DOCTYPE html>\n<html><body>Sign in to continue</body></html>\n";
        assert!(matches!(validate(FeedKind::Csv, page), Err(FeedError::Markup)));
        assert!(matches!(
            validate(FeedKind::Json, page),
            Err(FeedError::NotAnObject(_))
        ));
        assert!(matches!(
            validate(FeedKind::Csv, "left-pad\nAccess denied by proxy\n"),
            Err(FeedError::BadName { .. })
        ));
        assert!(validate(FeedKind::Csv, r#"{"evil": ["1.0.0"]}"#).is_err());
    }
}
