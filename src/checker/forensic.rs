/// File names dropped by the Shai-Hulud worm: the Bun-based loader and the
/// JSON dumps of harvested credentials it writes before exfiltration.
pub const FORENSIC_ARTIFACTS: &[&str] = &[
    "setup_bun.js",
    "bun_environment.js",
    "truffleSecrets.json",
    "cloud.json",
    "contents.json",
    "environment.json",
    "actionsSecrets.json",
];

/// Exact, case-sensitive file name comparison.
pub fn is_forensic_artifact(file_name: &str) -> bool {
    FORENSIC_ARTIFACTS.contains(&file_name)
}
