//! Cross-platform path resolution.
//!
//! This module finds the platform-specific locations where npm-ecosystem
//! tools keep packages: the npm cache, the Yarn cache, the pnpm store and the
//! per-version installs of a Node version manager.
//!
//! Environment overrides used by the tools themselves win over the platform
//! defaults. Nothing here checks that a path exists; the locator skips
//! missing locations.

use crate::model::Platform;
use std::env;
use std::path::PathBuf;

/// Package-manager locations scanned in full-scan mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformPaths {
    pub npm_cache: Option<PathBuf>,
    pub yarn_cache: Option<PathBuf>,
    pub pnpm_store: Option<PathBuf>,
    /// Directory whose subdirectories are individual Node installs.
    pub nvm_versions: Option<PathBuf>,
}

impl PlatformPaths {
    /// Resolves every location for the current user and platform.
    pub fn detect() -> Self {
        Self {
            npm_cache: npm_cache_dir(),
            yarn_cache: yarn_cache_dir(),
            pnpm_store: pnpm_store_dir(),
            nvm_versions: nvm_versions_dir(),
        }
    }

    /// Platform defaults laid out under `home`, ignoring the environment.
    pub fn under_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        match Platform::current() {
            Platform::Windows => {
                let local = home.join("AppData").join("Local");
                Self {
                    npm_cache: Some(local.join("npm-cache")),
                    yarn_cache: Some(local.join("Yarn").join("Cache")),
                    pnpm_store: Some(local.join("pnpm").join("store")),
                    nvm_versions: Some(home.join("AppData").join("Roaming").join("nvm")),
                }
            }
            Platform::MacOS => Self {
                npm_cache: Some(home.join(".npm")),
                yarn_cache: Some(home.join("Library").join("Caches").join("Yarn")),
                pnpm_store: Some(home.join("Library").join("pnpm").join("store")),
                nvm_versions: Some(home.join(".nvm").join("versions").join("node")),
            },
            Platform::Linux => Self {
                npm_cache: Some(home.join(".npm")),
                yarn_cache: Some(home.join(".cache").join("yarn")),
                pnpm_store: Some(home.join(".local").join("share").join("pnpm").join("store")),
                nvm_versions: Some(home.join(".nvm").join("versions").join("node")),
            },
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Returns the npm cache directory.
///
/// Honors `npm_config_cache`, otherwise:
/// - Linux/macOS: `~/.npm`
/// - Windows: `%LOCALAPPDATA%\npm-cache`
pub fn npm_cache_dir() -> Option<PathBuf> {
    if let Some(path) = env_path("npm_config_cache") {
        return Some(path);
    }
    match Platform::current() {
        Platform::Windows => Some(dirs::data_local_dir()?.join("npm-cache")),
        _ => Some(dirs::home_dir()?.join(".npm")),
    }
}

/// Returns the Yarn cache directory.
///
/// Honors `YARN_CACHE_FOLDER`, otherwise:
/// - Linux: `~/.cache/yarn`
/// - macOS: `~/Library/Caches/Yarn`
/// - Windows: `%LOCALAPPDATA%\Yarn\Cache`
pub fn yarn_cache_dir() -> Option<PathBuf> {
    if let Some(path) = env_path("YARN_CACHE_FOLDER") {
        return Some(path);
    }
    match Platform::current() {
        Platform::Linux => Some(dirs::cache_dir()?.join("yarn")),
        Platform::MacOS => Some(dirs::cache_dir()?.join("Yarn")),
        Platform::Windows => Some(dirs::data_local_dir()?.join("Yarn").join("Cache")),
    }
}

/// Returns the pnpm content-addressable store.
///
/// Honors `PNPM_STORE_DIR`, otherwise:
/// - Linux: `~/.local/share/pnpm/store`
/// - macOS: `~/Library/pnpm/store`
/// - Windows: `%LOCALAPPDATA%\pnpm\store`
pub fn pnpm_store_dir() -> Option<PathBuf> {
    if let Some(path) = env_path("PNPM_STORE_DIR") {
        return Some(path);
    }
    match Platform::current() {
        Platform::Linux => Some(dirs::data_local_dir()?.join("pnpm").join("store")),
        Platform::MacOS => Some(dirs::home_dir()?.join("Library").join("pnpm").join("store")),
        Platform::Windows => Some(dirs::data_local_dir()?.join("pnpm").join("store")),
    }
}

/// Returns the directory holding one subdirectory per installed Node version.
///
/// - Linux/macOS: `$NVM_DIR/versions/node` (default `~/.nvm/versions/node`)
/// - Windows (nvm-windows): `%NVM_HOME%` (default `%APPDATA%\nvm`)
pub fn nvm_versions_dir() -> Option<PathBuf> {
    match Platform::current() {
        Platform::Windows => {
            env_path("NVM_HOME").or_else(|| Some(dirs::data_dir()?.join("nvm")))
        }
        _ => {
            let nvm_dir = env_path("NVM_DIR").or_else(|| Some(dirs::home_dir()?.join(".nvm")))?;
            Some(nvm_dir.join("versions").join("node"))
        }
    }
}

/// Returns the cache directory for hulud-detect.
///
/// Platform-specific locations:
/// - Linux: `~/.cache/hulud-detect/`
/// - macOS: `~/Library/Caches/hulud-detect/`
/// - Windows: `%LOCALAPPDATA%\hulud-detect\`
///
/// Falls back to the system temp directory if no cache directory can be
/// determined.
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("hulud-detect")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_home_places_everything_below_home() {
        let home = PathBuf::from("/home/tester");
        let paths = PlatformPaths::under_home(&home);

        for path in [
            &paths.npm_cache,
            &paths.yarn_cache,
            &paths.pnpm_store,
            &paths.nvm_versions,
        ] {
            assert!(path.as_ref().unwrap().starts_with(&home));
        }
    }

    #[test]
    fn test_cache_dir_is_namespaced() {
        assert!(cache_dir().ends_with("hulud-detect"));
    }
}
