//! Core runtime configuration.
//!
//! The data directory is resolved once at process startup and then passed into the store
//! registry. Nothing in the store layer reads process-wide environment variables; the binary
//! reads them and hands the values to the helpers in this module.

use crate::constants::{
    DEVELOPMENT_DATA_DIR, ENVIRONMENTS_FILENAME, PACKAGED_DATA_DIR, PATIENTS_FILENAME,
    SESSIONS_FILENAME, SUPERVISORS_FILENAME,
};
use crate::error::{StoreError, StoreResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the data directory is located when no explicit directory is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathStrategy {
    /// Project-relative `HospitalData/StreamingAssets`, found by walking up from the working
    /// directory.
    Development,
    /// `StreamingAssets/HospitalData` next to the running executable.
    Packaged,
}

impl PathStrategy {
    /// `Development` for debug builds, `Packaged` for release builds.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            PathStrategy::Development
        } else {
            PathStrategy::Packaged
        }
    }
}

impl fmt::Display for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStrategy::Development => f.write_str("development"),
            PathStrategy::Packaged => f.write_str("packaged"),
        }
    }
}

impl FromStr for PathStrategy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(PathStrategy::Development),
            "packaged" | "release" => Ok(PathStrategy::Packaged),
            other => Err(StoreError::InvalidConfig(format!(
                "unknown data mode '{other}' (expected 'development' or 'packaged')"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    base_dir: PathBuf,
}

impl CoreConfig {
    /// Create a `CoreConfig` rooted at `base_dir`.
    ///
    /// The directory does not have to exist yet; it is created on the first write. A path
    /// that exists but is not a directory is rejected.
    pub fn new(base_dir: PathBuf) -> StoreResult<Self> {
        if base_dir.as_os_str().is_empty() {
            return Err(StoreError::InvalidConfig(
                "data directory cannot be empty".into(),
            ));
        }
        if base_dir.exists() && !base_dir.is_dir() {
            return Err(StoreError::InvalidConfig(format!(
                "data directory '{}' is not a directory",
                base_dir.display()
            )));
        }

        Ok(Self { base_dir })
    }

    /// Resolve the data directory.
    ///
    /// `override_dir` wins over either strategy.
    pub fn resolve(strategy: PathStrategy, override_dir: Option<PathBuf>) -> StoreResult<Self> {
        if let Some(dir) = override_dir {
            return Self::new(dir);
        }

        let base_dir = match strategy {
            PathStrategy::Development => {
                let cwd = std::env::current_dir().map_err(|e| {
                    StoreError::InvalidConfig(format!("cannot read working directory: {e}"))
                })?;
                resolve_development_dir(&cwd)
            }
            PathStrategy::Packaged => {
                let exe = std::env::current_exe().map_err(|e| {
                    StoreError::InvalidConfig(format!("cannot locate executable: {e}"))
                })?;
                packaged_dir(&exe)?
            }
        };

        Self::new(base_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn patients_path(&self) -> PathBuf {
        self.base_dir.join(PATIENTS_FILENAME)
    }

    pub fn supervisors_path(&self) -> PathBuf {
        self.base_dir.join(SUPERVISORS_FILENAME)
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.base_dir.join(SESSIONS_FILENAME)
    }

    pub fn environments_path(&self) -> PathBuf {
        self.base_dir.join(ENVIRONMENTS_FILENAME)
    }
}

/// Locate the development data directory without reading environment variables.
///
/// Searches `start` and its ancestors, then `CARGO_MANIFEST_DIR` and its ancestors, for an
/// existing `HospitalData/StreamingAssets` directory. Falls back to that folder under `start`.
pub fn resolve_development_dir(start: &Path) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    start
        .ancestors()
        .chain(manifest_dir.ancestors())
        .map(|ancestor| ancestor.join(DEVELOPMENT_DATA_DIR))
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| start.join(DEVELOPMENT_DATA_DIR))
}

/// The packaged data directory for an executable at `exe`.
pub fn packaged_dir(exe: &Path) -> StoreResult<PathBuf> {
    exe.parent()
        .map(|app_dir| app_dir.join(PACKAGED_DATA_DIR))
        .ok_or_else(|| {
            StoreError::InvalidConfig(format!(
                "executable path '{}' has no parent directory",
                exe.display()
            ))
        })
}

/// Parse the path strategy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`PathStrategy::for_build`].
pub fn strategy_from_env_value(value: Option<String>) -> StoreResult<PathStrategy> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<PathStrategy>()).transpose()?;

    Ok(parsed.unwrap_or_else(PathStrategy::for_build))
}

/// Parse an optional data directory override; empty/whitespace means "no override".
pub fn data_dir_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
