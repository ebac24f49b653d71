use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Retrieval constants
// =============================================================================

/// Timeout for a single package retrieval in seconds (5 minutes)
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 300;

/// Upper bound on the default number of concurrent retrievals
pub const MAX_DEFAULT_WORKERS: usize = 20;

/// Default PyPI base URL
pub const DEFAULT_REGISTRY_URL: &str = "https://pypi.org";

/// Number of leading bytes inspected when classifying a file as binary (8 KiB)
pub const BINARY_SNIFF_BYTES: u64 = 8 * 1024;

/// Prefix of temporary directories holding repository clones
pub const GIT_TEMP_PREFIX: &str = "depdiff_git_";

/// Prefix of temporary directories holding downloaded release artifacts
pub const ARTIFACT_TEMP_PREFIX: &str = "depdiff_artifact_";

// =============================================================================
// Logging constants
// =============================================================================

/// Environment variable holding the log filter when `--log-level` is not given
pub const LOG_FILTER_ENV: &str = "DEPDIFF_LOG";

/// Log filter used when neither `--log-level` nor [`LOG_FILTER_ENV`] is set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// File name of the log written under [`data_dir`]
pub const LOG_FILE_NAME: &str = "depdiff.log";

/// Returns the default worker count: twice the available parallelism, capped at
/// [`MAX_DEFAULT_WORKERS`]. Retrieval is I/O-bound, so exceeding the CPU count is fine.
pub fn default_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cpus * 2).min(MAX_DEFAULT_WORKERS)
}

/// depdiff configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DepdiffConfig {
    /// Maximum number of packages retrieved concurrently
    pub workers: usize,
    /// Per-package retrieval timeout in seconds
    pub task_timeout_secs: u64,
    /// Base URL of the package registry
    pub registry_url: String,
    pub vcs: VcsConfig,
    pub artifacts: ArtifactConfig,
}

impl Default for DepdiffConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            vcs: VcsConfig::default(),
            artifacts: ArtifactConfig::default(),
        }
    }
}

impl DepdiffConfig {
    /// Load configuration from a JSON file. Missing fields use their defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }
}

/// Version-control retrieval configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct VcsConfig {
    pub enabled: bool,
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Artifact retrieval configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ArtifactConfig {
    /// Download the old and new release concurrently
    pub parallel_downloads: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            parallel_downloads: true,
        }
    }
}

/// Returns the path to the data directory for depdiff.
/// Uses $XDG_DATA_HOME/depdiff if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/depdiff,
/// or ./depdiff if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(LOG_FILE_NAME)
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("depdiff")
}
