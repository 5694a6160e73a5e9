//! Application configuration for docbundle.
//!
//! User config lives at `~/.docbundle/docbundle.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DocBundleError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docbundle.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docbundle";

/// User-Agent sent with every crawl request unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("docbundle/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Config structs (matching docbundle.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Skip and unsupported-format rules.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Local directory mode.
    #[serde(default)]
    pub local: LocalPolicyConfig,

    /// Web crawl mode.
    #[serde(default)]
    pub crawl: CrawlPolicyConfig,
}

/// `[filter]` section. Used as-is at runtime by the scope filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Directory names pruned from the walk (exact, case-insensitive).
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// File name suffixes that are silently skipped, e.g. `.png`, `.tar.gz`.
    #[serde(default = "default_skip_extensions")]
    pub skip_extensions: Vec<String>,

    /// Extensions that get a warning block instead of extraction.
    #[serde(default = "default_unsupported_extensions")]
    pub unsupported_extensions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            skip_dirs: default_skip_dirs(),
            skip_extensions: default_skip_extensions(),
            unsupported_extensions: default_unsupported_extensions(),
        }
    }
}

fn default_skip_dirs() -> Vec<String> {
    [
        ".git",
        ".svn",
        ".hg",
        ".vs",
        ".idea",
        "bin",
        "obj",
        "target",
        "__pycache__",
        "node_modules",
    ]
    .map(String::from)
    .to_vec()
}

fn default_skip_extensions() -> Vec<String> {
    [
        ".exe", ".dll", ".so", ".dylib", ".pdb", ".o", ".class", ".zip", ".tar.gz", ".tgz",
        ".gz", ".7z", ".rar", ".log", ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".ico", ".svg",
        ".webp", ".mp3", ".mp4",
    ]
    .map(String::from)
    .to_vec()
}

fn default_unsupported_extensions() -> Vec<String> {
    [".doc", ".xls", ".ppt"].map(String::from).to_vec()
}

/// `[local]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalPolicyConfig {
    /// Upper bound on extraction workers; the pool never exceeds available parallelism.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for LocalPolicyConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

fn default_max_workers() -> usize {
    8
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlPolicyConfig {
    /// Delay in ms between consecutive requests of one crawl.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// User-Agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Hard cap on dispatched pages.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum link depth from the seed. Unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,

    /// Progress estimate used while the real total is unknown.
    #[serde(default = "default_estimated_pages")]
    pub estimated_pages: usize,

    /// URL path patterns that are never followed.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl Default for CrawlPolicyConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_pages: default_max_pages(),
            max_depth: None,
            estimated_pages: default_estimated_pages(),
            exclude_patterns: Vec::new(),
        }
    }
}

fn default_delay_ms() -> u64 {
    1000
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_pages() -> usize {
    500
}
fn default_estimated_pages() -> usize {
    100
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime settings for local directory mode.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Number of concurrent extraction workers (at least 1).
    pub workers: usize,
}

impl LocalConfig {
    /// `min(available parallelism, cap)`, never below one.
    pub fn with_cap(cap: usize) -> Self {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            workers: available.min(cap).max(1),
        }
    }
}

impl From<&AppConfig> for LocalConfig {
    fn from(config: &AppConfig) -> Self {
        Self::with_cap(config.local.max_workers)
    }
}

/// Runtime crawl configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Pause between consecutive requests.
    pub delay: Duration,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_pages: usize,
    pub max_depth: Option<u32>,
    pub estimated_pages: usize,
    pub exclude_patterns: Vec<String>,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        let crawl = &config.crawl;
        Self {
            delay: Duration::from_millis(crawl.delay_ms),
            user_agent: crawl.user_agent.clone(),
            timeout: Duration::from_secs(crawl.timeout_secs),
            max_pages: crawl.max_pages,
            max_depth: crawl.max_depth,
            estimated_pages: crawl.estimated_pages,
            exclude_patterns: crawl.exclude_patterns.clone(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docbundle/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DocBundleError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docbundle/docbundle.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocBundleError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| DocBundleError::config(format!("failed to parse {}: {e}", path.display())))?;

    if config.local.max_workers == 0 {
        return Err(DocBundleError::config("local.max_workers must be at least 1"));
    }

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocBundleError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = to_toml(&AppConfig::default())?;

    std::fs::write(&path, content).map_err(|e| DocBundleError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Serialize a config for display or writing.
pub fn to_toml(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| DocBundleError::config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let toml_str = to_toml(&AppConfig::default()).expect("serialize default config");
        assert!(toml_str.contains("node_modules"));
        assert!(toml_str.contains("delay_ms = 1000"));
        assert!(!toml_str.contains("max_depth"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
[crawl]
delay_ms = 0
max_depth = 2
exclude_patterns = ["/blog/**"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.crawl.delay_ms, 0);
        assert_eq!(config.crawl.max_depth, Some(2));
        assert_eq!(config.crawl.max_pages, 500);
        assert_eq!(config.local.max_workers, 8);
        assert!(config.filter.unsupported_extensions.contains(&".doc".to_string()));
    }

    #[test]
    fn crawl_config_from_app_config() {
        let crawl = CrawlConfig::from(&AppConfig::default());
        assert_eq!(crawl.delay, Duration::from_secs(1));
        assert_eq!(crawl.timeout, Duration::from_secs(30));
        assert_eq!(crawl.estimated_pages, 100);
        assert!(crawl.user_agent.starts_with("docbundle/"));
    }

    #[test]
    fn local_workers_are_capped() {
        assert_eq!(LocalConfig::with_cap(1).workers, 1);
        assert!(LocalConfig::with_cap(8).workers <= 8);
        assert_eq!(LocalConfig::with_cap(0).workers, 1);
    }

    #[test]
    fn zero_workers_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("docbundle.toml");
        std::fs::write(&path, "[local]\nmax_workers = 0\n").expect("write");
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("max_workers"));
    }
}
