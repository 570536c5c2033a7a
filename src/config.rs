//! Runtime configuration for the audit pipeline.
//!
//! Mirrors the teacher's preference for a handful of env-var overrides read
//! once at startup rather than a config file, since the whole surface is a
//! handful of knobs (registry URL, timeouts, cache TTL).

use std::time::Duration;

/// Knobs the orchestrator and its collaborators are built from.
///
/// A `Config` is constructed once per process (or per test) and passed down
/// explicitly; nothing here is read from a global.
#[derive(Debug, Clone)]
pub struct Config {
    pub registry_base_url: String,
    /// Hard bound on the metadata request (§4.2: 30s).
    pub metadata_timeout: Duration,
    /// Hard bound on the archive download (§4.2: 60s).
    pub archive_timeout: Duration,
    pub max_archive_bytes: u64,
    pub max_archive_entries: usize,
    pub cache_ttl: Duration,
    pub cache_dir: Option<std::path::PathBuf>,
    pub typosquat_max_distance: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_base_url: "https://registry.npmjs.org".to_string(),
            metadata_timeout: Duration::from_secs(30),
            archive_timeout: Duration::from_secs(60),
            max_archive_bytes: 50 * 1024 * 1024,
            max_archive_entries: 10_000,
            cache_ttl: Duration::from_secs(86_400),
            cache_dir: None,
            typosquat_max_distance: 2,
        }
    }
}

impl Config {
    /// Builds a [`Config`], applying `PKGAUDIT_*` environment overrides on
    /// top of the defaults. Malformed overrides are ignored rather than
    /// failing startup; the default wins.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("PKGAUDIT_REGISTRY_URL") {
            if !url.is_empty() {
                config.registry_base_url = url;
            }
        }
        if let Ok(secs) = std::env::var("PKGAUDIT_METADATA_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.metadata_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(secs) = std::env::var("PKGAUDIT_ARCHIVE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.archive_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(bytes) = std::env::var("PKGAUDIT_MAX_ARCHIVE_BYTES") {
            if let Ok(bytes) = bytes.parse() {
                config.max_archive_bytes = bytes;
            }
        }
        if let Ok(ttl) = std::env::var("PKGAUDIT_CACHE_TTL_SECS") {
            if let Ok(ttl) = ttl.parse() {
                config.cache_ttl = Duration::from_secs(ttl);
            }
        }
        if let Ok(dir) = std::env::var("PKGAUDIT_CACHE_DIR") {
            if !dir.is_empty() {
                config.cache_dir = Some(std::path::PathBuf::from(dir));
            }
        }

        config
    }
}
