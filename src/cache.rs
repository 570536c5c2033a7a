//! On-disk TTL cache for registry documents and finished risk reports.
//!
//! Grounded on the teacher's `on_disk_cache.rs`: a directory under the
//! platform cache root, one file per entry named by a digest of its key, and
//! "ignore any errors that may occur while reading" as the working policy --
//! a cache miss or a corrupt entry is never an audit failure, only a cache
//! miss.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};

/// The two independent namespaces the pipeline caches into. Kept distinct so
/// that clearing one (e.g. forcing a fresh registry fetch) doesn't disturb
/// the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Registry,
    Report,
}

impl Namespace {
    fn dir_name(self) -> &'static str {
        match self {
            Namespace::Registry => "registry-cache",
            Namespace::Report => "report-cache",
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Entry<T> {
    stored_at: u64,
    value: T,
}

/// A best-effort, TTL-bounded key/blob store rooted at a single base
/// directory. Safe for concurrent readers and writers: writes are
/// last-writer-wins via a full-file rewrite, and reads tolerate a
/// concurrently-in-progress write by falling back to a cache miss.
pub struct Cache {
    base_dir: PathBuf,
    ttl: Duration,
}

impl Cache {
    pub fn new(base_dir: PathBuf, ttl: Duration) -> Self {
        Self { base_dir, ttl }
    }

    /// Resolves the default cache directory, matching the teacher's use of
    /// the platform cache root rather than a hardcoded path.
    pub fn default_base_dir() -> PathBuf {
        dirs_base()
            .unwrap_or_else(std::env::temp_dir)
            .join("pkgaudit")
    }

    fn path_for(&self, namespace: Namespace, key: &str) -> PathBuf {
        self.base_dir.join(namespace.dir_name()).join(digest(key))
    }

    /// Reads a cached value, ignoring it (and logging at debug level) if it
    /// is missing, corrupt, or past its TTL.
    pub fn get<T: DeserializeOwned>(&self, namespace: Namespace, key: &str) -> Option<T> {
        let path = self.path_for(namespace, key);
        let bytes = std::fs::read(&path).ok()?;
        let entry: Entry<T> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                debug!("cache entry at {} is not valid JSON: {err}", path.display());
                return None;
            }
        };

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if now.saturating_sub(entry.stored_at) >= self.ttl.as_secs() {
            debug!("cache entry at {} expired", path.display());
            return None;
        }

        Some(entry.value)
    }

    /// Writes a value to the cache. Failures (permission errors, a full
    /// disk) are logged and swallowed: caching is an optimization, never a
    /// dependency of a successful audit.
    pub fn put<T: Serialize>(&self, namespace: Namespace, key: &str, value: &T) {
        let path = self.path_for(namespace, key);
        if let Err(err) = self.try_put(&path, value) {
            warn!("failed to write cache entry at {}: {err}", path.display());
        }
    }

    fn try_put<T: Serialize>(&self, path: &Path, value: &T) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored_at = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let entry = Entry { stored_at, value };
        let bytes = serde_json::to_vec(&entry)?;

        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, bytes)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// Matches the teacher's own `url_digest()`: a stable, platform-independent
/// digest of the cache key, used as the entry's filename.
fn digest(key: &str) -> String {
    sha1_smol::Sha1::from(key).hexdigest()
}

#[cfg(unix)]
fn dirs_base() -> Option<PathBuf> {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
}

#[cfg(not(unix))]
fn dirs_base() -> Option<PathBuf> {
    std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path().to_path_buf(), Duration::from_secs(60));
        cache.put(Namespace::Registry, "left-pad", &42u32);
        assert_eq!(cache.get::<u32>(Namespace::Registry, "left-pad"), Some(42));
    }

    #[test]
    fn missing_key_is_a_clean_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path().to_path_buf(), Duration::from_secs(60));
        assert_eq!(cache.get::<u32>(Namespace::Registry, "missing"), None);
    }

    #[test]
    fn namespaces_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path().to_path_buf(), Duration::from_secs(60));
        cache.put(Namespace::Registry, "left-pad", &1u32);
        cache.put(Namespace::Report, "left-pad", &2u32);
        assert_eq!(cache.get::<u32>(Namespace::Registry, "left-pad"), Some(1));
        assert_eq!(cache.get::<u32>(Namespace::Report, "left-pad"), Some(2));
    }

    #[test]
    fn expired_entry_is_treated_as_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path().to_path_buf(), Duration::from_secs(0));
        cache.put(Namespace::Registry, "left-pad", &42u32);
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(cache.get::<u32>(Namespace::Registry, "left-pad"), None);
    }

    #[test]
    fn corrupt_entry_is_treated_as_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path().to_path_buf(), Duration::from_secs(60));
        let path = cache.path_for(Namespace::Registry, "left-pad");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not json").unwrap();
        assert_eq!(cache.get::<u32>(Namespace::Registry, "left-pad"), None);
    }
}
