//! Talks to the upstream package registry.
//!
//! Uses a synchronous `reqwest::blocking::Client`: the pipeline is one
//! request after another with no fan-out, so a thread-per-audit model reads
//! more plainly than threading an async runtime through the whole crate.

use log::debug;

use crate::config::Config;
use crate::error::UpstreamError;
use crate::model::{PackageInfo, RegistryDocument, VersionDescriptor};

pub struct RegistryClient {
    http: reqwest::blocking::Client,
    base_url: String,
    metadata_timeout: std::time::Duration,
    archive_timeout: std::time::Duration,
}

impl RegistryClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("pkgaudit/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            http,
            base_url: config.registry_base_url.trim_end_matches('/').to_string(),
            metadata_timeout: config.metadata_timeout,
            archive_timeout: config.archive_timeout,
        }
    }

    /// Fetches the full metadata document for `name`. Returns `Ok(None)` on
    /// a 404 so the caller can translate that into [`crate::error::AuditError::NotFound`]
    /// without this layer knowing about the audit-level error type.
    pub fn fetch_metadata(&self, name: &str) -> Result<Option<RegistryDocument>, UpstreamError> {
        let url = format!("{}/{}", self.base_url, encode_path_segment(name));
        debug!("fetching registry metadata from {url}");

        let response = self
            .http
            .get(&url)
            .timeout(self.metadata_timeout)
            .send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let bytes = response.bytes()?;
        let document: RegistryDocument = serde_json::from_slice(&bytes)?;
        Ok(Some(document))
    }

    /// Downloads the tarball at `url`, bounded to `max_bytes`. Returns the
    /// raw bytes for the archive module to extract.
    pub fn download_archive(
        &self,
        url: &str,
        max_bytes: u64,
    ) -> Result<Vec<u8>, UpstreamError> {
        debug!("downloading archive from {url}");
        let response = self.http.get(url).timeout(self.archive_timeout).send()?;
        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let mut buf = Vec::new();
        let mut response = response;
        std::io::copy(&mut LimitedReader::new(&mut response, max_bytes), &mut buf)?;
        Ok(buf)
    }
}

/// Wraps a reader, stopping once `limit` bytes have been read. Prevents a
/// hostile or misconfigured registry from exhausting memory via an
/// oversized tarball response.
struct LimitedReader<'a> {
    inner: &'a mut dyn std::io::Read,
    remaining: u64,
}

impl<'a> LimitedReader<'a> {
    fn new(inner: &'a mut dyn std::io::Read, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }
}

impl std::io::Read for LimitedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let cap = buf.len().min(self.remaining as usize);
        let read = self.inner.read(&mut buf[..cap])?;
        self.remaining -= read as u64;
        Ok(read)
    }
}

fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'@' | b'/' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Projects a [`RegistryDocument`] into the flatter [`PackageInfo`] shape the
/// rest of the pipeline consumes, resolving the "latest" version pointer.
///
/// Pure and infallible (§4.2): a missing `dist-tags.latest` defaults to the
/// literal string `"unknown"` rather than aborting the audit, and a missing
/// version-descriptor for the latest version falls back to an empty one.
pub fn extract_package_info(document: RegistryDocument) -> PackageInfo {
    let latest_version = document
        .dist_tags
        .latest
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    let empty_version_doc = VersionDescriptor::default();
    let version_doc = document
        .versions
        .get(&latest_version)
        .unwrap_or(&empty_version_doc);

    let license = version_doc
        .license
        .as_ref()
        .map(license_to_string)
        .unwrap_or_default();

    let archive_url = version_doc
        .dist
        .as_ref()
        .and_then(|dist| dist.tarball.clone())
        .unwrap_or_default();

    let repository = version_doc
        .repository
        .clone()
        .or_else(|| document.repository.clone());

    PackageInfo {
        name: document.name,
        latest_version,
        versions: document.versions.keys().cloned().collect(),
        time: document.time,
        maintainers: document.maintainers,
        repository,
        dependencies: version_doc.dependencies.clone(),
        dev_dependencies: version_doc.dev_dependencies.clone(),
        archive_url,
        scripts: version_doc.scripts.clone(),
        description: document.description,
        license,
        homepage: document.homepage,
    }
}

fn license_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}
