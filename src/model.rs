//! Data model shared across the audit pipeline.
//!
//! Types here mirror §3 of the design: the registry document as deserialized
//! from upstream JSON, the [`PackageInfo`] projection the rest of the
//! pipeline actually consumes, the signal bundles each analyzer produces, and
//! the final [`RiskReport`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// A lowercased, trimmed package name.
///
/// Case-folding happens once, at the boundary, so every cache lookup,
/// registry request and typosquat comparison downstream sees the same
/// canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentifier(String);

impl PackageIdentifier {
    pub fn parse(raw: &str) -> Result<Self, AuditError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AuditError::InvalidInput);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A repository field as it appears in registry JSON: either a bare URL
/// string or an object carrying `url` (and sometimes `type`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RepositoryField {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
        #[serde(rename = "type", default)]
        kind: Option<String>,
    },
}

impl RepositoryField {
    pub fn url(&self) -> Option<&str> {
        match self {
            RepositoryField::Url(url) => Some(url.as_str()),
            RepositoryField::Object { url, .. } => url.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Maintainer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DistTags {
    #[serde(default)]
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Dist {
    #[serde(default)]
    pub tarball: Option<String>,
}

/// A single entry of `versions` in the upstream document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VersionDescriptor {
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    #[serde(rename = "devDependencies", default)]
    pub dev_dependencies: HashMap<String, String>,
    #[serde(default)]
    pub repository: Option<RepositoryField>,
    #[serde(default)]
    pub license: Option<serde_json::Value>,
    #[serde(default)]
    pub scripts: HashMap<String, String>,
    #[serde(default)]
    pub dist: Option<Dist>,
}

/// The opaque metadata document returned by the registry (§3).
///
/// Only the fields the pipeline consumes are modeled; anything else in the
/// upstream JSON is ignored by `serde`'s default behaviour.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub repository: Option<RepositoryField>,
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: DistTags,
    #[serde(default)]
    pub versions: HashMap<String, VersionDescriptor>,
    #[serde(default)]
    pub time: HashMap<String, String>,
}

/// The projection of [`RegistryDocument`] the rest of the pipeline acts on.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub name: String,
    pub latest_version: String,
    pub versions: Vec<String>,
    pub time: HashMap<String, String>,
    pub maintainers: Vec<Maintainer>,
    pub repository: Option<RepositoryField>,
    pub dependencies: HashMap<String, String>,
    pub dev_dependencies: HashMap<String, String>,
    pub archive_url: String,
    pub scripts: HashMap<String, String>,
    pub description: String,
    pub license: String,
    pub homepage: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishSignals {
    pub releases_last_7d: u32,
    pub releases_last_30d: u32,
    pub is_dormant_then_sudden: bool,
    pub latest_age_days: i64,
    pub latest_release_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintainerSignals {
    pub count: usize,
    pub maintainers: Vec<Maintainer>,
    pub has_free_email: bool,
    pub has_github_repo: bool,
    pub has_recent_addition: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencySignals {
    pub count: usize,
    pub dependencies: Vec<String>,
    pub deprecated_count: u32,
    pub missing_repo_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TyposquatMatch {
    pub popular_package: String,
    pub distance: usize,
    pub suspicion: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TyposquatSignals {
    pub min_distance: usize,
    pub matches: Vec<TyposquatMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallScriptEvidence {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkPatternEvidence {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalPatternEvidence {
    pub file: String,
    pub pattern: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighEntropyEvidence {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    pub length: usize,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveSignals {
    pub has_postinstall: bool,
    pub has_network_commands: bool,
    pub has_eval_function: bool,
    pub has_high_entropy: bool,
    pub install_scripts: Vec<InstallScriptEvidence>,
    pub network_patterns: Vec<NetworkPatternEvidence>,
    pub eval_patterns: Vec<EvalPatternEvidence>,
    pub high_entropy_strings: Vec<HighEntropyEvidence>,
}

impl ArchiveSignals {
    /// Human-readable one-liners summarizing the findings, used in the
    /// report's evidence section rather than the raw per-file records.
    pub fn summary(&self) -> Vec<String> {
        let mut summary = Vec::new();
        if self.has_postinstall {
            let scripts: Vec<&str> = self
                .install_scripts
                .iter()
                .map(|s| s.name.as_str())
                .collect();
            summary.push(format!("Install scripts found: {}", scripts.join(", ")));
        }
        if self.has_network_commands {
            summary.push(format!(
                "Network/shell commands detected in {} location(s)",
                self.network_patterns.len()
            ));
        }
        if self.has_eval_function {
            summary.push(format!(
                "eval()/Function() calls in {} location(s)",
                self.eval_patterns.len()
            ));
        }
        if self.has_high_entropy {
            summary.push(format!(
                "High-entropy strings in {} location(s)",
                self.high_entropy_strings.len()
            ));
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub publish_activity: u32,
    pub maintainer: u32,
    pub dependency: u32,
    pub typosquat: u32,
    #[serde(rename = "tarball_scan")]
    pub archive_scan: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub version: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub maintainers: Vec<Maintainer>,
    pub latest_release_date: Option<DateTime<Utc>>,
    #[serde(rename = "tarball_findings")]
    pub archive_findings: Vec<String>,
    pub publish_timeline: Vec<TimelineEntry>,
    pub repository: Option<RepositoryField>,
    pub dependencies_count: usize,
    pub typosquat_matches: Vec<TyposquatMatch>,
    pub description: String,
    pub license: String,
    pub homepage: String,
}

/// The final audit result (§3). Field order and names are the stable wire
/// contract consumed by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub package: String,
    pub version: String,
    pub risk_score: u32,
    pub severity: Severity,
    pub risk_breakdown: RiskBreakdown,
    pub flags: Vec<String>,
    pub evidence: Evidence,
    pub timestamp: DateTime<Utc>,
}
