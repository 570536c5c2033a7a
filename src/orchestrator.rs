//! Audit orchestrator: the single entry point that ties together the cache,
//! registry client, analyzers, typosquat detector, archive scanner and
//! scoring engine into one finished [`RiskReport`].

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;

use crate::analyzers::{dependency, maintainer, publish};
use crate::archive;
use crate::cache::{Cache, Namespace};
use crate::config::Config;
use crate::error::{AuditError, ErrorReport};
use crate::model::{Evidence, PackageIdentifier, PackageInfo, RiskReport, TimelineEntry};
use crate::registry::{self, RegistryClient};
use crate::scoring;
use crate::typosquat;

/// Runs a full audit of `name` against the upstream registry, using `cache`
/// for both the metadata and report namespaces.
///
/// Mirrors §4.7 step by step: report-cache lookup, metadata fetch,
/// projection, analyzers, typosquat detection, archive download + scan,
/// scoring, report assembly, report-cache write.
pub fn audit(raw_name: &str, config: &Config, cache: &Cache) -> Result<RiskReport, AuditError> {
    let identifier = PackageIdentifier::parse(raw_name)?;
    let key = identifier.as_str();

    if let Some(cached) = cache.get::<RiskReport>(Namespace::Report, key) {
        info!("report cache hit for {key}");
        return Ok(cached);
    }

    let client = RegistryClient::new(config);
    let document = fetch_metadata_cached(&client, cache, key)?;

    let info = registry::extract_package_info(document);

    let report = build_report(&info, config, &client);

    cache.put(Namespace::Report, key, &report);
    Ok(report)
}

/// Like [`audit`] but folds the error case into plain JSON data, matching
/// the external contract in §7: callers never see a Rust error type, only
/// either a report or an `{"error": ...}` object.
pub fn audit_json(raw_name: &str, config: &Config, cache: &Cache) -> serde_json::Value {
    match audit(raw_name, config, cache) {
        Ok(report) => to_value(&report),
        Err(err) => {
            warn!("audit of {raw_name:?} failed: {err}");
            to_value(&ErrorReport::from(&err))
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn fetch_metadata_cached(
    client: &RegistryClient,
    cache: &Cache,
    key: &str,
) -> Result<crate::model::RegistryDocument, AuditError> {
    if let Some(cached) = cache.get::<crate::model::RegistryDocument>(Namespace::Registry, key) {
        return Ok(cached);
    }

    let document = client.fetch_metadata(key)?.ok_or(AuditError::NotFound)?;

    cache.put(Namespace::Registry, key, &document);
    Ok(document)
}

fn build_report(info: &PackageInfo, config: &Config, client: &RegistryClient) -> RiskReport {
    let now = Utc::now();

    let publish_signals = publish::analyze(&info.time, now);
    let maintainer_signals = maintainer::analyze(&info.maintainers, info.repository.as_ref());
    let dependency_signals = dependency::analyze(&info.dependencies);
    let typosquat_signals = typosquat::analyze(&info.name, config.typosquat_max_distance);
    let query_is_popular = typosquat::is_popular(&info.name);

    let archive_signals = if info.archive_url.is_empty() {
        crate::model::ArchiveSignals::default()
    } else {
        match client.download_archive(&info.archive_url, config.max_archive_bytes) {
            Ok(bytes) => archive::scan(&bytes, config.max_archive_entries),
            Err(err) => {
                warn!("archive download failed for {}: {err}", info.name);
                crate::model::ArchiveSignals::default()
            }
        }
    };

    let publish_score = scoring::publish_score(&publish_signals);
    let maintainer_score = scoring::maintainer_score(&maintainer_signals);
    let dependency_score = scoring::dependency_score(&dependency_signals);
    let typosquat_score = scoring::typosquat_score(&typosquat_signals, query_is_popular);
    let archive_score = scoring::archive_score(&archive_signals);

    let final_score = scoring::final_score(
        publish_score,
        maintainer_score,
        dependency_score,
        typosquat_score,
        archive_score,
    );
    let severity = scoring::severity(final_score);
    let breakdown = scoring::breakdown(
        publish_score,
        maintainer_score,
        dependency_score,
        typosquat_score,
        archive_score,
    );
    let flags = scoring::flags(
        &publish_signals,
        &maintainer_signals,
        &dependency_signals,
        &typosquat_signals,
        &archive_signals,
    );

    let publish_timeline = build_timeline(info);

    let evidence = Evidence {
        maintainers: maintainer_signals.maintainers.clone(),
        latest_release_date: publish_signals.latest_release_date,
        archive_findings: archive_signals.summary(),
        publish_timeline,
        repository: info.repository.clone(),
        dependencies_count: dependency_signals.count,
        typosquat_matches: typosquat_signals.matches,
        description: info.description.clone(),
        license: info.license.clone(),
        homepage: info.homepage.clone(),
    };

    RiskReport {
        package: info.name.clone(),
        version: info.latest_version.clone(),
        risk_score: final_score,
        severity,
        risk_breakdown: breakdown,
        flags,
        evidence,
        timestamp: now,
    }
}

/// The 20 most recent versions by date descending, presented truncated to
/// the 10 most recent (§4.7 step 9).
fn build_timeline(info: &PackageInfo) -> Vec<TimelineEntry> {
    let mut entries: Vec<(String, chrono::DateTime<Utc>)> = info
        .time
        .iter()
        .filter(|(key, _)| key.as_str() != "created" && key.as_str() != "modified")
        .filter_map(|(version, date)| {
            chrono::DateTime::parse_from_rfc3339(date)
                .ok()
                .map(|dt| (version.clone(), dt.with_timezone(&Utc)))
        })
        .collect();

    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(20);

    entries
        .into_iter()
        .take(10)
        .map(|(version, date)| TimelineEntry {
            version,
            date: date.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        })
        .collect()
}
