//! Publish-cadence analyzer: turns the registry's `time` map into a
//! [`PublishSignals`] bundle.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::PublishSignals;

const SENTINEL_AGE_DAYS: i64 = 999;

/// Parses every entry of `time` except the reserved `created`/`modified`
/// keys, silently skipping anything that doesn't parse as RFC 3339.
fn parsed_release_dates(time: &HashMap<String, String>) -> Vec<DateTime<Utc>> {
    time.iter()
        .filter(|(key, _)| key.as_str() != "created" && key.as_str() != "modified")
        .filter_map(|(_, value)| DateTime::parse_from_rfc3339(value).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .collect()
}

pub fn analyze(time: &HashMap<String, String>, now: DateTime<Utc>) -> PublishSignals {
    let dates = parsed_release_dates(time);

    let latest_release_date = dates.iter().max().copied();

    let age_days = |d: DateTime<Utc>| (now - d).num_days();

    let releases_last_7d = dates.iter().filter(|d| age_days(**d) <= 7).count() as u32;
    let releases_last_30d = dates.iter().filter(|d| age_days(**d) <= 30).count() as u32;
    let releases_last_365d = dates.iter().filter(|d| age_days(**d) <= 365).count() as u32;

    let latest_age_days = latest_release_date
        .map(age_days)
        .unwrap_or(SENTINEL_AGE_DAYS);

    let is_dormant_then_sudden =
        dates.len() > 1 && releases_last_365d <= 2 && releases_last_30d >= 1;

    PublishSignals {
        releases_last_7d,
        releases_last_30d,
        is_dormant_then_sudden,
        latest_age_days,
        latest_release_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn time_map(entries: &[(&str, DateTime<Utc>)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_rfc3339()))
            .collect()
    }

    #[test]
    fn no_entries_yields_sentinel_age() {
        let signals = analyze(&HashMap::new(), Utc::now());
        assert_eq!(signals.latest_age_days, SENTINEL_AGE_DAYS);
        assert!(signals.latest_release_date.is_none());
        assert!(!signals.is_dormant_then_sudden);
    }

    #[test]
    fn created_and_modified_keys_are_ignored() {
        let now = Utc::now();
        let time = time_map(&[("created", now), ("modified", now)]);
        let signals = analyze(&time, now);
        assert!(signals.latest_release_date.is_none());
    }

    #[test]
    fn counts_recent_releases() {
        let now = Utc::now();
        let time = time_map(&[
            ("1.0.0", now - Duration::days(3)),
            ("1.0.1", now - Duration::days(20)),
            ("1.0.2", now - Duration::days(400)),
        ]);
        let signals = analyze(&time, now);
        assert_eq!(signals.releases_last_7d, 1);
        assert_eq!(signals.releases_last_30d, 2);
    }

    #[test]
    fn single_release_is_never_dormant_then_sudden() {
        let now = Utc::now();
        let time = time_map(&[("1.0.0", now - Duration::days(2))]);
        let signals = analyze(&time, now);
        assert!(!signals.is_dormant_then_sudden);
    }

    #[test]
    fn long_gap_then_recent_release_is_dormant_then_sudden() {
        let now = Utc::now();
        let time = time_map(&[
            ("1.0.0", now - Duration::days(900)),
            ("1.0.1", now - Duration::days(5)),
        ]);
        let signals = analyze(&time, now);
        assert!(signals.is_dormant_then_sudden);
    }

    #[test]
    fn unparseable_timestamps_are_skipped() {
        let now = Utc::now();
        let mut time = time_map(&[("1.0.0", now - Duration::days(3))]);
        time.insert("1.0.1".to_string(), "not-a-timestamp".to_string());
        let signals = analyze(&time, now);
        assert_eq!(signals.releases_last_7d, 1);
    }
}
