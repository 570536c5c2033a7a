//! Scoring engine: fuses analyzer signals into sub-scores, a final weighted
//! score, a severity label, and an ordered flag list.
//!
//! Every function here is a pure, independent mapping from signals to an
//! integer in `[0, 100]` — deliberately free of any I/O so the scoring
//! vectors in the test module double as the external contract's golden
//! values.

use crate::model::{
    ArchiveSignals, DependencySignals, MaintainerSignals, PublishSignals, RiskBreakdown, Severity,
    TyposquatSignals,
};

pub fn publish_score(signals: &PublishSignals) -> u32 {
    if signals.releases_last_7d >= 5 {
        90
    } else if signals.releases_last_7d >= 2 {
        65
    } else if signals.is_dormant_then_sudden && signals.latest_age_days <= 7 {
        80
    } else {
        10
    }
}

pub fn maintainer_score(signals: &MaintainerSignals) -> u32 {
    let mut score: i32 = 0;
    if signals.count == 1 {
        score += 70;
    }
    if signals.has_recent_addition {
        score += 20;
    }
    if !signals.has_github_repo {
        score += 20;
    }
    if signals.has_free_email {
        score += 10;
    }
    score.min(100) as u32
}

pub fn dependency_score(signals: &DependencySignals) -> u32 {
    let base: i32 = if signals.count > 50 {
        90
    } else if signals.count > 20 {
        60
    } else if signals.count > 5 {
        30
    } else {
        0
    };
    let deprecated_penalty = (15 * signals.deprecated_count as i32).min(100);
    let missing_repo_penalty = (10 * signals.missing_repo_count as i32).min(100);
    (base + deprecated_penalty + missing_repo_penalty).min(100) as u32
}

/// `query_is_popular` is whether the audited package's own name is itself
/// one of the baked-in popular names (see §9's popular-but-typosquat case).
pub fn typosquat_score(signals: &TyposquatSignals, query_is_popular: bool) -> u32 {
    match signals.min_distance {
        1 if query_is_popular => 60,
        1 => 90,
        2 => 30,
        _ => 0,
    }
}

pub fn archive_score(signals: &ArchiveSignals) -> u32 {
    let mut score: i32 = 0;
    if signals.has_postinstall {
        score += 60;
    }
    if signals.has_network_commands {
        score += 50;
    }
    if signals.has_eval_function {
        score += 40;
    }
    if signals.has_high_entropy {
        score += 50;
    }
    score.min(100) as u32
}

/// Half-away-from-zero rounding of the weighted sum of sub-scores.
pub fn final_score(
    publish: u32,
    maintainer: u32,
    dependency: u32,
    typosquat: u32,
    archive: u32,
) -> u32 {
    let weighted = 0.25 * f64::from(publish)
        + 0.20 * f64::from(maintainer)
        + 0.20 * f64::from(dependency)
        + 0.15 * f64::from(typosquat)
        + 0.20 * f64::from(archive);
    weighted.round() as u32
}

pub fn severity(score: u32) -> Severity {
    if score <= 30 {
        Severity::Low
    } else if score <= 60 {
        Severity::Medium
    } else {
        Severity::High
    }
}

/// Builds the `risk_breakdown` field from the already-computed sub-scores.
pub fn breakdown(
    publish: u32,
    maintainer: u32,
    dependency: u32,
    typosquat: u32,
    archive: u32,
) -> RiskBreakdown {
    RiskBreakdown {
        publish_activity: publish,
        maintainer,
        dependency,
        typosquat,
        archive_scan: archive,
    }
}

/// Deterministic, spec-ordered flag list.
pub fn flags(
    publish: &PublishSignals,
    maintainer: &MaintainerSignals,
    dependency: &DependencySignals,
    typosquat: &TyposquatSignals,
    archive: &ArchiveSignals,
) -> Vec<String> {
    let mut flags = Vec::new();

    if publish.releases_last_7d >= 5 {
        flags.push("Unusual publish activity: 5+ releases in 7 days".to_string());
    }
    if publish.is_dormant_then_sudden {
        flags.push("Dormant package with sudden release".to_string());
    }
    if maintainer.count == 1 {
        flags.push("Single maintainer".to_string());
    }
    if maintainer.has_recent_addition {
        flags.push("Recently added maintainer".to_string());
    }
    if !maintainer.has_github_repo {
        flags.push("Missing GitHub repository".to_string());
    }
    if maintainer.has_free_email {
        flags.push("Maintainer uses free email domain".to_string());
    }
    if dependency.count > 50 {
        flags.push(format!("High dependency count: {}", dependency.count));
    } else if dependency.count > 20 {
        flags.push(format!("Moderate dependency count: {}", dependency.count));
    }
    if typosquat.min_distance <= 2 {
        if let Some(first) = typosquat.matches.first() {
            flags.push(format!("Possible typosquat of: {}", first.popular_package));
        }
    }
    if archive.has_postinstall {
        flags.push("Contains postinstall/preinstall scripts".to_string());
    }
    if archive.has_network_commands {
        flags.push("Contains network commands (curl/wget/nc)".to_string());
    }
    if archive.has_eval_function {
        flags.push("Contains eval() or Function() calls".to_string());
    }
    if archive.has_high_entropy {
        flags.push("Contains high-entropy/obfuscated code".to_string());
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Maintainer, TyposquatMatch};
    use chrono::Utc;

    fn publish_signals(last_7d: u32, last_30d: u32, dormant: bool, age: i64) -> PublishSignals {
        PublishSignals {
            releases_last_7d: last_7d,
            releases_last_30d: last_30d,
            is_dormant_then_sudden: dormant,
            latest_age_days: age,
            latest_release_date: Some(Utc::now()),
        }
    }

    #[test]
    fn publish_score_vectors() {
        assert_eq!(publish_score(&publish_signals(5, 10, false, 1)), 90);
        assert_eq!(publish_score(&publish_signals(2, 5, false, 3)), 65);
        assert_eq!(publish_score(&publish_signals(1, 1, true, 3)), 80);
        assert_eq!(publish_score(&publish_signals(0, 1, false, 30)), 10);
    }

    fn maintainer_signals(count: usize, recent: bool, github: bool, free_email: bool) -> MaintainerSignals {
        MaintainerSignals {
            count,
            maintainers: vec![Maintainer::default(); count],
            has_free_email: free_email,
            has_github_repo: github,
            has_recent_addition: recent,
        }
    }

    #[test]
    fn maintainer_score_vectors() {
        assert_eq!(maintainer_score(&maintainer_signals(1, false, true, false)), 70);
        assert_eq!(maintainer_score(&maintainer_signals(1, true, false, true)), 100);
        assert_eq!(maintainer_score(&maintainer_signals(3, false, true, false)), 0);
    }

    fn dependency_signals(count: usize, deprecated: u32, missing_repo: u32) -> DependencySignals {
        DependencySignals {
            count,
            dependencies: Vec::new(),
            deprecated_count: deprecated,
            missing_repo_count: missing_repo,
        }
    }

    #[test]
    fn dependency_score_vectors() {
        assert_eq!(dependency_score(&dependency_signals(60, 0, 0)), 90);
        assert_eq!(dependency_score(&dependency_signals(10, 3, 0)), 75);
        assert_eq!(dependency_score(&dependency_signals(3, 0, 0)), 0);
    }

    fn typosquat_signals(min_distance: usize) -> TyposquatSignals {
        TyposquatSignals {
            min_distance,
            matches: if min_distance <= 2 {
                vec![TyposquatMatch {
                    popular_package: "express".to_string(),
                    distance: min_distance,
                    suspicion: "high".to_string(),
                }]
            } else {
                Vec::new()
            },
        }
    }

    #[test]
    fn typosquat_score_vectors() {
        assert_eq!(typosquat_score(&typosquat_signals(1), false), 90);
        assert_eq!(typosquat_score(&typosquat_signals(1), true), 60);
        assert_eq!(typosquat_score(&typosquat_signals(2), false), 30);
        assert_eq!(typosquat_score(&typosquat_signals(999), false), 0);
    }

    fn archive_signals(postinstall: bool, network: bool, eval_: bool, entropy: bool) -> ArchiveSignals {
        ArchiveSignals {
            has_postinstall: postinstall,
            has_network_commands: network,
            has_eval_function: eval_,
            has_high_entropy: entropy,
            ..ArchiveSignals::default()
        }
    }

    #[test]
    fn archive_score_vectors() {
        assert_eq!(archive_score(&archive_signals(true, true, true, true)), 100);
        assert_eq!(archive_score(&archive_signals(true, false, false, false)), 60);
    }

    #[test]
    fn final_score_vector() {
        assert_eq!(final_score(40, 50, 60, 70, 80), 59);
    }

    #[test]
    fn severity_thresholds() {
        assert_eq!(severity(30), Severity::Low);
        assert_eq!(severity(31), Severity::Medium);
        assert_eq!(severity(60), Severity::Medium);
        assert_eq!(severity(61), Severity::High);
    }

    #[test]
    fn end_to_end_scoring_scenario() {
        let publish = publish_signals(0, 1, true, 7);
        let maintainer = maintainer_signals(1, false, true, true);
        let dependency = dependency_signals(55, 0, 0);
        let typosquat = TyposquatSignals {
            min_distance: 999,
            matches: Vec::new(),
        };
        let archive = ArchiveSignals::default();

        let p = publish_score(&publish);
        let m = maintainer_score(&maintainer);
        let d = dependency_score(&dependency);
        let t = typosquat_score(&typosquat, false);
        let a = archive_score(&archive);

        assert_eq!(p, 80);
        assert_eq!(m, 80);
        assert_eq!(d, 90);
        assert_eq!(t, 0);
        assert_eq!(a, 0);

        let score = final_score(p, m, d, t, a);
        assert_eq!(score, 54);
        assert_eq!(severity(score), Severity::Medium);

        let flags = flags(&publish, &maintainer, &dependency, &typosquat, &archive);
        assert!(flags.contains(&"Dormant package with sudden release".to_string()));
        assert!(flags.contains(&"Single maintainer".to_string()));
        assert!(flags.contains(&"Maintainer uses free email domain".to_string()));
        assert!(flags.contains(&"High dependency count: 55".to_string()));
    }
}
