//! Maintainer-posture analyzer.

use crate::model::{Maintainer, MaintainerSignals, RepositoryField};

/// Free email providers; a maintainer publishing under one of these rather
/// than an organizational address is a (weak) independent-actor signal.
const FREE_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "mail.com",
    "protonmail.com",
    "icloud.com",
    "live.com",
    "msn.com",
    "yandex.com",
    "zoho.com",
    "gmx.com",
    "fastmail.com",
    "tutanota.com",
];

fn email_domain_is_free(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((_, domain)) => FREE_EMAIL_DOMAINS.contains(&domain.to_lowercase().as_str()),
        None => false,
    }
}

fn repository_url(repository: Option<&RepositoryField>) -> Option<String> {
    repository.and_then(|r| r.url()).map(str::to_string)
}

pub fn analyze(maintainers: &[Maintainer], repository: Option<&RepositoryField>) -> MaintainerSignals {
    let has_free_email = maintainers
        .iter()
        .filter_map(|m| m.email.as_deref())
        .any(email_domain_is_free);

    let has_github_repo = repository_url(repository)
        .map(|url| url.to_lowercase().contains("github.com"))
        .unwrap_or(false);

    MaintainerSignals {
        count: maintainers.len(),
        maintainers: maintainers.to_vec(),
        has_free_email,
        has_github_repo,
        has_recent_addition: false,
    }
}
