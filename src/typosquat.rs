//! Typosquat detection: compares a package name against a curated list of
//! popular packages using Levenshtein edit distance.

use crate::model::{TyposquatMatch, TyposquatSignals};

/// Packages popular enough that a near-miss name on them is suspicious.
/// Mirrors the curated list used to seed the original heuristic; trimmed to
/// the names most commonly impersonated rather than reproduced in full.
pub const POPULAR_PACKAGES: &[&str] = &[
    "react",
    "react-dom",
    "vue",
    "angular",
    "lodash",
    "express",
    "axios",
    "webpack",
    "babel",
    "jquery",
    "moment",
    "chalk",
    "commander",
    "debug",
    "async",
    "request",
    "underscore",
    "bluebird",
    "colors",
    "mkdirp",
    "yargs",
    "glob",
    "minimist",
    "semver",
    "uuid",
    "rimraf",
    "typescript",
    "eslint",
    "prettier",
    "jest",
    "mocha",
    "chai",
    "sinon",
    "nodemon",
    "dotenv",
    "cors",
    "body-parser",
    "socket.io",
    "redux",
    "next",
    "gatsby",
    "vite",
    "rollup",
    "parcel",
    "tslib",
    "core-js",
    "regenerator-runtime",
    "classnames",
    "prop-types",
    "styled-components",
    "node-fetch",
    "ws",
    "graphql",
    "apollo-client",
    "mongoose",
    "sequelize",
    "pg",
    "mysql",
    "redis",
    "ioredis",
    "winston",
    "morgan",
    "helmet",
    "passport",
    "jsonwebtoken",
    "bcrypt",
    "multer",
    "nodemailer",
    "aws-sdk",
    "stripe",
    "firebase",
    "numpy",
    "pandas",
    "requests",
    "flask",
    "django",
    "pytest",
    "pyyaml",
    "boto3",
    "setuptools",
];

/// Iterative edit distance over the full matrix (two rolling rows), avoiding
/// the stack growth of a recursive definition.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (alen, blen) = (a.len(), b.len());

    if alen == 0 {
        return blen;
    }
    if blen == 0 {
        return alen;
    }

    let mut prev_row: Vec<usize> = (0..=blen).collect();
    let mut curr_row = vec![0usize; blen + 1];

    for i in 1..=alen {
        curr_row[0] = i;
        for j in 1..=blen {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr_row[j] = (curr_row[j - 1] + 1)
                .min(prev_row[j] + 1)
                .min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[blen]
}

/// Finds popular packages within edit distance `max_distance` of `name`,
/// excluding an exact match (a package is never a typosquat of itself).
/// Matches are returned in `POPULAR_PACKAGES` iteration order, not sorted by
/// distance, matching the detector's documented contract.
pub fn find_matches(name: &str, max_distance: usize) -> Vec<TyposquatMatch> {
    let name = name.to_lowercase();
    let mut matches = Vec::new();
    for &popular in POPULAR_PACKAGES {
        if popular == name {
            continue;
        }
        let distance = levenshtein_distance(&name, popular);
        if distance > 0 && distance <= max_distance {
            let suspicion = if distance == 1 { "high" } else { "medium" };
            matches.push(TyposquatMatch {
                popular_package: popular.to_string(),
                distance,
                suspicion: suspicion.to_string(),
            });
        }
    }
    matches
}

/// Runs the full typosquat detector over a query name, producing the
/// min-distance-over-all-matches summary the scoring engine consumes.
pub fn analyze(name: &str, max_distance: usize) -> TyposquatSignals {
    let matches = find_matches(name, max_distance);
    let min_distance = matches.iter().map(|m| m.distance).min().unwrap_or(999);
    TyposquatSignals {
        min_distance,
        matches,
    }
}

/// Whether `name` is itself one of the baked-in popular packages (used by
/// the scoring engine's popular-but-typosquat special case).
pub fn is_popular(name: &str) -> bool {
    let name = name.to_lowercase();
    POPULAR_PACKAGES.contains(&name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_have_zero_distance() {
        assert_eq!(levenshtein_distance("react", "react"), 0);
    }

    #[test]
    fn single_substitution_has_distance_one() {
        assert_eq!(levenshtein_distance("reqct", "react"), 1);
    }

    #[test]
    fn single_insertion_has_distance_one() {
        assert_eq!(levenshtein_distance("reactt", "react"), 1);
    }

    #[test]
    fn empty_string_distance_is_the_other_lengths() {
        assert_eq!(levenshtein_distance("", "react"), 5);
        assert_eq!(levenshtein_distance("react", ""), 5);
    }

    #[test]
    fn exact_match_is_excluded_from_results() {
        let matches = find_matches("react", 2);
        assert!(matches.iter().all(|m| m.popular_package != "react"));
    }

    #[test]
    fn close_typo_is_flagged_as_high_suspicion() {
        let matches = find_matches("raect", 2);
        let m = matches
            .iter()
            .find(|m| m.popular_package == "react")
            .expect("raect should match react");
        assert_eq!(m.distance, 2);
    }

    #[test]
    fn unrelated_name_has_no_matches_within_small_distance() {
        let matches = find_matches("my-totally-unrelated-internal-tool", 2);
        assert!(matches.is_empty());
    }
}
