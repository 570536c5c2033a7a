//! Safe extraction of a gzip-tar archive into a private scratch directory.
//!
//! The only defense this module is responsible for is path-traversal: an
//! archive member whose name is absolute or contains a `..` segment is
//! rejected and skipped rather than extracted, so a malicious tarball can
//! never write outside the destination directory.

use std::io::Read;
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use log::warn;
use tar::Archive;

/// Returns true if `name` is safe to extract relative to the destination
/// root: not absolute, and containing no `..` component.
fn is_safe_entry(name: &Path) -> bool {
    if name.is_absolute() {
        return false;
    }
    !name
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

/// Extracts the surviving members of the archive at `bytes` into `dest`.
/// Skips (and logs) unsafe or unreadable members rather than failing the
/// whole extraction; returns the count of members actually extracted.
pub fn safe_extract(bytes: &[u8], dest: &Path, max_entries: usize) -> anyhow::Result<usize> {
    std::fs::create_dir_all(dest)?;

    let decoder = GzDecoder::new(bytes);
    let mut archive = Archive::new(decoder);
    let mut extracted = 0usize;

    for entry in archive.entries()? {
        if extracted >= max_entries {
            warn!("archive exceeds {max_entries} entries, truncating extraction");
            break;
        }

        let mut entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable archive entry: {err}");
                continue;
            }
        };

        let path = match entry.path() {
            Ok(path) => path.into_owned(),
            Err(err) => {
                warn!("skipping archive entry with unreadable path: {err}");
                continue;
            }
        };

        if !is_safe_entry(&path) {
            warn!("skipping unsafe archive entry: {}", path.display());
            continue;
        }

        let target = dest.join(&path);
        if entry.header().entry_type().is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if !entry.header().entry_type().is_file() {
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut buf = Vec::new();
        if let Err(err) = entry.read_to_end(&mut buf) {
            warn!("skipping archive entry that failed to read: {err}");
            continue;
        }
        std::fs::write(&target, buf)?;
        extracted += 1;
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *content).unwrap();
        }
        let tar_bytes = builder.into_inner().unwrap();

        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        std::io::Write::write_all(&mut encoder, &tar_bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn extracts_well_formed_entries() {
        let archive = build_tar_gz(&[("package/package.json", b"{}")]);
        let dir = tempfile::tempdir().unwrap();
        let count = safe_extract(&archive, dir.path(), 1000).unwrap();
        assert_eq!(count, 1);
        assert!(dir.path().join("package/package.json").exists());
    }

    #[test]
    fn rejects_parent_dir_traversal() {
        let archive = build_tar_gz(&[("../evil", b"pwned")]);
        let dir = tempfile::tempdir().unwrap();
        let count = safe_extract(&archive, dir.path(), 1000).unwrap();
        assert_eq!(count, 0);
        assert!(!dir.path().parent().unwrap().join("evil").exists());
    }

    #[test]
    fn rejects_absolute_paths() {
        let archive = build_tar_gz(&[("/etc/passwd", b"pwned")]);
        let dir = tempfile::tempdir().unwrap();
        let count = safe_extract(&archive, dir.path(), 1000).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn legitimate_entries_survive_alongside_unsafe_ones() {
        let archive = build_tar_gz(&[
            ("package/index.js", b"console.log(1)"),
            ("../evil", b"pwned"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let count = safe_extract(&archive, dir.path(), 1000).unwrap();
        assert_eq!(count, 1);
        assert!(dir.path().join("package/index.js").exists());
    }
}
