//! Archive scanner: safely extracts a package tarball into a scratch
//! directory and inspects it for supply-chain abuse patterns.

mod extract;
mod scanner;

use log::warn;

use crate::model::ArchiveSignals;

/// Extracts `bytes` as a gzip-tar archive into a private [`tempfile::TempDir`]
/// and runs the manifest and source-file scanners over it. The scratch
/// directory is destroyed when this function returns, on every exit path.
///
/// Never fails: an unreadable or corrupt archive yields an empty, all-false
/// [`ArchiveSignals`] rather than propagating an error to the orchestrator.
pub fn scan(bytes: &[u8], max_entries: usize) -> ArchiveSignals {
    let mut signals = ArchiveSignals::default();

    let scratch = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => {
            warn!("failed to allocate scratch directory for archive scan: {err}");
            return signals;
        }
    };

    match extract::safe_extract(bytes, scratch.path(), max_entries) {
        Ok(_) => scanner::scan_tree(scratch.path(), &mut signals),
        Err(err) => warn!("archive extraction failed, returning empty signals: {err}"),
    }

    signals
}
