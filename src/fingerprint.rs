//! Metadata fingerprinting for change detection

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Compute the change-detection fingerprint for a file.
///
/// The digest covers the logical name and the textual mtime only; file
/// content is never read. A content edit that leaves the mtime untouched
/// is invisible to this scheme, which is the accepted trade-off for
/// metadata-only detection.
pub fn fingerprint(name: &str, mtime: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(name.as_bytes());
    hasher.update(mtime.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Serialize a file's mtime to a stable textual form.
///
/// A failed stat degrades to the epoch sentinel instead of an error, so the
/// file keeps a stable (identical) fingerprint until a stat succeeds.
pub fn mtime_text(path: &Path) -> String {
    let mtime = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(UNIX_EPOCH);
    format_mtime(mtime)
}

fn format_mtime(mtime: SystemTime) -> String {
    let (secs, nsecs) = match mtime.duration_since(UNIX_EPOCH) {
        Ok(d) => (d.as_secs(), d.subsec_nanos()),
        Err(_) => (0, 0),
    };
    format!("{}.{:09}", secs, nsecs)
}
