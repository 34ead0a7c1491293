//! Change classification against the state store

use crate::fingerprint::{fingerprint, mtime_text};
use crate::scanner::ScannedFile;
use crate::store::{normalize_path, ChangeStore, StoreError};

/// Outcome of classifying one scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// No record existed; one was created.
    New,
    /// The stored fingerprint differed; the record was updated.
    Changed,
    /// Fingerprint matches the record; no write performed.
    Unchanged,
}

impl Change {
    pub fn is_change(self) -> bool {
        matches!(self, Change::New | Change::Changed)
    }
}

/// Classify `file` against `table`, writing to the store on NEW/CHANGED.
///
/// One point read plus at most one write per file. Order-independent:
/// the result depends only on the file's own record.
pub fn classify(
    store: &ChangeStore,
    table: &str,
    file: &ScannedFile,
) -> Result<Change, StoreError> {
    let fp = fingerprint(&file.name, &mtime_text(&file.path));
    let key = normalize_path(&file.path);

    match store.lookup(&key, table)? {
        None => {
            store.insert(&key, &fp, table)?;
            Ok(Change::New)
        }
        Some(existing) if existing != fp => {
            store.update(&key, &fp, table)?;
            Ok(Change::Changed)
        }
        Some(_) => Ok(Change::Unchanged),
    }
}
