//! Recursive directory traversal with exclusion rules

use std::collections::HashSet;
use std::path::PathBuf;
use walkdir::{DirEntry, WalkDir};

/// One candidate file yielded by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Base file name, used as the fingerprint input.
    pub name: String,
    /// Full path, used as the store key.
    pub path: PathBuf,
    /// Directory the file lives in.
    pub folder: PathBuf,
}

/// Lazily walk `root`, yielding every regular file that survives the
/// exclusion rules.
///
/// Hidden entries (leading `.`) are pruned, so hidden directories are
/// never descended into. `excluded` holds extensions with their leading
/// `.` and is matched case-sensitively. Symlinks are not followed and
/// never yielded. Traversal order is filesystem-dependent; callers must
/// not rely on it.
pub fn scan<'a>(
    root: &std::path::Path,
    excluded: &'a HashSet<String>,
) -> impl Iterator<Item = ScannedFile> + 'a {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(move |entry| {
            if is_excluded(&entry, excluded) {
                return None;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path().to_path_buf();
            let folder = path.parent().map(PathBuf::from).unwrap_or_default();
            Some(ScannedFile { name, path, folder })
        })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn is_excluded(entry: &DirEntry, excluded: &HashSet<String>) -> bool {
    if excluded.is_empty() {
        return false;
    }
    match entry.path().extension() {
        Some(ext) => excluded.contains(&format!(".{}", ext.to_string_lossy())),
        None => false,
    }
}
