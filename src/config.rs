//! Folder list configuration
//!
//! Line-oriented format, one folder per line:
//!
//! ```text
//! /var/data
//! /home/user/docs|.tmp,.bak
//! # comment
//! ```

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// One configured folder: a root to scan and its excluded extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub root: PathBuf,
    pub excluded: HashSet<String>,
}

/// Load the folder list from `path`.
///
/// A missing file means zero folders configured, not an error. Blank and
/// `#`-comment lines are skipped; entries are resolved to absolute paths
/// and deduplicated keeping the first occurrence.
pub fn load(path: &Path) -> Result<Vec<FolderEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    Ok(parse(&contents))
}

fn parse(contents: &str) -> Vec<FolderEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(entry) = parse_line(line) else {
            continue;
        };
        if seen.insert(entry.root.clone()) {
            entries.push(entry);
        }
    }

    entries
}

fn parse_line(line: &str) -> Option<FolderEntry> {
    let (path_part, ext_part) = match line.split_once('|') {
        Some((p, e)) => (p.trim(), Some(e)),
        None => (line, None),
    };
    if path_part.is_empty() {
        return None;
    }

    let excluded = ext_part
        .map(|exts| {
            exts.split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(normalize_extension)
                .collect()
        })
        .unwrap_or_default();

    Some(FolderEntry {
        root: absolutize(Path::new(path_part)),
        excluded,
    })
}

/// Extensions are stored with their leading dot so they compare directly
/// against scanner output.
fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let entries = load(&temp_dir.path().join("absent.conf")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_parse_plain_path() {
        let entries = parse("/data\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].root, PathBuf::from("/data"));
        assert!(entries[0].excluded.is_empty());
    }

    #[test]
    fn test_parse_path_with_extensions() {
        let entries = parse("/data|.tmp,.bak\n");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].excluded.contains(".tmp"));
        assert!(entries[0].excluded.contains(".bak"));
    }

    #[test]
    fn test_extensions_gain_leading_dot() {
        let entries = parse("/data|tmp, bak\n");
        assert!(entries[0].excluded.contains(".tmp"));
        assert!(entries[0].excluded.contains(".bak"));
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        let entries = parse("\n   \n# note\n/data\n");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_duplicate_paths_deduplicated_keeping_first() {
        let entries = parse("/data|.tmp\n/other\n/data|.bak\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].root, PathBuf::from("/data"));
        assert!(entries[0].excluded.contains(".tmp"));
        assert!(!entries[0].excluded.contains(".bak"));
    }

    #[test]
    fn test_relative_paths_resolved_against_cwd() {
        let entries = parse("data\n");
        assert!(entries[0].root.is_absolute());
        assert!(entries[0].root.ends_with("data"));
    }

    #[test]
    fn test_load_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let conf = temp_dir.path().join("folders.conf");
        std::fs::write(&conf, "/data|.tmp\n").unwrap();
        let entries = load(&conf).unwrap();
        assert_eq!(entries.len(), 1);
    }
}
