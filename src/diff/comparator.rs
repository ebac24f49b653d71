//! Directory tree comparison
//!
//! Produces a single unified diff between two extracted source trees. Files only
//! in the old tree are rendered as deletions, files only in the new tree as
//! additions, and files present in both as regular unified diffs. Binary and
//! unreadable files are skipped. Output is deterministic: deletions, then
//! additions, then modifications, each sorted by relative path.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use tracing::debug;
use walkdir::WalkDir;

use crate::diff::binary::is_binary;
use crate::diff::myers::unified_diff;

/// Sentinel used as the file name of a missing side
pub const NO_FILE: &str = "/dev/null";

/// Compares two source directories and generates a unified diff
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceComparator;

impl SourceComparator {
    pub fn new() -> Self {
        Self
    }

    /// Recursively compares `old_dir` with `new_dir`.
    ///
    /// Returns an empty string when there are no textual differences.
    pub fn compare_directories(&self, old_dir: &Path, new_dir: &Path) -> String {
        let old_files = collect_files(old_dir);
        let new_files = collect_files(new_dir);

        let mut lines: Vec<String> = Vec::new();

        for rel in old_files.difference(&new_files) {
            let old_file = old_dir.join(rel);
            if is_binary(&old_file) {
                continue;
            }
            lines.push(format!("--- a/{rel}"));
            lines.push(format!("+++ {NO_FILE}"));
            lines.extend(read_lines(&old_file).iter().map(|l| format!("-{l}")));
        }

        for rel in new_files.difference(&old_files) {
            let new_file = new_dir.join(rel);
            if is_binary(&new_file) {
                continue;
            }
            lines.push(format!("--- {NO_FILE}"));
            lines.push(format!("+++ b/{rel}"));
            lines.extend(read_lines(&new_file).iter().map(|l| format!("+{l}")));
        }

        for rel in old_files.intersection(&new_files) {
            let old_file = old_dir.join(rel);
            let new_file = new_dir.join(rel);
            if is_binary(&old_file) || is_binary(&new_file) {
                continue;
            }

            let old_content = read_lines(&old_file);
            let new_content = read_lines(&new_file);
            let old_lines: Vec<&str> = old_content.iter().map(String::as_str).collect();
            let new_lines: Vec<&str> = new_content.iter().map(String::as_str).collect();

            lines.extend(unified_diff(
                &format!("a/{rel}"),
                &format!("b/{rel}"),
                &old_lines,
                &new_lines,
            ));
        }

        lines.join("\n")
    }
}

/// Collects every regular file under `root` as a `/`-separated relative path.
/// Symbolic links are neither followed nor reported.
fn collect_files(root: &Path) -> BTreeSet<String> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| {
            entry
                .inspect_err(|e| debug!("Skipping unreadable entry under {:?}: {}", root, e))
                .ok()
        })
        .filter(|entry| {
            let regular = entry.file_type().is_file();
            if !regular && entry.path_is_symlink() {
                debug!("Skipping symbolic link {:?}", entry.path());
            }
            regular
        })
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(root).ok()?;
            Some(to_slash_path(rel))
        })
        .collect()
}

fn to_slash_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads a file as lossy UTF-8 lines without terminators. Unreadable files yield
/// no lines.
fn read_lines(path: &Path) -> Vec<String> {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect(),
        Err(e) => {
            debug!("Failed to read {:?}: {}", path, e);
            Vec::new()
        }
    }
}
