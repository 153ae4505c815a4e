//! Staging directories for bulk backends
//!
//! A bulk backend moves whole subtrees, so filtering happens locally: the tree
//! is copied through the ignore filter into a private directory which is then
//! transferred in one call. The directory is removed when `StagingDir` drops,
//! on success and failure paths alike.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::read_dir_sorted;
use crate::domain::value_objects::IgnoreFilter;

/// Scoped temporary directory
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
}

impl StagingDir {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(".ferry-staging-")
            .tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Why an entry was left out of a filtered copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Ignored,
    SymlinkCycle,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            SkipReason::Ignored => super::MATCHES_IGNORE,
            SkipReason::SymlinkCycle => "symlink cycle not followed",
        }
    }
}

/// What a filtered copy did, by path relative to the copy root
#[derive(Debug, Default)]
pub struct CopyReport {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Copy `src` into `dst`, leaving out entries the filter matches.
///
/// Symlinks are dereferenced. An ignored directory is not descended into.
/// Errors on individual entries are collected in the report; only failing to
/// read or create the roots is an error.
pub fn copy_filtered(src: &Path, dst: &Path, filter: &IgnoreFilter) -> io::Result<CopyReport> {
    let mut report = CopyReport::default();
    let mut ancestors = HashSet::new();
    ancestors.insert(fs::canonicalize(src)?);
    fs::create_dir_all(dst)?;
    copy_dir(src, dst, Path::new(""), filter, &mut ancestors, &mut report)?;
    Ok(report)
}

fn copy_dir(
    src: &Path,
    dst: &Path,
    rel: &Path,
    filter: &IgnoreFilter,
    ancestors: &mut HashSet<PathBuf>,
    report: &mut CopyReport,
) -> io::Result<()> {
    for entry in read_dir_sorted(src)? {
        let name = entry.file_name();
        let child_rel = rel.join(&name);
        let path = entry.path();

        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) => {
                let message = if entry.file_type().is_ok_and(|t| t.is_symlink()) {
                    format!("broken symlink: {}", e)
                } else {
                    e.to_string()
                };
                report.failed.push((child_rel, message));
                continue;
            }
        };

        if filter.matches(&child_rel, meta.is_dir()) {
            report.skipped.push((child_rel, SkipReason::Ignored));
            continue;
        }

        let target = dst.join(&name);
        if meta.is_dir() {
            let canonical = match fs::canonicalize(&path) {
                Ok(p) => p,
                Err(e) => {
                    report.failed.push((child_rel, e.to_string()));
                    continue;
                }
            };
            if ancestors.contains(&canonical) {
                report.skipped.push((child_rel, SkipReason::SymlinkCycle));
                continue;
            }
            if let Err(e) = fs::create_dir_all(&target) {
                report.failed.push((child_rel, e.to_string()));
                continue;
            }
            ancestors.insert(canonical.clone());
            let result = copy_dir(&path, &target, &child_rel, filter, ancestors, report);
            ancestors.remove(&canonical);
            if let Err(e) = result {
                report.failed.push((child_rel, e.to_string()));
            }
        } else {
            match fs::copy(&path, &target) {
                Ok(_) => report.copied.push(child_rel),
                Err(e) => report.failed.push((child_rel, e.to_string())),
            }
        }
    }
    Ok(())
}
