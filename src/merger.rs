//! Merging several source roots into one target plan.

use crate::error::{Error, Result};
use crate::scanner::{Prefix, SourceEntry, TreeScanner};
use indexmap::IndexMap;
use log::debug;
use std::path::{Path, PathBuf};

/// A source root and whether it is walked recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    pub path: PathBuf,
    pub recurse: bool,
}

impl SourceRoot {
    pub fn new<P: Into<PathBuf>>(path: P, recurse: bool) -> Self {
        Self { path: path.into(), recurse }
    }
}

/// The collision-checked set of files that populate one target.
#[derive(Debug, Clone, Default)]
pub struct MergedTargetPlan {
    entries: IndexMap<PathBuf, SourceEntry>,
}

impl MergedTargetPlan {
    /// Entries in scan order: roots in the order given, files in name order.
    pub fn entries(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries.values()
    }

    pub fn templates(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries().filter(|entry| entry.is_template())
    }

    pub fn passthrough(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries().filter(|entry| !entry.is_template())
    }

    pub fn get<P: AsRef<Path>>(&self, relative_path: P) -> Option<&SourceEntry> {
        self.entries.get(relative_path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, entry: SourceEntry) -> Result<()> {
        if let Some(existing) = self.entries.get(&entry.relative_path) {
            return Err(Error::CollisionError {
                first_root: existing.root.display().to_string(),
                second_root: entry.root.display().to_string(),
                relative_path: entry.relative_path.display().to_string(),
            });
        }
        self.entries.insert(entry.relative_path.clone(), entry);
        Ok(())
    }
}

/// Scans every root in order and merges their files into one plan.
///
/// # Errors
/// * `Error::CollisionError` as soon as a relative path is seen twice; the
///   root that provided it first is reported first
/// * `Error::SourceDoesNotExistError` if a root is missing
pub fn merge(sources: &[SourceRoot], prefix: &Prefix) -> Result<MergedTargetPlan> {
    let mut plan = MergedTargetPlan::default();

    for source in sources {
        let scanner = TreeScanner::new(&source.path, source.recurse, prefix)?;
        debug!("Merging files from {}", scanner.root().display());
        for entry in scanner.entries() {
            plan.insert(entry?)?;
        }
    }

    debug!("Merged plan holds {} files from {} root(s)", plan.len(), sources.len());
    Ok(plan)
}
