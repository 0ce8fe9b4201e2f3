//! Source tree enumeration.
//! Walks a source root and classifies every regular file as a template or a
//! passthrough file based on the configured prefix.

use crate::constants::{DEFAULT_PREFIX, PREFIX_ENV_VAR};
use crate::error::{Error, Result};
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name prefix that marks a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix(String);

impl Prefix {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self(prefix.into())
    }

    /// Resolves the prefix from an explicit value, then `CONFSPAWN_PREFIX`,
    /// then the built-in default.
    pub fn resolve(explicit: Option<String>) -> Self {
        Self::resolve_from(explicit, std::env::var(PREFIX_ENV_VAR).ok())
    }

    /// Same as [`Prefix::resolve`] with the environment value passed in.
    pub fn resolve_from(explicit: Option<String>, from_env: Option<String>) -> Self {
        let prefix = explicit
            .or(from_env)
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        Self(prefix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_template(&self, file_name: &str) -> bool {
        !self.0.is_empty() && file_name.starts_with(&self.0)
    }

    /// Removes the prefix from a base file name, if present.
    pub fn strip<'a>(&self, file_name: &'a str) -> &'a str {
        if self.0.is_empty() {
            return file_name;
        }
        file_name.strip_prefix(self.0.as_str()).unwrap_or(file_name)
    }
}

impl Default for Prefix {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Template,
    Passthrough,
}

/// One regular file found under a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Path relative to `root`
    pub relative_path: PathBuf,
    /// Absolute source root the file was found under
    pub root: PathBuf,
    pub recurse: bool,
    pub kind: EntryKind,
}

impl SourceEntry {
    pub fn is_template(&self) -> bool {
        self.kind == EntryKind::Template
    }

    /// Relative path with `/` separators, used as the template name.
    pub fn name(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Enumerates the files of one source root.
///
/// The scanner keeps no state between iterations; every call to
/// [`TreeScanner::entries`] walks the filesystem again.
#[derive(Debug, Clone)]
pub struct TreeScanner {
    root: PathBuf,
    recurse: bool,
    prefix: Prefix,
}

impl TreeScanner {
    /// Creates a scanner for `root`, which must be an existing directory.
    ///
    /// # Errors
    /// * `Error::SourceDoesNotExistError` if the root is missing or not a directory
    pub fn new<P: AsRef<Path>>(root: P, recurse: bool, prefix: &Prefix) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::SourceDoesNotExistError {
                source_dir: root.display().to_string(),
            });
        }
        let root = root.canonicalize()?;

        Ok(Self { root, recurse, prefix: prefix.clone() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn recurse(&self) -> bool {
        self.recurse
    }

    /// Lazily yields the regular files under the root in file-name order.
    pub fn entries(&self) -> impl Iterator<Item = Result<SourceEntry>> + '_ {
        let max_depth = if self.recurse { usize::MAX } else { 1 };

        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |dir_entry| match dir_entry {
                Ok(dir_entry) => {
                    if dir_entry.path().is_file() {
                        Some(self.classify(dir_entry.path()))
                    } else {
                        None
                    }
                }
                Err(e) => Some(Err(e.into())),
            })
    }

    fn classify(&self, path: &Path) -> Result<SourceEntry> {
        let relative_path = path
            .strip_prefix(&self.root)
            .map_err(|e| Error::TemplateError(e.to_string()))?
            .to_path_buf();

        let is_template = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.prefix.is_template(name));

        let kind = if is_template { EntryKind::Template } else { EntryKind::Passthrough };
        debug!("Found {:?} file: {}", kind, relative_path.display());

        Ok(SourceEntry {
            path: path.to_path_buf(),
            relative_path,
            root: self.root.clone(),
            recurse: self.recurse,
            kind,
        })
    }
}

/// Collects every entry under `root`.
pub fn scan<P: AsRef<Path>>(root: P, recurse: bool, prefix: &Prefix) -> Result<Vec<SourceEntry>> {
    TreeScanner::new(root, recurse, prefix)?.entries().collect()
}
