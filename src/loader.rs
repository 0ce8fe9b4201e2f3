//! Template store capability.
//! A store knows which templates exist and hands out their raw text together
//! with a modification fingerprint. Renderers never touch the filesystem
//! themselves; they are fed from a store.

use crate::error::Result;
use crate::merger::{merge, MergedTargetPlan, SourceRoot};
use crate::scanner::Prefix;
use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Raw template text as fetched from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTemplate {
    pub name: String,
    pub source: String,
    /// Last modification time, when the platform reports one
    pub fingerprint: Option<SystemTime>,
}

/// Trait for sources of templates.
pub trait TemplateStore {
    /// Names of all available templates, relative to the store's root(s).
    fn list_templates(&self) -> Vec<String>;

    /// Fetches one template by name.
    ///
    /// # Returns
    /// * `Ok(None)` if the store has no template with that name
    fn fetch(&self, name: &str) -> Result<Option<StoredTemplate>>;
}

/// Template store backed by files found while scanning source roots.
#[derive(Debug, Clone, Default)]
pub struct FsTemplateStore {
    templates: IndexMap<String, PathBuf>,
}

impl FsTemplateStore {
    /// Builds a store over the templates of a merged plan.
    pub fn from_plan(plan: &MergedTargetPlan) -> Self {
        let templates = plan
            .templates()
            .map(|entry| (entry.name(), entry.path.clone()))
            .collect();
        Self { templates }
    }

    /// Builds a store over a single source root.
    pub fn scan<P: AsRef<Path>>(root: P, recurse: bool, prefix: &Prefix) -> Result<Self> {
        let plan = merge(&[SourceRoot::new(root.as_ref(), recurse)], prefix)?;
        Ok(Self::from_plan(&plan))
    }
}

impl TemplateStore for FsTemplateStore {
    fn list_templates(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    fn fetch(&self, name: &str) -> Result<Option<StoredTemplate>> {
        let Some(path) = self.templates.get(name) else {
            return Ok(None);
        };
        debug!("Reading template {}", path.display());

        let source = fs::read_to_string(path)?;
        let fingerprint = fs::metadata(path)?.modified().ok();

        Ok(Some(StoredTemplate { name: name.to_string(), source, fingerprint }))
    }
}

/// Lists the relative names of the templates under `root`.
pub fn list_templates<P: AsRef<Path>>(root: P, recurse: bool, prefix: &Prefix) -> Result<Vec<String>> {
    Ok(FsTemplateStore::scan(root, recurse, prefix)?.list_templates())
}
