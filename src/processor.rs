//! Core template processing orchestration.
//! Drives one target through the whole pipeline: settings resolution, source
//! merging, rendering and writing.

use crate::error::{Error, Result};
use crate::loader::{FsTemplateStore, TemplateStore};
use crate::merger::{merge, MergedTargetPlan, SourceRoot};
use crate::renderer::Engine;
use crate::scanner::{Prefix, SourceEntry};
use crate::settings::{EnvironmentView, KeyMatch, SettingsDocument};
use crate::writer::{copy_passthrough, prepare, write_template};
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by every write into one target.
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    pub prefix: Prefix,
    /// Selects the `confspawn_env` variant
    pub env_mode: Option<String>,
    /// Dotted path of the environment view templates render against;
    /// the whole document when unset
    pub view: Option<String>,
    pub engine: Engine,
    /// Absolute paths that are never copied as passthrough files
    pub ignore: HashSet<PathBuf>,
}

/// What a single write produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnReport {
    pub copied: usize,
    pub rendered: Vec<PathBuf>,
}

/// Loads the settings file and writes `target` from the given sources.
pub fn spawn_write<P, Q>(
    config: P,
    sources: &[SourceRoot],
    target: Q,
    options: &SpawnOptions,
) -> Result<SpawnReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let settings = SettingsDocument::load(config)?;
    spawn(&settings, sources, target, options)
}

/// Writes `target` from already loaded settings.
///
/// The merged plan is collision-checked and every template rendered in
/// memory before the target is touched. Only then is the target replaced
/// and populated.
pub fn spawn<Q: AsRef<Path>>(
    settings: &SettingsDocument,
    sources: &[SourceRoot],
    target: Q,
    options: &SpawnOptions,
) -> Result<SpawnReport> {
    let target = target.as_ref();
    let plan = merge(sources, &options.prefix)?;
    check_target_outside_sources(target, sources)?;
    spawn_plan(settings, &plan, target, options)
}

/// Writes `target` from a plan that was merged and overlap-checked earlier.
pub fn spawn_plan<Q: AsRef<Path>>(
    settings: &SettingsDocument,
    plan: &MergedTargetPlan,
    target: Q,
    options: &SpawnOptions,
) -> Result<SpawnReport> {
    let target = target.as_ref();
    let settings = settings.clone().with_env_mode(options.env_mode.as_deref());
    let view = resolve_view(&settings, options.env_mode.as_deref(), options.view.as_deref())?;

    let store = FsTemplateStore::from_plan(plan);
    let renderer = options.engine.renderer(store.clone())?;

    let mut rendered: Vec<(&SourceEntry, String)> = Vec::new();
    for entry in plan.templates() {
        let name = entry.name();
        let template = store
            .fetch(&name)?
            .ok_or_else(|| Error::TemplateError(format!("template '{name}' is missing")))?;
        debug!("Rendering template {} ({:?})", name, template.fingerprint);
        rendered.push((entry, renderer.render(&name, &template.source, &view)?));
    }

    prepare(target)?;
    let copied = copy_passthrough(plan.passthrough(), target, &options.ignore)?;

    let mut written = Vec::with_capacity(rendered.len());
    for (entry, content) in &rendered {
        written.push(write_template(entry, content, target, &options.prefix)?);
    }

    info!(
        "Spawned {} template(s) and copied {} file(s) into {}",
        written.len(),
        copied,
        target.display()
    );
    Ok(SpawnReport { copied, rendered: written })
}

/// Renders a single template file against the settings file and returns the
/// result without writing anything.
pub fn spawn_template<P, Q>(config: P, template: Q, options: &SpawnOptions) -> Result<String>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let template = template.as_ref();
    let settings = SettingsDocument::load(config)?.with_env_mode(options.env_mode.as_deref());
    let view = resolve_view(&settings, options.env_mode.as_deref(), options.view.as_deref())?;

    let source = fs::read_to_string(template)?;
    let name = template
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| template.display().to_string());

    options
        .engine
        .renderer(FsTemplateStore::default())?
        .render(&name, &source, &view)
}

/// Looks up one value from a settings file.
///
/// # Returns
/// * `Ok(None)` if the key is absent and no default was given
pub fn load_config_value<P: AsRef<Path>>(
    config: P,
    key: &str,
    env_mode: Option<&str>,
    key_match: KeyMatch,
    default: Option<serde_json::Value>,
) -> Result<Option<serde_json::Value>> {
    let settings = SettingsDocument::load(config)?.with_env_mode(env_mode);
    let value = settings.view().lookup_with(key, key_match).cloned();
    Ok(value.or(default))
}

/// Picks the view templates render against: an explicit `view` path, else
/// the environment when it names a mapping, else the whole document.
///
/// # Errors
/// * `Error::ValidationError` if an explicit `view` does not resolve
pub(crate) fn resolve_view<'a>(
    settings: &'a SettingsDocument,
    env: Option<&str>,
    view: Option<&str>,
) -> Result<EnvironmentView<'a>> {
    if let Some(path) = view {
        return settings.resolve_env(path).ok_or_else(|| {
            Error::ValidationError(format!("environment '{path}' not found in settings"))
        });
    }

    match env.and_then(|env| settings.resolve_env(env)) {
        Some(scoped) => {
            debug!("Rendering against the '{}' section", env.unwrap_or_default());
            Ok(scoped)
        }
        None => Ok(settings.view()),
    }
}

// Canonical form of `path`, also for paths that do not exist yet: the
// nearest existing ancestor is canonicalized and the rest appended.
fn absolute(path: &Path) -> Result<PathBuf> {
    let path = std::path::absolute(path)?;
    let mut existing = path.as_path();
    while !existing.exists() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => return Ok(path.clone()),
        }
    }

    let rest = path.strip_prefix(existing).map_err(|e| Error::TemplateError(e.to_string()))?;
    Ok(existing.canonicalize()?.join(rest))
}

/// Checks that preparing `target` cannot delete any of `sources` and that no
/// recursive source would scan the target's output.
///
/// # Errors
/// * `Error::ValidationError` if the target equals or contains a source root,
///   or lies inside a recursive one
pub fn check_target_outside_sources(target: &Path, sources: &[SourceRoot]) -> Result<()> {
    let target = absolute(target)?;

    for source in sources {
        let root = absolute(&source.path)?;
        if root.starts_with(&target) || (source.recurse && target.starts_with(&root)) {
            return Err(Error::ValidationError(format!(
                "target '{}' overlaps source '{}'",
                target.display(),
                root.display()
            )));
        }
    }
    Ok(())
}
