//! Recipes: declarative multi-source, multi-target build plans.
//!
//! ```toml
//! config = "settings.toml"
//!
//! [[sources]]
//! source = "templates/shared"
//! target = "out/app"
//! env = "production"
//! recurse = true
//! ```
//!
//! `env` selects the `confspawn_env` variant. When it also names a section
//! of the settings (say `default.nested`), templates render against that
//! section unless `view` picks another one.

use crate::error::{Error, Result};
use crate::merger::{merge, SourceRoot};
use crate::processor::{
    check_target_outside_sources, resolve_view, spawn_plan, SpawnOptions, SpawnReport,
};
use crate::renderer::Engine;
use crate::scanner::Prefix;
use crate::settings::{load_document, SettingsDocument};
use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One `sources` item of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecipeSource {
    pub source: PathBuf,
    pub target: PathBuf,
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub recurse: bool,
    /// Dotted path of the environment view to render against
    #[serde(default)]
    pub view: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecipeSpec {
    pub config: PathBuf,
    pub sources: Vec<RecipeSource>,
}

impl RecipeSpec {
    /// Loads and validates a recipe. Relative paths inside it are resolved
    /// against the directory holding the recipe file.
    ///
    /// # Errors
    /// * `Error::ParseError` if the document is malformed
    /// * `Error::ValidationError` if required fields are missing
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let spec = Self::from_value(load_document(path)?)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(spec.relative_to(base))
    }

    /// Validates a parsed recipe document.
    pub fn from_value(value: Value) -> Result<Self> {
        let invalid = |msg: &str| Error::ValidationError(msg.to_string());

        let document = value.as_object().ok_or_else(|| invalid("recipe must be a mapping"))?;
        if !document.get("config").is_some_and(Value::is_string) {
            return Err(invalid("recipe requires a 'config' path"));
        }
        let sources = document
            .get("sources")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("recipe requires a 'sources' list"))?;
        if sources.is_empty() {
            return Err(invalid("recipe 'sources' list is empty"));
        }

        for (index, source) in sources.iter().enumerate() {
            for field in ["source", "target"] {
                if source.get(field).is_none() {
                    return Err(Error::ValidationError(format!(
                        "recipe source #{} is missing '{field}'",
                        index + 1
                    )));
                }
            }
        }

        serde_json::from_value(value).map_err(|e| Error::ValidationError(format!("invalid recipe: {e}")))
    }

    fn relative_to(self, base: &Path) -> Self {
        Self {
            config: base.join(self.config),
            sources: self
                .sources
                .into_iter()
                .map(|source| RecipeSource {
                    source: base.join(source.source),
                    target: base.join(source.target),
                    ..source
                })
                .collect(),
        }
    }
}

/// Everything needed to write one target of a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetJob {
    pub target: PathBuf,
    pub env: String,
    pub view: Option<String>,
    pub sources: Vec<SourceRoot>,
}

/// Groups recipe sources by target.
///
/// An explicit `env_override` takes precedence over each entry's own `env`.
///
/// # Errors
/// * `Error::ValidationError` if an entry ends up without an environment, or
///   if entries for one target disagree on environment or view
pub fn plan_targets(spec: &RecipeSpec, env_override: Option<&str>) -> Result<Vec<TargetJob>> {
    let mut jobs: IndexMap<PathBuf, TargetJob> = IndexMap::new();

    for source in &spec.sources {
        let env = env_override
            .map(str::to_string)
            .or_else(|| source.env.clone())
            .ok_or_else(|| {
                Error::ValidationError(format!(
                    "source '{}' has no 'env' and no override was given",
                    source.source.display()
                ))
            })?;

        let root = SourceRoot::new(&source.source, source.recurse);
        match jobs.get_mut(&source.target) {
            Some(job) => {
                if job.env != env || job.view != source.view {
                    return Err(Error::ValidationError(format!(
                        "sources for target '{}' use different environments ('{}' and '{}')",
                        source.target.display(),
                        job.env,
                        env
                    )));
                }
                job.sources.push(root);
            }
            None => {
                jobs.insert(
                    source.target.clone(),
                    TargetJob {
                        target: source.target.clone(),
                        env,
                        view: source.view.clone(),
                        sources: vec![root],
                    },
                );
            }
        }
    }

    Ok(jobs.into_values().collect())
}

/// Options for [`run_recipe`].
#[derive(Debug, Clone, Default)]
pub struct RecipeOptions {
    pub prefix: Prefix,
    pub env_override: Option<String>,
    pub engine: Engine,
}

/// Runs every target of a recipe.
///
/// Validation, settings loading, view resolution, overlap and collision
/// checks for all targets happen before the first target is prepared. The
/// plans merged here are the ones written.
pub fn run_recipe<P: AsRef<Path>>(recipe: P, options: &RecipeOptions) -> Result<Vec<SpawnReport>> {
    let recipe = recipe.as_ref();
    let spec = RecipeSpec::load(recipe)?;
    let jobs = plan_targets(&spec, options.env_override.as_deref())?;
    let settings = SettingsDocument::load(&spec.config)?;

    let all_sources: Vec<SourceRoot> = jobs.iter().flat_map(|job| job.sources.clone()).collect();
    let mut plans = Vec::with_capacity(jobs.len());
    for job in &jobs {
        let scoped = settings.clone().with_env_mode(Some(job.env.as_str()));
        resolve_view(&scoped, Some(job.env.as_str()), job.view.as_deref())?;
        check_target_outside_sources(&job.target, &all_sources)?;
        plans.push(merge(&job.sources, &options.prefix)?);
        debug!("Plan for {} is free of collisions", job.target.display());
    }

    let ignore: HashSet<PathBuf> = HashSet::from([recipe.canonicalize()?]);

    let mut reports = Vec::with_capacity(jobs.len());
    for (job, plan) in jobs.into_iter().zip(&plans) {
        info!("Spawning {} with environment '{}'", job.target.display(), job.env);
        let spawn_options = SpawnOptions {
            prefix: options.prefix.clone(),
            env_mode: Some(job.env),
            view: job.view,
            engine: options.engine,
            ignore: ignore.clone(),
        };
        reports.push(spawn_plan(&settings, plan, &job.target, &spawn_options)?);
    }

    Ok(reports)
}
