//! Template renderers.
//! The default renderer substitutes `~spwn~key~spwn~` placeholders and leaves
//! every other byte alone. The MiniJinja renderer offers full Jinja syntax for
//! templates that need it.
use crate::constants::SENTINEL;
use crate::error::{Error, Result};
use crate::loader::TemplateStore;
use crate::settings::{value_to_string, EnvironmentView};
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use regex::Regex;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders template text against an environment view.
    ///
    /// # Arguments
    /// * `name` - Template name, used in error messages
    /// * `template` - Raw template text
    /// * `view` - Scope that placeholder keys are looked up in
    ///
    /// # Errors
    /// * `Error::UnresolvedPlaceholderError` if a key is absent from the view
    fn render(&self, name: &str, template: &str, view: &EnvironmentView<'_>) -> Result<String>;
}

/// Selects the rendering engine for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Engine {
    /// `~spwn~key~spwn~` substitution
    #[default]
    Placeholder,
    /// MiniJinja with `{{ key }}` syntax
    Jinja,
}

impl Engine {
    /// Builds the renderer for this engine. The store backs `{% include %}`
    /// for the Jinja engine and is ignored otherwise.
    pub fn renderer<S>(self, store: S) -> Result<Box<dyn TemplateRenderer>>
    where
        S: TemplateStore + Send + Sync + 'static,
    {
        let renderer: Box<dyn TemplateRenderer> = match self {
            Engine::Placeholder => Box::new(PlaceholderRenderer::new()?),
            Engine::Jinja => Box::new(MiniJinjaRenderer::with_store(store)),
        };
        Ok(renderer)
    }
}

/// Replaces sentinel-delimited dotted keys with their values.
#[derive(Debug, Clone)]
pub struct PlaceholderRenderer {
    pattern: Regex,
}

impl PlaceholderRenderer {
    /// Creates a renderer for the `~spwn~` sentinel.
    pub fn new() -> Result<Self> {
        Self::with_sentinel(SENTINEL)
    }

    /// Uses a custom sentinel. Keys can never contain the sentinel because the
    /// match between two sentinels is non-greedy.
    pub fn with_sentinel(sentinel: &str) -> Result<Self> {
        if sentinel.is_empty() {
            return Err(Error::TemplateError("placeholder sentinel cannot be empty".to_string()));
        }
        let sentinel = regex::escape(sentinel);
        let pattern = Regex::new(&format!("{sentinel}(.*?){sentinel}"))
            .map_err(|e| Error::TemplateError(e.to_string()))?;
        Ok(Self { pattern })
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, name: &str, template: &str, view: &EnvironmentView<'_>) -> Result<String> {
        let mut rendered = String::with_capacity(template.len());
        let mut last_end = 0;

        for caps in self.pattern.captures_iter(template) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let key = key.as_str().trim();
            let value = view.lookup(key).ok_or_else(|| Error::UnresolvedPlaceholderError {
                key: key.to_string(),
                template: name.to_string(),
            })?;

            rendered.push_str(&template[last_end..whole.start()]);
            rendered.push_str(&value_to_string(value));
            last_end = whole.end();
        }
        rendered.push_str(&template[last_end..]);

        Ok(rendered)
    }
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer with strict undefined handling, no auto-escaping and
    /// trailing newlines kept, so output differs from input only where
    /// expressions are.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }

    /// Creates a renderer whose `{% include %}` and `{% extends %}` are
    /// resolved through a template store.
    pub fn with_store<S>(store: S) -> Self
    where
        S: TemplateStore + Send + Sync + 'static,
    {
        let mut renderer = Self::new();
        renderer.env.set_loader(move |name| {
            store
                .fetch(name)
                .map(|template| template.map(|t| t.source))
                .map_err(|e| minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string()))
        });
        renderer
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, name: &str, template: &str, view: &EnvironmentView<'_>) -> Result<String> {
        self.env
            .render_named_str(name, template, view.as_map())
            .map_err(|e| match e.kind() {
                ErrorKind::UndefinedError => Error::UnresolvedPlaceholderError {
                    key: e.detail().unwrap_or("undefined value").to_string(),
                    template: name.to_string(),
                },
                _ => Error::MinijinjaError(e),
            })
    }
}
