//! Settings documents and environment views.
//! A settings file (TOML, JSON or YAML) is loaded once into an immutable
//! mapping tree. Dotted paths narrow it to an [`EnvironmentView`], which is the
//! scope placeholders are resolved against.

use crate::constants::ENV_SECTION;
use crate::error::{Error, Result};
use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// On-disk formats understood by [`load_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from the file extension, falling back to TOML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Self::Json,
            Some("yml") | Some("yaml") => Self::Yaml,
            _ => Self::Toml,
        }
    }
}

/// How keys are compared while walking a dotted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMatch {
    /// Only the exact key matches
    #[default]
    Exact,
    /// Try the exact key, then the lowercase key for an all-uppercase
    /// segment or the uppercase key for an all-lowercase segment
    CaseFallback,
}

/// Reads and parses a structured document, returning its raw value tree.
///
/// # Errors
/// * `Error::IoError` if the file cannot be read
/// * `Error::ParseError` if the content is malformed for its format
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    debug!("Loading document from {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_document(&content, DocumentFormat::from_path(path), &path.display().to_string())
}

/// Parses document text in the given format. `origin` names the document in
/// error messages.
pub fn parse_document(content: &str, format: DocumentFormat, origin: &str) -> Result<Value> {
    let parse_error = |reason: String| Error::ParseError { path: origin.to_string(), reason };

    match format {
        DocumentFormat::Toml => content
            .parse::<toml::Table>()
            .map(|table| toml_to_json(toml::Value::Table(table)))
            .map_err(|e| parse_error(e.to_string())),
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(content).map_err(|e| parse_error(e.to_string()))
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(content).map_err(|e| parse_error(e.to_string()))
        }
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(non_finite_text(f))),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            Value::Object(table.into_iter().map(|(k, v)| (k, toml_to_json(v))).collect())
        }
    }
}

/// Formats a resolved value for substitution into text.
///
/// Strings are used verbatim, other scalars in their canonical form and
/// sequences or mappings as compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A loaded settings tree. Never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDocument {
    root: Map<String, Value>,
}

impl SettingsDocument {
    /// Loads a settings document from a TOML, JSON or YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let value = load_document(path)?;
        Self::from_value(value, &path.display().to_string())
    }

    /// Wraps an already parsed value; the top level must be a mapping.
    pub fn from_value(value: Value, origin: &str) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(Error::ParseError {
                path: origin.to_string(),
                reason: format!("top level must be a mapping, found {other}"),
            }),
        }
    }

    /// Applies the environment mode to the `confspawn_env` section.
    ///
    /// When the mode names one of the section's sub-keys, the section is
    /// replaced by that sub-value. Otherwise the section is removed. Documents
    /// without the section are returned unchanged.
    pub fn with_env_mode(mut self, mode: Option<&str>) -> Self {
        let Some(section) = self.root.remove(ENV_SECTION) else {
            return self;
        };

        let selected = match (mode, section) {
            (Some(mode), Value::Object(mut variants)) => variants.remove(mode),
            _ => None,
        };

        match selected {
            Some(variant) => {
                debug!("Selected '{}' variant of '{}'", mode.unwrap_or_default(), ENV_SECTION);
                self.root.insert(ENV_SECTION.to_string(), variant);
            }
            None => debug!("No matching '{}' variant, dropping the section", ENV_SECTION),
        }
        self
    }

    /// The whole document as a view.
    pub fn view(&self) -> EnvironmentView<'_> {
        EnvironmentView { map: &self.root }
    }

    /// Narrows the document to the mapping at `path`. The empty path is the
    /// whole document.
    pub fn resolve_env(&self, path: &str) -> Option<EnvironmentView<'_>> {
        self.view().resolve(path)
    }

    /// Looks up a dotted key from the document root.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.view().lookup(key)
    }
}

/// A borrowed sub-mapping of a [`SettingsDocument`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentView<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> EnvironmentView<'a> {
    pub fn as_map(&self) -> &'a Map<String, Value> {
        self.map
    }

    /// Follows `path` through nested mappings. Any missing or non-mapping
    /// segment makes the whole resolution absent.
    pub fn resolve(&self, path: &str) -> Option<EnvironmentView<'a>> {
        let mut current = self.map;
        for segment in segments(path) {
            current = get_key(current, segment, KeyMatch::Exact)?.as_object()?;
        }
        Some(EnvironmentView { map: current })
    }

    /// Looks up a dotted key using exact key matching.
    pub fn lookup(&self, key: &str) -> Option<&'a Value> {
        self.lookup_with(key, KeyMatch::Exact)
    }

    /// Looks up a dotted key. Null values count as absent.
    pub fn lookup_with(&self, key: &str, key_match: KeyMatch) -> Option<&'a Value> {
        let path = segments(key);
        let (last, parents) = path.split_last()?;

        let mut current = self.map;
        for segment in parents {
            current = get_key(current, segment, key_match)?.as_object()?;
        }
        get_key(current, last, key_match)
    }
}

fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

fn get_key<'a>(map: &'a Map<String, Value>, key: &str, key_match: KeyMatch) -> Option<&'a Value> {
    let found = map.get(key).filter(|v| !v.is_null());
    if found.is_some() || key_match == KeyMatch::Exact {
        return found;
    }

    let has_upper = key.chars().any(char::is_uppercase);
    let has_lower = key.chars().any(char::is_lowercase);
    let alternative = match (has_upper, has_lower) {
        (true, false) => key.to_lowercase(),
        (false, true) => key.to_uppercase(),
        _ => return None,
    };
    map.get(&alternative).filter(|v| !v.is_null())
}

// JSON has no nan or inf, so these keep their TOML spelling.
fn non_finite_text(f: f64) -> String {
    let sign = if f.is_sign_negative() { "-" } else { "" };
    if f.is_nan() {
        format!("{sign}nan")
    } else {
        format!("{sign}inf")
    }
}
