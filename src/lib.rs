//! confspawn builds concrete configuration files from a directory of templates
//! and a settings file. Template placeholders are resolved against an
//! environment-scoped view of the settings, and several template directories
//! can be merged into one target without silent collisions.

/// Command-line interface module for confspawn
pub mod cli;

/// Common constants: default prefix, environment variable names, sentinel
pub mod constants;

/// Error types and handling for confspawn
pub mod error;

/// Template store capability used by the renderers
pub mod loader;

/// Logging setup for the binary
pub mod logger;

/// Collision-checked merging of several source roots
pub mod merger;

/// Single-target orchestration
/// Combines all components to generate one target directory
pub mod processor;

/// Multi-source, multi-target recipes
pub mod recipe;

/// Placeholder and MiniJinja template rendering
pub mod renderer;

/// Source tree enumeration and template classification
pub mod scanner;

/// Settings documents and environment views
pub mod settings;

/// Target directory preparation and writing
pub mod writer;
