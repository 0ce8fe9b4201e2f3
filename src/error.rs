//! Error handling for confspawn.
//! Defines the error type and result alias used throughout the crate.

use std::io;
use thiserror::Error;

/// Errors that can occur while resolving settings and generating targets.
///
/// Every variant is fatal: callers propagate it to the process boundary,
/// where [`default_error_handler`] reports it.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// A settings or recipe document could not be parsed
    #[error("Failed to parse '{path}': {reason}")]
    ParseError { path: String, reason: String },

    /// Missing recipe fields, ambiguous environments and similar input problems
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Two source roots provide the same relative path for one target
    #[error("Path collision: '{relative_path}' is provided by both '{first_root}' and '{second_root}'")]
    CollisionError {
        first_root: String,
        second_root: String,
        relative_path: String,
    },

    /// A rendered template would replace a file already written to the target
    #[error("Destination '{destination}' already exists, refusing to write template '{template}' over it")]
    DestinationExistsError { destination: String, template: String },

    /// A placeholder names a key missing from the environment view
    #[error("Unresolved placeholder '{key}' in template '{template}'")]
    UnresolvedPlaceholderError { key: String, template: String },

    #[error("Source directory '{source_dir}' does not exist")]
    SourceDoesNotExistError { source_dir: String },

    /// Template engine failures other than unresolved keys
    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Template engine error: {0}")]
    MinijinjaError(#[from] minijinja::Error),
}

/// Convenience type alias for results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::IoError(err.into())
    }
}

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
