//! Error handling for stamp.
//! Defines the error type and result alias used throughout the crate.

use std::io;
use thiserror::Error;

/// Errors that can occur while gathering and rendering templates.
///
/// Every failure is single-attempt: nothing in the crate retries, the first
/// error stops the run and is returned to the caller with its context attached.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// The input directory is missing, unreadable, or ignore matching failed.
    #[error("failed to walk '{path}': {source}")]
    TraversalError {
        path: String,
        #[source]
        source: ignore::Error,
    },

    /// A named input could not be opened or fully read.
    #[error("failed to load contents of '{name}': {source}")]
    LoadError {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The templated output mapping failed to execute.
    #[error("failed to render outputMap with ctx {context} and inPath {in_path}: {source}")]
    NamingError {
        context: String,
        in_path: String,
        #[source]
        source: minijinja::Error,
    },

    /// The output path is an existing directory.
    #[error("output path '{path}' is a directory")]
    IsDirectoryError { path: String },

    /// Template compilation or execution failed.
    #[error("Template error: {0}.")]
    ExecutionError(#[from] minijinja::Error),

    /// Changing the permissions of an existing output failed.
    #[error("failed to chmod output file '{path}' with mode {mode:o}: {source}")]
    PermissionError {
        path: String,
        mode: u32,
        #[source]
        source: io::Error,
    },

    /// Represents errors that occur during configuration parsing or validation
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// A data source could not be resolved.
    #[error("failed to resolve datasource '{alias}': {reason}")]
    DataSourceError { alias: String, reason: String },

    /// The render pass was cancelled between units.
    #[error("rendering cancelled before template `{next}`")]
    CancelledError { next: String },

    #[error("failed to gather templates for rendering: {0}")]
    GatherError(#[source] Box<Error>),

    #[error("failed to render template `{name}`: {source}")]
    RenderError {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

/// Convenience type alias for Results with stamp's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
