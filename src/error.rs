//! Rich diagnostic error types for narrative-intel.
//!
//! Extraction itself is total and never fails: missing data is reported
//! in-band as empty collections or [`Extracted::NotFound`](crate::narrative::Extracted).
//! The errors here cover the edges around it: configuration files, the
//! preference store, path resolution, and structured payload decoding.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for narrative-intel.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source chains) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum NarrativeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Payload(#[from] PayloadError),

    #[error("failed to read input: {path}")]
    #[diagnostic(
        code(narrative::input),
        help("Check that the input file exists and is readable, or pipe the text on stdin.")
    )]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read extractor config: {path}")]
    #[diagnostic(
        code(narrative::config::read),
        help("Ensure the config file exists and is readable, or omit --config to use defaults.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse extractor config {path}: {message}")]
    #[diagnostic(
        code(narrative::config::parse),
        help("Check the TOML syntax. `narrative-intel config init` writes a valid default file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write extractor config: {path}")]
    #[diagnostic(
        code(narrative::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid extractor config: {field}: {message}")]
    #[diagnostic(
        code(narrative::config::invalid),
        help("Adjust the named field. All day counts and limits must be positive.")
    )]
    Invalid { field: &'static str, message: String },
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StorageError {
    #[error("failed to read preference store: {path}")]
    #[diagnostic(
        code(narrative::storage::read),
        help("Check that the state directory is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("preference store is corrupt: {path}: {message}")]
    #[diagnostic(
        code(narrative::storage::corrupt),
        help(
            "The store must be a flat JSON object of string values. \
             Run `narrative-intel prefs clear` to reset it."
        )
    )]
    Corrupt { path: String, message: String },

    #[error("failed to write preference store: {path}")]
    #[diagnostic(
        code(narrative::storage::write),
        help("Ensure the state directory exists and you have write permissions.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Path errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(narrative::paths::no_home),
        help("Set the HOME environment variable, or pass --config and --state-dir explicitly.")
    )]
    NoHome,
}

// ---------------------------------------------------------------------------
// Payload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PayloadError {
    #[error("structured analysis payload has an unexpected shape: {message}")]
    #[diagnostic(
        code(narrative::payload::shape),
        help(
            "The input parsed as JSON but does not match the analysis schema. \
             Expected an object with `branches`, `gates`, `matrix`, \
             `market_validation`, and/or `raw_analysis` fields."
        )
    )]
    Shape { message: String },

    #[error("failed to serialize report: {message}")]
    #[diagnostic(code(narrative::payload::serialize))]
    Serialize { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type StorageResult<T> = std::result::Result<T, StorageError>;
pub type PathResult<T> = std::result::Result<T, PathError>;
pub type PayloadResult<T> = std::result::Result<T, PayloadError>;

/// Convenience alias for functions returning narrative-intel results.
pub type NarrativeResult<T> = std::result::Result<T, NarrativeError>;
