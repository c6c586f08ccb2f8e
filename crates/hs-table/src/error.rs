//! Error types for the hs-table engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the tabular engine.
#[derive(Error, Debug)]
pub enum TableError {
    /// I/O failure reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An input file could not be parsed as a tree file.
    #[error("malformed tree file {path}: {reason}")]
    Malformed {
        /// Offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A resolved input file lacks the requested tree.
    #[error("tree '{tree}' not found in {file} (available: {available})")]
    TreeMissing {
        /// File that was searched.
        file: PathBuf,
        /// Tree name that was requested.
        tree: String,
        /// Comma-separated list of trees the file does contain.
        available: String,
    },

    /// Columns disagree in length or presence across a frame or chain.
    #[error("column mismatch: {0}")]
    ColumnMismatch(String),

    /// An expression string failed to parse or referenced unknown columns.
    #[error("expression error: {0}")]
    Expression(String),

    /// An invalid histogram definition.
    #[error("histogram definition '{name}': {reason}")]
    Definition {
        /// Histogram name from the definition.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Engine session initialization failure.
    #[error("session error: {0}")]
    Session(String),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, TableError>;
