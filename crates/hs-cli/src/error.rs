//! Pipeline error type.

use thiserror::Error;

/// Everything that can abort a histsteer run.
///
/// `Config`, `MissingInputPattern`, and `NoFilesFound` occur before the
/// output store is created; `Region` wraps any engine failure once region
/// processing has begun.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed configuration or missing mandatory keys.
    #[error("config error: {0}")]
    Config(String),

    /// `global.input_files` is absent or empty.
    #[error("no input files specified (global.input_files); check your config file")]
    MissingInputPattern,

    /// The configured patterns matched nothing on disk.
    #[error("no input files found for pattern(s) '{patterns}'; check your config file")]
    NoFilesFound {
        /// The pattern string as configured.
        patterns: String,
    },

    /// An engine failure while processing one region.
    #[error("region '{region}': {source}")]
    Region {
        /// Name of the region that failed.
        region: String,
        /// Underlying engine error.
        #[source]
        source: hs_table::TableError,
    },

    /// Engine failure outside region processing (session init).
    #[error(transparent)]
    Table(#[from] hs_table::TableError),

    /// Output store misuse or write failure.
    #[error("output store: {0}")]
    Store(String),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
