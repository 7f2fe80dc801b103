use std::path::PathBuf;

use thiserror::Error;

/// Hard failures of the analysis pipeline.
///
/// Ordinary per-file problems (missing input, readelf exit failures,
/// timeouts, foreign content) never show up here; they are recorded on
/// the `ParseResult` and reported as findings instead.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("introspection utility {tool:?} could not be started")]
    ToolMissing {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration")]
    Config(#[from] toml::de::Error),

    #[error("failed to serialize configuration")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("failed to walk package tree")]
    Walk(#[from] walkdir::Error),
}

/// Internal contract violation detected by a single rule evaluator.
///
/// These are not findings: they indicate a parser or rule defect and are
/// surfaced separately so the remaining rules can still run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct RuleError(pub String);

pub type Result<T> = std::result::Result<T, CoreError>;
