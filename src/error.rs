use std::path::PathBuf;

use crate::rating::SolveError;

/// Failures the stats pipeline can surface to its caller.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("input file not found: {}", .0.display())]
    MissingInputFile(PathBuf),

    #[error("schema violation in {}: {message}", path.display())]
    SchemaViolation { path: PathBuf, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("rating solver failed for player {player}: {source}")]
    SolverNonconvergence { player: String, source: SolveError },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type StatsResult<T> = Result<T, StatsError>;
