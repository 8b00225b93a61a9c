//! Error type shared by the library.
//!
//! Only IO-like failures live here: a fixture that cannot be read, a linter
//! bridge that cannot be started, a report that cannot be decoded. Lint
//! violations and failed structural expectations are not errors; they are
//! reported through [`crate::models::Outcome`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradeError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{linter} bridge exited with {status}: {stderr}")]
    Bridge {
        linter: &'static str,
        status: String,
        stderr: String,
    },

    #[error("{linter} produced an unreadable report: {source}")]
    Decode {
        linter: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{linter} options could not be encoded: {source}")]
    Encode {
        linter: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl GradeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GradeError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = GradeError> = std::result::Result<T, E>;
