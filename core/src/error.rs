use std::{io, path::PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Harness-level failures.
/// None of them is attributable to the solution under test.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Solution binary not found at {}", .0.to_string_lossy())]
    SolutionNotFound(PathBuf),

    #[error("Checker binary not found at {}", .0.to_string_lossy())]
    CheckerNotFound(PathBuf),

    #[error("Tests directory not found at {}", .0.to_string_lossy())]
    TestsDirNotFound(PathBuf),

    #[error("Missing answer file for {name} (expected {})", .path.to_string_lossy())]
    MissingAnswer { name: String, path: PathBuf },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to communicate with subprocess '{program}': {source}")]
    Communicate {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid testcase input pattern '{0}': {1}")]
    InvalidPattern(String, #[source] glob::PatternError),

    #[error(transparent)]
    Fs(#[from] fsutil::Error),
}
