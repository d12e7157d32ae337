use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the public configuration and setup surface.
///
/// Live-filesystem conditions encountered during a crawl or a rank pass
/// (permission denied, a file vanishing between match and stat) are never
/// turned into a `BitdexError` — they are expected and are swallowed after
/// being logged. Only caller mistakes reach this type.
#[derive(Debug, Error)]
pub enum BitdexError {
    #[error("main_dirs must contain at least one directory")]
    EmptyMainDirs,

    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("worker count {requested} is out of range [1, {max}]")]
    WorkerCountOutOfRange { requested: usize, max: usize },

    #[error("could not resolve current username: {0}")]
    UsernameResolution(String),
}

pub type Result<T> = std::result::Result<T, BitdexError>;
