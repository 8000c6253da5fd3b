use std::path::PathBuf;

use crate::oid::Oid;

/// error type for gitrs-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("unsupported repositoryformatversion: {0}")]
    UnsupportedFormat(u32),

    #[error("not a directory (file exists): {0}")]
    PathConflict(PathBuf),

    #[error("path not found: {0}")]
    NotFound(PathBuf),

    #[error("malformed object: {0}")]
    MalformedObject(String),

    #[error("unknown object kind: {0}")]
    UnknownKind(String),

    #[error("corrupt index: {0}")]
    BadIndex(String),

    #[error("not a valid object name {0}")]
    NoMatch(String),

    #[error("ambiguous argument {0}: {1} matching objects")]
    Ambiguous(String, usize),

    #[error("object {0} is a {1}, not a {2}")]
    TypeMismatch(Oid, &'static str, &'static str),

    #[error("ref chain too deep starting at {0}")]
    RefCycle(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid object id: {0}")]
    BadOidHex(String),

    #[error("lock contention on repository")]
    LockContention,

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
