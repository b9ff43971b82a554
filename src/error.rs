use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::command::ErrorKind;

/// type alias for all operations on a [`LinePool`] (and its collaborators) that could fail
/// with a [`PoolError`]
///
/// [`LinePool`]: ./struct.LinePool.html
pub type Result<T> = std::result::Result<T, PoolError>;

/// The Error variants used by this crate.
///
/// Only [`PoolError::InvalidArgument`] can originate from the pool itself; every other
/// variant belongs to the loader, the server, the client or the executables wrapping it.
#[derive(Error, Debug)]
pub enum PoolError {
    /// an argument was rejected before any state was changed, e.g. a negative sample count
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// the file to load does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// the file to load could not be opened due to its permissions
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// the file to load is bigger than the configured size limit
    #[error("File too large ({size_mb:.1}MB). Limit is {limit_mb}MB.")]
    FileTooLarge {
        /// size of the rejected file, in MiB
        size_mb: f64,
        /// the configured limit, in MiB
        limit_mb: u64,
    },

    /// the pool is already holding its maximum number of lines
    #[error("Cache limit reached ({0} lines).")]
    CapacityExceeded(usize),

    /// a sample request asked for more lines than the configured limit
    #[error("n too large ({requested}). Limit is {limit}.")]
    SampleTooLarge {
        /// the requested sample size
        requested: i64,
        /// the configured limit
        limit: u64,
    },

    /// errors caused by file or socket IO
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// errors while encoding or decoding the wire protocol
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// a command line option or environment variable could not be parsed
    #[error("{0}")]
    Parsing(String),

    /// an error response returned by a server
    #[error("server error ({kind:?}): {message}")]
    Server {
        /// the category of the error
        kind: ErrorKind,
        /// the server's description of the error
        message: String,
    },

    /// catch-all error holding a description
    #[error("{0}")]
    StringErr(String),
}

impl PoolError {
    /// maps this error to the [`ErrorKind`] reported to clients
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::NotFound(_) => ErrorKind::NotFound,
            PoolError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            PoolError::InvalidArgument(_)
            | PoolError::FileTooLarge { .. }
            | PoolError::CapacityExceeded(_)
            | PoolError::SampleTooLarge { .. } => ErrorKind::InvalidArgument,
            PoolError::Server { kind, .. } => *kind,
            PoolError::Io(_)
            | PoolError::Serde(_)
            | PoolError::Parsing(_)
            | PoolError::StringErr(_) => ErrorKind::Internal,
        }
    }
}
