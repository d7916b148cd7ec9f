use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything the store can complain about.
///
/// Missing records are not errors: [`edit`][crate::store::Store::edit] and
/// [`delete`][crate::store::Store::delete] report those through their return
/// values instead.
#[derive(Debug, Error)]
pub enum InexError {
    /// Malformed caller input: file name, date, amount, selector, filter bound.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A record field that cannot be stored as given.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("file `{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("corrupt file: {0}")]
    CorruptFile(String),

    #[error("truncated record block: {0}")]
    ReadError(#[source] io::Error),

    #[error("failed to write `{}': {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("limit reached: {0}")]
    LimitReached(&'static str),

    #[error("out of memory")]
    AllocationFailure,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, InexError>;

pub(crate) fn invalid<S: Into<String>>(msg: S) -> InexError {
    InexError::InvalidArgument(msg.into())
}
