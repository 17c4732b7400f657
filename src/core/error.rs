//! Failure signalling shared by every component of the crate.
//!
//! Each precondition a handle or lister can violate has its own variant, and
//! each variant carries enough context (path, cursor, requested length, cached
//! size) to diagnose the failure without re-running the operation.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Coarse classification of an [`Error`], convenient for `match`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidTarget,
    Exists,
    Closed,
    NotReadable,
    NotWritable,
    OutOfRange,
    EmptyWrite,
    NotLocked,
    InvalidIndex,
    DirectoryOpenFailed,
    IoFailure,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("no such file: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("{} is not a regular file", .path.display())]
    InvalidTarget { path: PathBuf },

    #[error("{} already exists", .path.display())]
    Exists { path: PathBuf },

    #[error("{} is closed", .path.display())]
    Closed { path: PathBuf },

    #[error("{} is not open for reading", .path.display())]
    NotReadable { path: PathBuf },

    #[error("{} is not open for writing", .path.display())]
    NotWritable { path: PathBuf },

    #[error(
        "{}: range out of bounds (position {position}, length {length}, size {size})",
        .path.display()
    )]
    OutOfRange {
        path: PathBuf,
        position: u64,
        length: u64,
        size: u64,
    },

    #[error("{}: nothing to write", .path.display())]
    EmptyWrite { path: PathBuf },

    #[error("{} is not locked", .path.display())]
    NotLocked { path: PathBuf },

    #[error("invalid index {index}: listing holds {count} entries")]
    InvalidIndex { index: usize, count: usize },

    #[error("cannot open directory {}: {source}", .path.display())]
    DirectoryOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            Error::Exists { .. } => ErrorKind::Exists,
            Error::Closed { .. } => ErrorKind::Closed,
            Error::NotReadable { .. } => ErrorKind::NotReadable,
            Error::NotWritable { .. } => ErrorKind::NotWritable,
            Error::OutOfRange { .. } => ErrorKind::OutOfRange,
            Error::EmptyWrite { .. } => ErrorKind::EmptyWrite,
            Error::NotLocked { .. } => ErrorKind::NotLocked,
            Error::InvalidIndex { .. } => ErrorKind::InvalidIndex,
            Error::DirectoryOpenFailed { .. } => ErrorKind::DirectoryOpenFailed,
            Error::Io { .. } => ErrorKind::IoFailure,
        }
    }

    pub(crate) fn io<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn out_of_range<P: AsRef<Path>>(
        path: P,
        position: u64,
        length: u64,
        size: u64,
    ) -> Self {
        Error::OutOfRange {
            path: path.as_ref().to_path_buf(),
            position,
            length,
            size,
        }
    }
}

/// Attaches the offending path to a raw `io::Error`.
pub(crate) trait IoContext<T> {
    fn at<P: AsRef<Path>>(self, path: P) -> std::result::Result<T, Error>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at<P: AsRef<Path>>(self, path: P) -> std::result::Result<T, Error> {
        self.map_err(|e| Error::io(path, e))
    }
}
