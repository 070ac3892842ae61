//! Error types for store population and source loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading sources into the store.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading a file or directory failed.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A source file failed to parse.
    #[error("{}: {source}", .path.display())]
    Parse {
        /// The file that failed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: acl_policy::Error,
    },

    /// A device descriptor carried a malformed value.
    #[error("{}: invalid value for {key}: `{value}`", .path.display())]
    InvalidValue {
        /// The device file.
        path: PathBuf,
        /// The descriptor key.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// A device descriptor key was present without a value.
    #[error("{}: missing value for {key}", .path.display())]
    MissingValue {
        /// The device file.
        path: PathBuf,
        /// The descriptor key.
        key: String,
    },

    /// One or more files failed to load.
    #[error("{} source file(s) failed to load", .0.len())]
    Aggregate(Vec<Error>),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;
