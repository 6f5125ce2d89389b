//! Error kinds shared by the parser, repository, index, and HTTP layers.
//!
//! Library code returns [`Result`]; the HTTP layer maps [`Error::kind`] to a
//! status code and the CLI wraps everything in `anyhow`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("search index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("store query failed: {0}")]
    Store(#[source] sqlx::Error),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification used for status-code mapping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    StoreUnavailable,
    IndexUnavailable,
    MalformedInput,
    Timeout,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Error::IndexUnavailable(_) => ErrorKind::IndexUnavailable,
            Error::MalformedInput(_) => ErrorKind::MalformedInput,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Store(_) | Error::Io { .. } => ErrorKind::Internal,
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Error::Timeout("waiting for a store connection".to_string()),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => Error::StoreUnavailable(err.to_string()),
            other => Error::Store(other),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(format!("search index request: {}", err))
        } else {
            Error::IndexUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_timeout_kind() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_closed_pool_is_store_unavailable() {
        let err: Error = sqlx::Error::PoolClosed.into();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[test]
    fn test_row_not_found_is_internal() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
