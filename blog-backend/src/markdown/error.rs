use std::io;

use thiserror::Error;

/// Result type used by the markdown store.
pub type MarkdownResult<T> = Result<T, MarkdownError>;

/// Errors produced by [`MarkdownStore`](super::MarkdownStore) operations.
///
/// `UnsafePath` never says which safety rule rejected the path.
#[derive(Debug, Error)]
pub enum MarkdownError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("unsafe file path: {0}")]
    UnsafePath(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("failed to {op} markdown file {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl MarkdownError {
    pub(crate) fn io(op: &'static str, path: impl Into<String>, source: io::Error) -> Self {
        MarkdownError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// True when the error reports a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MarkdownError::NotFound(_))
    }

    /// True for errors caused by the caller's input rather than the disk.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MarkdownError::InvalidArgument(_) | MarkdownError::UnsafePath(_)
        )
    }
}
