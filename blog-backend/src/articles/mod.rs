//! Article service: metadata in SQLite, bodies in the markdown store

pub mod content;
pub mod service;
pub mod slug;

use thiserror::Error;

use crate::markdown::MarkdownError;

pub use service::ArticleService;

pub type ArticleResult<T> = Result<T, ArticleError>;

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("article not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Content(#[from] MarkdownError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl ArticleError {
    pub(crate) fn not_found(id: i64) -> Self {
        ArticleError::NotFound(format!("id {}", id))
    }
}
