//! Markdown content store
//!
//! Article bodies live as flat `.md` files under a single root directory. The
//! database only keeps the root-relative path handed back by the store.

pub mod error;
pub mod file_ops;
pub mod store;

pub use error::MarkdownError;
pub use store::MarkdownStore;
