//! Database table operations
//!
//! Each module contains `impl Database` blocks for a specific table or related tables.

mod articles;
mod images;

pub use articles::NewArticle;
