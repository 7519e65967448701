pub mod article;
pub mod image;
pub mod page;

pub use article::{
    Article, ArticleFilter, ArticleResponse, ArticleSort, ArticleStatus, CreateArticleRequest,
    TagRequest, UpdateArticleRequest,
};
pub use image::{Image, ImageResponse};
pub use page::Page;
