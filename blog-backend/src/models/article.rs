use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication state of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "DRAFT",
            ArticleStatus::Published => "PUBLISHED",
            ArticleStatus::Archived => "ARCHIVED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Some(ArticleStatus::Draft),
            "PUBLISHED" => Some(ArticleStatus::Published),
            "ARCHIVED" => Some(ArticleStatus::Archived),
            _ => None,
        }
    }
}

/// Article row. The body lives in the markdown store at `content_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content_path: Option<String>,
    pub status: ArticleStatus,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Request to create an article
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub summary: Option<String>,
    pub status: Option<ArticleStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: Option<String>,
}

/// Request to update an article. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub status: Option<ArticleStatus>,
    pub tags: Option<Vec<String>>,
}

/// Request to attach a tag
#[derive(Debug, Clone, Deserialize)]
pub struct TagRequest {
    pub tag: String,
}

/// Article response for API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content_path: Option<String>,
    pub status: ArticleStatus,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        ArticleResponse {
            id: article.id,
            title: article.title,
            slug: article.slug,
            summary: article.summary,
            content_path: article.content_path,
            status: article.status,
            tags: article.tags,
            created_at: article.created_at,
            updated_at: article.updated_at,
            published_at: article.published_at,
        }
    }
}

/// Sortable article columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    Title,
}

impl ArticleSort {
    pub fn column(&self) -> &'static str {
        match self {
            ArticleSort::CreatedAt => "created_at",
            ArticleSort::UpdatedAt => "updated_at",
            ArticleSort::PublishedAt => "published_at",
            ArticleSort::Title => "title",
        }
    }

    /// Accepts both the camelCase API names and the snake_case column names
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "createdAt" | "created_at" => Some(ArticleSort::CreatedAt),
            "updatedAt" | "updated_at" => Some(ArticleSort::UpdatedAt),
            "publishedAt" | "published_at" => Some(ArticleSort::PublishedAt),
            "title" => Some(ArticleSort::Title),
            _ => None,
        }
    }
}

/// Filters and paging for article listing
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    pub title: Option<String>,
    pub status: Option<ArticleStatus>,
    /// Matches articles carrying any of these tags
    pub tags: Vec<String>,
    pub sort: ArticleSort,
    pub descending: bool,
    pub page: u32,
    pub size: u32,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        ArticleFilter {
            title: None,
            status: None,
            tags: Vec::new(),
            sort: ArticleSort::CreatedAt,
            descending: true,
            page: 0,
            size: 20,
        }
    }
}
