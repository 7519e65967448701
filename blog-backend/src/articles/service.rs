use std::sync::Arc;

use chrono::Utc;

use crate::db::{Database, NewArticle};
use crate::markdown::MarkdownStore;
use crate::models::{
    Article, ArticleFilter, ArticleStatus, CreateArticleRequest, Page, UpdateArticleRequest,
};

use super::slug::{generate_slug, is_valid_slug};
use super::{ArticleError, ArticleResult};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Article lifecycle over the database and the markdown store
#[derive(Clone)]
pub struct ArticleService {
    pub(super) db: Arc<Database>,
    pub(super) store: Arc<MarkdownStore>,
}

impl ArticleService {
    pub fn new(db: Arc<Database>, store: Arc<MarkdownStore>) -> Self {
        Self { db, store }
    }

    /// Create an article and its content file.
    ///
    /// The file is written first and named after the slug. If the row cannot be
    /// inserted the file is removed again.
    pub fn create(&self, request: CreateArticleRequest) -> ArticleResult<Article> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ArticleError::Validation("title is required".to_string()));
        }

        let slug = generate_slug(title);
        if !is_valid_slug(&slug) {
            return Err(ArticleError::Validation(format!("invalid slug: {}", slug)));
        }
        if self.db.slug_exists(&slug)? {
            return Err(ArticleError::Validation(format!("slug already exists: {}", slug)));
        }

        let content_path = self.store.save_file(&slug, request.content.as_deref())?;

        let created = self.db.create_article(NewArticle {
            title,
            slug: &slug,
            summary: request.summary.as_deref(),
            content_path: Some(content_path.as_str()),
            status: request.status.unwrap_or_default(),
            tags: &request.tags,
        });

        match created {
            Ok(article) => {
                log::info!("[ARTICLES] Created article {} ({})", article.id, article.slug);
                Ok(article)
            }
            Err(e) => {
                if let Err(cleanup) = self.store.delete_file(&content_path) {
                    log::warn!(
                        "[ARTICLES] Failed to remove orphaned content {}: {}",
                        content_path,
                        cleanup
                    );
                }
                Err(e.into())
            }
        }
    }

    pub fn get(&self, id: i64) -> ArticleResult<Article> {
        self.db
            .get_article(id)?
            .ok_or_else(|| ArticleError::not_found(id))
    }

    pub fn get_by_slug(&self, slug: &str) -> ArticleResult<Article> {
        self.db
            .get_article_by_slug(slug)?
            .ok_or_else(|| ArticleError::NotFound(format!("slug {}", slug)))
    }

    /// Apply the present fields of `request`
    pub fn update(&self, id: i64, request: UpdateArticleRequest) -> ArticleResult<Article> {
        let mut article = self.get(id)?;

        if let Some(title) = request.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(ArticleError::Validation("title must not be blank".to_string()));
            }
            article.title = title.to_string();
        }
        if let Some(summary) = request.summary {
            article.summary = Some(summary);
        }
        if let Some(status) = request.status {
            apply_status(&mut article, status);
        }
        if let Some(tags) = request.tags {
            article.tags = tags;
        }

        self.save(article)
    }

    /// Delete the article row and its tags. The content file stays on disk.
    pub fn delete(&self, id: i64) -> ArticleResult<()> {
        if !self.db.delete_article(id)? {
            return Err(ArticleError::not_found(id));
        }
        log::info!("[ARTICLES] Deleted article {}", id);
        Ok(())
    }

    pub fn publish(&self, id: i64) -> ArticleResult<Article> {
        self.set_status(id, ArticleStatus::Published)
    }

    /// Back to draft; `published_at` is kept
    pub fn unpublish(&self, id: i64) -> ArticleResult<Article> {
        self.set_status(id, ArticleStatus::Draft)
    }

    pub fn archive(&self, id: i64) -> ArticleResult<Article> {
        self.set_status(id, ArticleStatus::Archived)
    }

    pub fn add_tag(&self, id: i64, tag: &str) -> ArticleResult<Article> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(ArticleError::Validation("tag must not be blank".to_string()));
        }

        let mut article = self.get(id)?;
        if article.tags.iter().any(|t| t == tag) {
            return Ok(article);
        }
        article.tags.push(tag.to_string());
        self.save(article)
    }

    pub fn remove_tag(&self, id: i64, tag: &str) -> ArticleResult<Article> {
        let mut article = self.get(id)?;
        let tag = tag.trim();
        let before = article.tags.len();
        article.tags.retain(|t| t != tag);
        if article.tags.len() == before {
            return Ok(article);
        }
        self.save(article)
    }

    pub fn list(&self, filter: &ArticleFilter) -> ArticleResult<Page<Article>> {
        if filter.size == 0 || filter.size > MAX_PAGE_SIZE {
            return Err(ArticleError::Validation(format!(
                "page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let (articles, total) = self.db.list_articles(filter)?;
        Ok(Page::new(articles, filter.page, filter.size, total))
    }

    fn set_status(&self, id: i64, status: ArticleStatus) -> ArticleResult<Article> {
        let mut article = self.get(id)?;
        apply_status(&mut article, status);
        let article = self.save(article)?;
        log::info!("[ARTICLES] Article {} is now {}", id, status.as_str());
        Ok(article)
    }

    fn save(&self, article: Article) -> ArticleResult<Article> {
        let id = article.id;
        self.db
            .update_article(&article)?
            .ok_or_else(|| ArticleError::not_found(id))
    }
}

fn apply_status(article: &mut Article, status: ArticleStatus) {
    if status == ArticleStatus::Published && article.published_at.is_none() {
        article.published_at = Some(Utc::now());
    }
    article.status = status;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownError;
    use tempfile::tempdir;

    fn test_service() -> (tempfile::TempDir, ArticleService) {
        let dir = tempdir().unwrap();
        let store = MarkdownStore::new(dir.path().join("markdown")).unwrap();
        let db = Database::in_memory().unwrap();
        (dir, ArticleService::new(Arc::new(db), Arc::new(store)))
    }

    fn request(title: &str) -> CreateArticleRequest {
        CreateArticleRequest {
            title: title.to_string(),
            content: Some(format!("# {}\n", title)),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_writes_content() {
        let (_dir, service) = test_service();
        let article = service.create(request("First Post")).unwrap();

        assert!(article.slug.starts_with("first-post-"));
        assert_eq!(article.status, ArticleStatus::Draft);

        let path = article.content_path.clone().unwrap();
        assert!(path.starts_with("first_post_"));
        assert_eq!(service.store.read_file(&path).unwrap(), "# First Post\n");
    }

    #[test]
    fn test_create_requires_title() {
        let (_dir, service) = test_service();
        let result = service.create(request("   "));
        assert!(matches!(result, Err(ArticleError::Validation(_))));
        assert!(service.store.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_create_published() {
        let (_dir, service) = test_service();
        let article = service
            .create(CreateArticleRequest {
                status: Some(ArticleStatus::Published),
                ..request("Live")
            })
            .unwrap();
        assert!(article.published_at.is_some());
    }

    #[test]
    fn test_get_missing() {
        let (_dir, service) = test_service();
        assert!(matches!(service.get(42), Err(ArticleError::NotFound(_))));
        assert!(matches!(service.get_by_slug("nope"), Err(ArticleError::NotFound(_))));
    }

    #[test]
    fn test_update_fields() {
        let (_dir, service) = test_service();
        let article = service.create(request("Original")).unwrap();

        let updated = service
            .update(
                article.id,
                UpdateArticleRequest {
                    title: Some("Renamed".to_string()),
                    summary: Some("short".to_string()),
                    status: Some(ArticleStatus::Published),
                    tags: Some(vec!["rust".to_string()]),
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.slug, article.slug);
        assert_eq!(updated.summary.as_deref(), Some("short"));
        assert!(updated.published_at.is_some());
        assert_eq!(updated.tags, vec!["rust".to_string()]);

        let blank = service.update(
            article.id,
            UpdateArticleRequest {
                title: Some(" ".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(blank, Err(ArticleError::Validation(_))));
    }

    #[test]
    fn test_status_transitions() {
        let (_dir, service) = test_service();
        let article = service.create(request("Lifecycle")).unwrap();

        let published = service.publish(article.id).unwrap();
        assert_eq!(published.status, ArticleStatus::Published);
        let published_at = published.published_at.unwrap();

        let draft = service.unpublish(article.id).unwrap();
        assert_eq!(draft.status, ArticleStatus::Draft);
        assert_eq!(draft.published_at, Some(published_at));

        let republished = service.publish(article.id).unwrap();
        assert_eq!(republished.published_at, Some(published_at));

        let archived = service.archive(article.id).unwrap();
        assert_eq!(archived.status, ArticleStatus::Archived);
    }

    #[test]
    fn test_tags() {
        let (_dir, service) = test_service();
        let article = service.create(request("Tagged")).unwrap();

        service.add_tag(article.id, " rust ").unwrap();
        let article2 = service.add_tag(article.id, "rust").unwrap();
        assert_eq!(article2.tags, vec!["rust".to_string()]);

        assert!(matches!(
            service.add_tag(article.id, ""),
            Err(ArticleError::Validation(_))
        ));

        let article3 = service.remove_tag(article.id, "rust").unwrap();
        assert!(article3.tags.is_empty());
    }

    #[test]
    fn test_delete_keeps_content_file() {
        let (_dir, service) = test_service();
        let article = service.create(request("Doomed")).unwrap();
        let path = article.content_path.clone().unwrap();

        service.delete(article.id).unwrap();
        assert!(matches!(service.get(article.id), Err(ArticleError::NotFound(_))));
        assert!(service.store.file_exists(&path));
        assert!(matches!(service.delete(article.id), Err(ArticleError::NotFound(_))));
    }

    #[test]
    fn test_list_pages() {
        let (_dir, service) = test_service();
        for title in ["One", "Two", "Three"] {
            service.create(request(title)).unwrap();
        }

        let filter = ArticleFilter {
            size: 2,
            ..Default::default()
        };
        let page = service.list(&filter).unwrap();
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
        assert!(page.first);
        assert!(!page.last);

        let too_big = ArticleFilter {
            size: 101,
            ..Default::default()
        };
        assert!(matches!(service.list(&too_big), Err(ArticleError::Validation(_))));
    }

    #[test]
    fn test_content_error_converts() {
        let err: ArticleError = MarkdownError::NotFound("x.md".to_string()).into();
        assert!(matches!(err, ArticleError::Content(MarkdownError::NotFound(_))));
    }
}
