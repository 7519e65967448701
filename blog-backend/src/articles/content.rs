//! Keeps an article's `content_path` in step with the markdown store

use super::service::ArticleService;
use super::{ArticleError, ArticleResult};

/// Outcome of writing an article's content
#[derive(Debug, Clone)]
pub struct ContentWrite {
    /// Logical path now referenced by the article
    pub path: String,
    /// True when a new file was saved because the old one was missing
    pub created: bool,
}

impl ArticleService {
    /// Read the body of an article
    pub fn read_content(&self, id: i64) -> ArticleResult<String> {
        let article = self.get(id)?;
        let path = article
            .content_path
            .ok_or_else(|| ArticleError::NotFound(format!("content for article {}", id)))?;

        Ok(self.store.read_file(&path)?)
    }

    /// Replace the body of an article.
    ///
    /// Updates the file in place when the pointer is live. A missing file or
    /// unset pointer gets a fresh file named after the slug, and the article is
    /// re-pointed at it.
    pub fn write_content(&self, id: i64, content: Option<&str>) -> ArticleResult<ContentWrite> {
        let article = self.get(id)?;

        if let Some(path) = article.content_path.as_deref() {
            if self.store.file_exists(path) {
                self.store.update_file(path, content)?;
                log::debug!("[ARTICLES] Updated content of article {}", id);
                return Ok(ContentWrite {
                    path: path.to_string(),
                    created: false,
                });
            }
            log::warn!(
                "[ARTICLES] Content file {} of article {} is missing, saving a new one",
                path,
                id
            );
        }

        let path = self.store.save_file(&article.slug, content)?;
        let repointed = match self.db.set_content_path(id, &path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ArticleError::not_found(id)),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = repointed {
            if let Err(cleanup) = self.store.delete_file(&path) {
                log::warn!("[ARTICLES] Failed to remove orphaned content {}: {}", path, cleanup);
            }
            return Err(e);
        }

        log::info!("[ARTICLES] Article {} now points at {}", id, path);
        Ok(ContentWrite {
            path,
            created: true,
        })
    }

    /// Remove the content file. The article row keeps its (now stale) pointer.
    pub fn delete_content(&self, id: i64) -> ArticleResult<String> {
        let article = self.get(id)?;
        let path = article
            .content_path
            .ok_or_else(|| ArticleError::NotFound(format!("content for article {}", id)))?;

        self.store.delete_file(&path)?;
        log::info!("[ARTICLES] Deleted content {} of article {}", path, id);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::Database;
    use crate::markdown::{MarkdownError, MarkdownStore};
    use crate::models::CreateArticleRequest;
    use tempfile::tempdir;

    fn test_service() -> (tempfile::TempDir, ArticleService) {
        let dir = tempdir().unwrap();
        let store = MarkdownStore::new(dir.path().join("markdown")).unwrap();
        let db = Database::in_memory().unwrap();
        (dir, ArticleService::new(Arc::new(db), Arc::new(store)))
    }

    fn create(service: &ArticleService, title: &str, content: Option<&str>) -> i64 {
        service
            .create(CreateArticleRequest {
                title: title.to_string(),
                content: content.map(|c| c.to_string()),
                ..Default::default()
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_read_content() {
        let (_dir, service) = test_service();
        let id = create(&service, "Readable", Some("body text"));
        assert_eq!(service.read_content(id).unwrap(), "body text");

        let empty = create(&service, "Empty", None);
        assert_eq!(service.read_content(empty).unwrap(), "");
    }

    #[test]
    fn test_write_content_updates_in_place() {
        let (_dir, service) = test_service();
        let id = create(&service, "Editable", Some("v1"));
        let before = service.get(id).unwrap().content_path.unwrap();

        let write = service.write_content(id, Some("v2")).unwrap();
        assert!(!write.created);
        assert_eq!(write.path, before);
        assert_eq!(service.read_content(id).unwrap(), "v2");
        assert_eq!(service.store.list_files().unwrap().len(), 1);
    }

    #[test]
    fn test_write_content_repoints_stale_pointer() {
        let (_dir, service) = test_service();
        let id = create(&service, "Stale", Some("v1"));
        let old = service.delete_content(id).unwrap();
        assert!(matches!(
            service.read_content(id),
            Err(ArticleError::Content(MarkdownError::NotFound(_)))
        ));

        let write = service.write_content(id, Some("v2")).unwrap();
        assert!(write.created);
        assert_ne!(write.path, old);

        let article = service.get(id).unwrap();
        assert_eq!(article.content_path.as_deref(), Some(write.path.as_str()));
        assert_eq!(service.read_content(id).unwrap(), "v2");
    }

    #[test]
    fn test_write_content_removes_file_when_repoint_fails() {
        let (_dir, service) = test_service();
        let id = create(&service, "Blocked", Some("v1"));
        service.delete_content(id).unwrap();

        service
            .db
            .conn
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER block_repoint BEFORE UPDATE OF content_path ON articles
                 BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
            )
            .unwrap();

        let result = service.write_content(id, Some("v2"));
        assert!(matches!(result, Err(ArticleError::Database(_))));
        assert!(service.store.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_missing_article() {
        let (_dir, service) = test_service();
        assert!(matches!(service.read_content(9), Err(ArticleError::NotFound(_))));
        assert!(matches!(service.write_content(9, Some("x")), Err(ArticleError::NotFound(_))));
        assert!(matches!(service.delete_content(9), Err(ArticleError::NotFound(_))));
        assert!(service.store.list_files().unwrap().is_empty());
    }
}
