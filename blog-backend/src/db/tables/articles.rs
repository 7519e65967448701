//! Article database operations (articles + article_tags)

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};

use crate::models::{Article, ArticleFilter, ArticleStatus};
use super::super::Database;

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.slug, a.summary, a.content_path, a.status, \
     a.created_at, a.updated_at, a.published_at";

/// Fields for a new article row
pub struct NewArticle<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub summary: Option<&'a str>,
    pub content_path: Option<&'a str>,
    pub status: ArticleStatus,
    pub tags: &'a [String],
}

impl Database {
    /// Insert an article and its tags
    pub fn create_article(&self, new: NewArticle<'_>) -> SqliteResult<Article> {
        let mut conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let published_at = (new.status == ArticleStatus::Published).then_some(now);

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO articles (title, slug, summary, content_path, status, created_at, updated_at, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)",
            rusqlite::params![
                new.title,
                new.slug,
                new.summary,
                new.content_path,
                new.status.as_str(),
                &now_str,
                published_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        let id = tx.last_insert_rowid();
        let tags = replace_tags(&tx, id, new.tags)?;
        tx.commit()?;

        Ok(Article {
            id,
            title: new.title.to_string(),
            slug: new.slug.to_string(),
            summary: new.summary.map(|s| s.to_string()),
            content_path: new.content_path.map(|s| s.to_string()),
            status: new.status,
            tags,
            created_at: now,
            updated_at: now,
            published_at,
        })
    }

    /// Get an article by ID
    pub fn get_article(&self, id: i64) -> SqliteResult<Option<Article>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM articles a WHERE a.id = ?1", ARTICLE_COLUMNS);
        let article = conn
            .query_row(&sql, [id], |row| Self::row_to_article(row))
            .optional()?;

        article.map(|a| with_tags(&conn, a)).transpose()
    }

    /// Get an article by its slug
    pub fn get_article_by_slug(&self, slug: &str) -> SqliteResult<Option<Article>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM articles a WHERE a.slug = ?1", ARTICLE_COLUMNS);
        let article = conn
            .query_row(&sql, [slug], |row| Self::row_to_article(row))
            .optional()?;

        article.map(|a| with_tags(&conn, a)).transpose()
    }

    pub fn slug_exists(&self, slug: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM articles WHERE slug = ?1)",
            [slug],
            |row| row.get(0),
        )
    }

    /// Persist every mutable field of `article` and replace its tag set.
    /// Bumps `updated_at`; returns the stored article, or None if the row is gone.
    pub fn update_article(&self, article: &Article) -> SqliteResult<Option<Article>> {
        let mut conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE articles SET title = ?1, summary = ?2, content_path = ?3, status = ?4,
             published_at = ?5, updated_at = ?6 WHERE id = ?7",
            rusqlite::params![
                &article.title,
                &article.summary,
                &article.content_path,
                article.status.as_str(),
                article.published_at.map(|dt| dt.to_rfc3339()),
                now.to_rfc3339(),
                article.id,
            ],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        let tags = replace_tags(&tx, article.id, &article.tags)?;
        tx.commit()?;

        Ok(Some(Article {
            tags,
            updated_at: now,
            ..article.clone()
        }))
    }

    /// Re-point an article at a content file
    pub fn set_content_path(&self, id: i64, content_path: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE articles SET content_path = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![content_path, Utc::now().to_rfc3339(), id],
        )?;
        Ok(rows > 0)
    }

    /// Delete an article and its tags. The content file is not touched.
    pub fn delete_article(&self, id: i64) -> SqliteResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM article_tags WHERE article_id = ?1", [id])?;
        let rows = tx.execute("DELETE FROM articles WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// One page of articles matching `filter`, plus the total number of matches
    pub fn list_articles(&self, filter: &ArticleFilter) -> SqliteResult<(Vec<Article>, u64)> {
        let conn = self.conn.lock().unwrap();

        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(title) = filter.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            conditions.push("instr(LOWER(a.title), ?) > 0".to_string());
            params.push(Box::new(title.to_ascii_lowercase()));
        }
        if let Some(status) = filter.status {
            conditions.push("a.status = ?".to_string());
            params.push(Box::new(status.as_str().to_string()));
        }
        if !filter.tags.is_empty() {
            let placeholders = vec!["?"; filter.tags.len()].join(", ");
            conditions.push(format!(
                "a.id IN (SELECT article_id FROM article_tags WHERE tag IN ({}))",
                placeholders
            ));
            for tag in &filter.tags {
                params.push(Box::new(tag.clone()));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM articles a{}", where_clause),
            params_ref.as_slice(),
            |row| row.get(0),
        )?;

        let direction = if filter.descending { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT {} FROM articles a{} ORDER BY a.{} {}, a.id {} LIMIT ? OFFSET ?",
            ARTICLE_COLUMNS,
            where_clause,
            filter.sort.column(),
            direction,
            direction
        );

        let limit = filter.size as i64;
        let offset = filter.page as i64 * limit;
        let mut page_params = params_ref;
        page_params.push(&limit);
        page_params.push(&offset);

        let mut stmt = conn.prepare(&sql)?;
        let articles = stmt
            .query_map(page_params.as_slice(), |row| Self::row_to_article(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        let articles = articles
            .into_iter()
            .map(|a| with_tags(&conn, a))
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok((articles, total.max(0) as u64))
    }

    /// Article row without tags (filled in by `with_tags`)
    fn row_to_article(row: &rusqlite::Row) -> rusqlite::Result<Article> {
        let status_str: String = row.get(5)?;
        let created_at_str: String = row.get(6)?;
        let updated_at_str: String = row.get(7)?;
        let published_at_str: Option<String> = row.get(8)?;

        Ok(Article {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            summary: row.get(3)?,
            content_path: row.get(4)?,
            status: ArticleStatus::from_str(&status_str).unwrap_or_default(),
            tags: Vec::new(),
            created_at: parse_timestamp(6, &created_at_str)?,
            updated_at: parse_timestamp(7, &updated_at_str)?,
            published_at: published_at_str
                .map(|s| parse_timestamp(8, &s))
                .transpose()?,
        })
    }
}

pub(crate) fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn with_tags(conn: &Connection, mut article: Article) -> SqliteResult<Article> {
    article.tags = load_tags(conn, article.id)?;
    Ok(article)
}

fn load_tags(conn: &Connection, article_id: i64) -> SqliteResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT tag FROM article_tags WHERE article_id = ?1 ORDER BY tag")?;
    let tags = stmt
        .query_map([article_id], |row| row.get(0))?
        .collect::<SqliteResult<Vec<String>>>()?;
    Ok(tags)
}

/// Replace the tag set, dropping blanks and duplicates; returns the stored tags
fn replace_tags(conn: &Connection, article_id: i64, tags: &[String]) -> SqliteResult<Vec<String>> {
    conn.execute("DELETE FROM article_tags WHERE article_id = ?1", [article_id])?;
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        conn.execute(
            "INSERT OR IGNORE INTO article_tags (article_id, tag) VALUES (?1, ?2)",
            rusqlite::params![article_id, tag],
        )?;
    }
    load_tags(conn, article_id)
}
