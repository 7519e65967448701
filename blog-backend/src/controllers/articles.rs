//! Articles REST API

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::{
    ArticleFilter, ArticleResponse, ArticleSort, ArticleStatus, CreateArticleRequest, TagRequest,
    UpdateArticleRequest,
};
use crate::AppState;

use super::article_error_response;

const DEFAULT_PAGE_SIZE: u32 = 20;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/articles")
            .route("", web::get().to(list_articles))
            .route("", web::post().to(create_article))
            .route("/slug/{slug}", web::get().to(get_article_by_slug))
            .route("/{id}", web::get().to(get_article))
            .route("/{id}", web::put().to(update_article))
            .route("/{id}", web::delete().to(delete_article))
            .route("/{id}/publish", web::post().to(publish_article))
            .route("/{id}/unpublish", web::post().to(unpublish_article))
            .route("/{id}/archive", web::post().to(archive_article))
            .route("/{id}/tags", web::post().to(add_tag))
            .route("/{id}/tags/{tag}", web::delete().to(remove_tag)),
    );
}

#[derive(Debug, Deserialize)]
struct ListArticlesQuery {
    page: Option<u32>,
    size: Option<u32>,
    title: Option<String>,
    /// Comma separated
    tags: Option<String>,
    status: Option<String>,
    sort: Option<String>,
    direction: Option<String>,
}

impl ListArticlesQuery {
    fn into_filter(self) -> Result<ArticleFilter, String> {
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Some(ArticleStatus::from_str(s).ok_or_else(|| format!("invalid status: {}", s))?),
            None => None,
        };

        let sort = match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => ArticleSort::from_str(s).ok_or_else(|| format!("invalid sort field: {}", s))?,
            None => ArticleSort::default(),
        };

        let descending = match self.direction.as_deref().map(|d| d.trim().to_lowercase()) {
            None => true,
            Some(d) if d.is_empty() || d == "desc" => true,
            Some(d) if d == "asc" => false,
            Some(d) => return Err(format!("invalid sort direction: {}", d)),
        };

        let tags = self
            .tags
            .map(|t| {
                t.split(',')
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(ArticleFilter {
            title: self.title,
            status,
            tags,
            sort,
            descending,
            page: self.page.unwrap_or(0),
            size: self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

async fn list_articles(
    state: web::Data<AppState>,
    query: web::Query<ListArticlesQuery>,
) -> impl Responder {
    let filter = match query.into_inner().into_filter() {
        Ok(f) => f,
        Err(msg) => {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": msg }));
        }
    };

    match state.articles.list(&filter) {
        Ok(page) => HttpResponse::Ok().json(page.map(ArticleResponse::from)),
        Err(e) => article_error_response(&e),
    }
}

async fn create_article(
    state: web::Data<AppState>,
    body: web::Json<CreateArticleRequest>,
) -> impl Responder {
    match state.articles.create(body.into_inner()) {
        Ok(article) => HttpResponse::Created().json(ArticleResponse::from(article)),
        Err(e) => article_error_response(&e),
    }
}

async fn get_article(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    match state.articles.get(path.into_inner()) {
        Ok(article) => HttpResponse::Ok().json(ArticleResponse::from(article)),
        Err(e) => article_error_response(&e),
    }
}

async fn get_article_by_slug(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.articles.get_by_slug(&path) {
        Ok(article) => HttpResponse::Ok().json(ArticleResponse::from(article)),
        Err(e) => article_error_response(&e),
    }
}

async fn update_article(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateArticleRequest>,
) -> impl Responder {
    match state.articles.update(path.into_inner(), body.into_inner()) {
        Ok(article) => HttpResponse::Ok().json(ArticleResponse::from(article)),
        Err(e) => article_error_response(&e),
    }
}

async fn delete_article(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    match state.articles.delete(path.into_inner()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => article_error_response(&e),
    }
}

async fn publish_article(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    match state.articles.publish(path.into_inner()) {
        Ok(article) => HttpResponse::Ok().json(ArticleResponse::from(article)),
        Err(e) => article_error_response(&e),
    }
}

async fn unpublish_article(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    match state.articles.unpublish(path.into_inner()) {
        Ok(article) => HttpResponse::Ok().json(ArticleResponse::from(article)),
        Err(e) => article_error_response(&e),
    }
}

async fn archive_article(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    match state.articles.archive(path.into_inner()) {
        Ok(article) => HttpResponse::Ok().json(ArticleResponse::from(article)),
        Err(e) => article_error_response(&e),
    }
}

async fn add_tag(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<TagRequest>,
) -> impl Responder {
    match state.articles.add_tag(path.into_inner(), &body.tag) {
        Ok(article) => HttpResponse::Ok().json(ArticleResponse::from(article)),
        Err(e) => article_error_response(&e),
    }
}

async fn remove_tag(state: web::Data<AppState>, path: web::Path<(i64, String)>) -> impl Responder {
    let (id, tag) = path.into_inner();
    match state.articles.remove_tag(id, &tag) {
        Ok(article) => HttpResponse::Ok().json(ArticleResponse::from(article)),
        Err(e) => article_error_response(&e),
    }
}
