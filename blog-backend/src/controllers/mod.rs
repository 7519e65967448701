pub mod articles;
pub mod files;
pub mod health;
pub mod images;

use actix_web::HttpResponse;

use crate::articles::ArticleError;
use crate::images::ImageError;
use crate::markdown::MarkdownError;

fn error_json(mut builder: actix_web::HttpResponseBuilder, message: impl ToString) -> HttpResponse {
    builder.json(serde_json::json!({
        "error": message.to_string()
    }))
}

/// Map an article error to a JSON error response
pub(crate) fn article_error_response(err: &ArticleError) -> HttpResponse {
    match err {
        ArticleError::Validation(msg) => error_json(HttpResponse::BadRequest(), msg),
        ArticleError::NotFound(_) => error_json(HttpResponse::NotFound(), err),
        ArticleError::Content(inner) => markdown_error_response(inner),
        ArticleError::Database(e) => {
            log::error!("[ARTICLES] Database error: {}", e);
            error_json(HttpResponse::InternalServerError(), "Internal server error")
        }
    }
}

pub(crate) fn markdown_error_response(err: &MarkdownError) -> HttpResponse {
    if err.is_client_error() {
        return error_json(HttpResponse::BadRequest(), err);
    }
    if err.is_not_found() {
        return error_json(HttpResponse::NotFound(), err);
    }
    log::error!("[MARKDOWN] {}", err);
    error_json(HttpResponse::InternalServerError(), "Failed to access content file")
}

pub(crate) fn image_error_response(err: &ImageError) -> HttpResponse {
    match err {
        ImageError::Validation(msg) => error_json(HttpResponse::BadRequest(), msg),
        ImageError::NotFound(_) => error_json(HttpResponse::NotFound(), err),
        ImageError::Io(_) | ImageError::Database(_) => {
            log::error!("[IMAGES] {}", err);
            error_json(HttpResponse::InternalServerError(), "Internal server error")
        }
    }
}
