//! Markdown file API: read, write and delete article bodies by article id.

use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

use super::{article_error_response, markdown_error_response};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/files/markdown")
            .route("", web::get().to(list_files))
            .route("/{article_id}", web::get().to(read_markdown))
            .route("/{article_id}", web::put().to(write_markdown))
            .route("/{article_id}", web::delete().to(delete_markdown)),
    );
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileOperationResponse {
    success: bool,
    file_path: String,
    message: String,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct FileEntry {
    path: String,
    size: u64,
}

/// Body text of a PUT: `{"content": ...}` or `{"body": ...}` JSON, otherwise the raw text
fn parse_content_from_body(body: &str) -> String {
    if body.trim().is_empty() {
        return String::new();
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["content", "body"] {
            if let Some(value) = map.get(key) {
                return match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
            }
        }
    }

    body.to_string()
}

async fn read_markdown(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let article_id = path.into_inner();

    match state.articles.read_content(article_id) {
        Ok(content) => HttpResponse::Ok()
            .content_type("text/markdown; charset=utf-8")
            .body(content),
        Err(e) => article_error_response(&e),
    }
}

async fn write_markdown(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Bytes,
) -> impl Responder {
    let article_id = path.into_inner();

    let text = match std::str::from_utf8(&body) {
        Ok(t) => t,
        Err(_) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Request body must be UTF-8 text"
            }));
        }
    };
    let content = parse_content_from_body(text);

    match state.articles.write_content(article_id, Some(&content)) {
        Ok(write) => {
            let message = if write.created {
                "Markdown file created"
            } else {
                "Markdown file saved"
            };
            HttpResponse::Ok().json(FileOperationResponse {
                success: true,
                file_path: write.path,
                message: message.to_string(),
                timestamp: Utc::now().to_rfc3339(),
            })
        }
        Err(e) => article_error_response(&e),
    }
}

async fn delete_markdown(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let article_id = path.into_inner();

    match state.articles.delete_content(article_id) {
        Ok(file_path) => HttpResponse::Ok().json(FileOperationResponse {
            success: true,
            file_path,
            message: "Markdown file deleted".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }),
        Err(e) => article_error_response(&e),
    }
}

async fn list_files(state: web::Data<AppState>) -> impl Responder {
    let paths = match state.markdown.list_files() {
        Ok(p) => p,
        Err(e) => return markdown_error_response(&e),
    };

    let mut entries: Vec<FileEntry> = paths
        .into_iter()
        .filter_map(|path| {
            // Files removed between listing and stat are skipped
            let size = state.markdown.file_size(&path).ok()?;
            Some(FileEntry { path, size })
        })
        .collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    let count = entries.len();

    HttpResponse::Ok().json(serde_json::json!({
        "files": entries,
        "count": count
    }))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateArticleRequest;
    use crate::test_support::test_state;
    use actix_web::{http::StatusCode, test, App};

    fn create_article(state: &web::Data<AppState>, title: &str) -> i64 {
        state
            .articles
            .create(CreateArticleRequest {
                title: title.to_string(),
                content: Some("v1".to_string()),
                ..Default::default()
            })
            .unwrap()
            .id
    }

    #[actix_web::test]
    async fn test_markdown_round_trip() {
        let (_dir, state) = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let id = create_article(&state, "Files");

        let req = test::TestRequest::get()
            .uri(&format!("/api/files/markdown/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "v1");

        let req = test::TestRequest::put()
            .uri(&format!("/api/files/markdown/{}", id))
            .set_json(serde_json::json!({ "content": "v2" }))
            .to_request();
        let saved: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(saved["success"], true);
        let first_path = saved["filePath"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/files/markdown/{}", id))
            .insert_header(("content-type", "text/plain"))
            .set_payload("plain v3")
            .to_request();
        let saved: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(saved["filePath"], first_path.as_str());

        let req = test::TestRequest::get()
            .uri(&format!("/api/files/markdown/{}", id))
            .to_request();
        assert_eq!(test::call_and_read_body(&app, req).await, "plain v3");

        let req = test::TestRequest::get().uri("/api/files/markdown").to_request();
        let listing: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing["count"], 1);
        assert_eq!(listing["files"][0]["path"], first_path.as_str());
        assert_eq!(listing["files"][0]["size"], 8);
    }

    #[actix_web::test]
    async fn test_delete_then_put_recreates() {
        let (_dir, state) = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let id = create_article(&state, "Recreate");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/files/markdown/{}", id))
            .to_request();
        let deleted: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let old_path = deleted["filePath"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/files/markdown/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put()
            .uri(&format!("/api/files/markdown/{}", id))
            .set_payload("fresh")
            .to_request();
        let saved: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(saved["success"], true);
        assert_ne!(saved["filePath"], old_path.as_str());

        let req = test::TestRequest::get()
            .uri(&format!("/api/files/markdown/{}", id))
            .to_request();
        assert_eq!(test::call_and_read_body(&app, req).await, "fresh");
    }

    #[actix_web::test]
    async fn test_missing_article_is_not_found() {
        let (_dir, state) = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::put()
            .uri("/api/files/markdown/404")
            .set_payload("orphan")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(state.markdown.list_files().unwrap().is_empty());
    }
}
