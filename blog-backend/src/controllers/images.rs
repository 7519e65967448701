//! Images REST API: multipart upload, listing, preview and deletion.

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::images::ImageService;
use crate::models::ImageResponse;
use crate::AppState;

use super::image_error_response;

const DEFAULT_PAGE_SIZE: u32 = 20;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/images")
            .route("", web::get().to(list_images))
            .route("", web::post().to(upload_image))
            .route("/{id}", web::get().to(get_image))
            .route("/{id}", web::delete().to(delete_image))
            .route("/{id}/preview", web::get().to(preview_image)),
    );
}

#[derive(Debug, Deserialize)]
struct ListImagesQuery {
    page: Option<u32>,
    size: Option<u32>,
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": message.into()
    }))
}

async fn upload_image(state: web::Data<AppState>, mut payload: Multipart) -> impl Responder {
    let max_bytes = state.config.storage.image_max_bytes as usize;

    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) => return bad_request(format!("Failed to process upload: {}", e)),
        };

        // "description" and any other fields are drained and ignored
        let is_file = field.name() == "file";
        if is_file {
            filename = field
                .content_disposition()
                .get_filename()
                .map(|s| s.to_string());
            content_type = field.content_type().map(|ct| ct.essence_str().to_string());
        }

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => {
                    if is_file {
                        data.extend_from_slice(&bytes);
                        if data.len() > max_bytes {
                            return bad_request(format!(
                                "file too large, maximum is {} bytes",
                                max_bytes
                            ));
                        }
                    }
                }
                Err(e) => return bad_request(format!("Failed to read upload data: {}", e)),
            }
        }

        if is_file {
            file_data = Some(data);
        }
    }

    let data = match file_data {
        Some(d) => d,
        None => return bad_request("No file uploaded"),
    };
    let original_name = filename.unwrap_or_default();

    match state
        .images
        .upload(&original_name, content_type.as_deref(), &data)
    {
        Ok(image) => HttpResponse::Created().json(ImageResponse::from(image)),
        Err(e) => image_error_response(&e),
    }
}

async fn list_images(
    state: web::Data<AppState>,
    query: web::Query<ListImagesQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);

    match state.images.list(page, size) {
        Ok(page) => HttpResponse::Ok().json(page.map(ImageResponse::from)),
        Err(e) => image_error_response(&e),
    }
}

async fn get_image(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    match state.images.get(path.into_inner()) {
        Ok(image) => HttpResponse::Ok().json(ImageResponse::from(image)),
        Err(e) => image_error_response(&e),
    }
}

async fn delete_image(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    match state.images.delete(path.into_inner()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => image_error_response(&e),
    }
}

async fn preview_image(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let image = match state.images.get(path.into_inner()) {
        Ok(image) => image,
        Err(e) => return image_error_response(&e),
    };

    match state.images.read_bytes(&image) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(ImageService::content_type(&image))
            .insert_header(("Cache-Control", "public, max-age=3600"))
            .body(bytes),
        Err(e) => image_error_response(&e),
    }
}
