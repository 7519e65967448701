use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uploaded image. The bytes are kept on disk at `file_path` and inline as Base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub base64_content: String,
    pub created_at: DateTime<Utc>,
}

/// Image response for API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub base64_content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Image> for ImageResponse {
    fn from(image: Image) -> Self {
        ImageResponse {
            id: image.id,
            filename: image.filename,
            original_name: image.original_name,
            file_path: image.file_path,
            file_size: image.file_size,
            mime_type: image.mime_type,
            base64_content: image.base64_content,
            created_at: image.created_at,
        }
    }
}
