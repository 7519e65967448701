//! Image uploads
//!
//! Validated uploads are written under the images root with a generated name
//! and recorded in the `images` table together with a Base64 copy of the bytes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Local;
use thiserror::Error;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Image, Page};

pub const ALLOWED_MIME_TYPES: &[&str] =
    &["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

pub const MAX_PAGE_SIZE: u32 = 100;

pub type ImageResult<T> = Result<T, ImageError>;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("{0}")]
    Validation(String),

    #[error("image not found: {0}")]
    NotFound(i64),

    #[error("image storage error: {0}")]
    Io(#[from] io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// MIME type for an image extension
pub fn mime_for_ext(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Lowercased extension after the last dot, ignoring dotfiles like ".png"
fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Check size, MIME type and extension of an upload; returns the extension
pub fn validate_image(
    original_name: &str,
    mime_type: Option<&str>,
    size: u64,
    max_bytes: u64,
) -> ImageResult<String> {
    if size == 0 {
        return Err(ImageError::Validation("file must not be empty".to_string()));
    }
    if size > max_bytes {
        return Err(ImageError::Validation(format!(
            "file too large, maximum is {} bytes",
            max_bytes
        )));
    }

    let mime = mime_type.map(|m| m.to_lowercase()).unwrap_or_default();
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(ImageError::Validation(format!(
            "unsupported file type, supported: {}",
            ALLOWED_MIME_TYPES.join(", ")
        )));
    }

    match extension_of(original_name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(ImageError::Validation("invalid file extension".to_string())),
    }
}

/// `<yyyyMMdd_HHmmss>_<8 hex>.<ext>`
fn generate_filename(ext: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let random = Uuid::new_v4().simple().to_string();
    format!("{}_{}.{}", timestamp, &random[..8], ext)
}

#[derive(Clone)]
pub struct ImageService {
    db: Arc<Database>,
    root: PathBuf,
    max_bytes: u64,
}

impl ImageService {
    /// Create the service, creating the images directory if missing
    pub fn new(db: Arc<Database>, root: impl AsRef<Path>, max_bytes: u64) -> ImageResult<Self> {
        fs::create_dir_all(root.as_ref())?;
        let root = root.as_ref().canonicalize()?;
        log::info!("[IMAGES] Image root: {}", root.display());

        Ok(Self {
            db,
            root,
            max_bytes,
        })
    }

    /// Validate, store and record an uploaded image
    pub fn upload(
        &self,
        original_name: &str,
        mime_type: Option<&str>,
        bytes: &[u8],
    ) -> ImageResult<Image> {
        let ext = validate_image(original_name, mime_type, bytes.len() as u64, self.max_bytes)?;
        let mime_type = mime_type.map(|m| m.to_lowercase()).unwrap_or_default();

        let filename = generate_filename(&ext);
        let path = self.root.join(&filename);
        fs::write(&path, bytes)?;

        let file_path = path.to_string_lossy().to_string();
        let encoded = BASE64.encode(bytes);

        match self.db.create_image(
            &filename,
            original_name,
            &file_path,
            bytes.len() as i64,
            &mime_type,
            &encoded,
        ) {
            Ok(image) => {
                log::info!(
                    "[IMAGES] Uploaded {} as {} ({} bytes)",
                    original_name,
                    filename,
                    bytes.len()
                );
                Ok(image)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&path) {
                    log::warn!("[IMAGES] Failed to remove {}: {}", file_path, cleanup);
                }
                Err(e.into())
            }
        }
    }

    pub fn get(&self, id: i64) -> ImageResult<Image> {
        self.db.get_image(id)?.ok_or(ImageError::NotFound(id))
    }

    /// Newest first
    pub fn list(&self, page: u32, size: u32) -> ImageResult<Page<Image>> {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(ImageError::Validation(format!(
                "page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let total = self.db.count_images()?;
        let images = self
            .db
            .list_images(size as i64, page as i64 * size as i64)?;
        Ok(Page::new(images, page, size, total))
    }

    /// Delete an image. The row goes even when the file cannot be removed.
    pub fn delete(&self, id: i64) -> ImageResult<()> {
        let image = self.get(id)?;

        if let Some(path) = self.confined(&image.file_path) {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("[IMAGES] Failed to remove {}: {}", path.display(), e);
            }
        }

        self.db.delete_image(id)?;
        log::info!("[IMAGES] Deleted image {}", id);
        Ok(())
    }

    /// Raw bytes for preview: the file on disk, or the Base64 copy if the file is gone
    pub fn read_bytes(&self, image: &Image) -> ImageResult<Vec<u8>> {
        if let Some(path) = self.confined(&image.file_path) {
            return Ok(fs::read(path)?);
        }

        BASE64
            .decode(&image.base64_content)
            .map_err(|_| ImageError::NotFound(image.id))
    }

    /// Content type for serving `image`: the recorded MIME type, or one derived from the filename
    pub fn content_type(image: &Image) -> &str {
        if !image.mime_type.is_empty() {
            return &image.mime_type;
        }
        image
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| mime_for_ext(ext))
            .unwrap_or("application/octet-stream")
    }

    /// Existing file inside the images root, symlinks resolved
    fn confined(&self, file_path: &str) -> Option<PathBuf> {
        let real = Path::new(file_path).canonicalize().ok()?;
        (real.starts_with(&self.root) && real.is_file()).then_some(real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn test_service(max_bytes: u64) -> (tempfile::TempDir, ImageService) {
        let dir = tempdir().unwrap();
        let db = Arc::new(Database::in_memory().unwrap());
        let service = ImageService::new(db, dir.path().join("images"), max_bytes).unwrap();
        (dir, service)
    }

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image("cat.PNG", Some("image/png"), 10, 100).unwrap(), "png");
        assert_eq!(validate_image("a.b.jpeg", Some("IMAGE/JPEG"), 10, 100).unwrap(), "jpeg");

        let rejects = [
            ("cat.png", Some("image/png"), 0),
            ("cat.png", Some("image/png"), 101),
            ("cat.png", Some("image/svg+xml"), 10),
            ("cat.png", None, 10),
            ("cat.bmp", Some("image/png"), 10),
            (".png", Some("image/png"), 10),
            ("cat", Some("image/png"), 10),
        ];
        for (name, mime, size) in rejects {
            assert!(
                matches!(validate_image(name, mime, size, 100), Err(ImageError::Validation(_))),
                "accepted {} {:?} {}",
                name,
                mime,
                size
            );
        }
    }

    #[test]
    fn test_content_type() {
        let mut image = Image {
            id: 1,
            filename: "20240101_120000_deadbeef.webp".to_string(),
            original_name: "x.webp".to_string(),
            file_path: String::new(),
            file_size: 1,
            mime_type: "image/webp".to_string(),
            base64_content: String::new(),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(ImageService::content_type(&image), "image/webp");

        image.mime_type = String::new();
        assert_eq!(ImageService::content_type(&image), "image/webp");
        image.filename = "noext".to_string();
        assert_eq!(ImageService::content_type(&image), "application/octet-stream");
    }

    #[test]
    fn test_generate_filename() {
        let name = generate_filename("png");
        let re = regex::Regex::new(r"^\d{8}_\d{6}_[0-9a-f]{8}\.png$").unwrap();
        assert!(re.is_match(&name), "unexpected filename: {}", name);
    }

    #[test]
    fn test_upload_and_read() {
        let (_dir, service) = test_service(1024);
        let image = service.upload("logo.png", Some("image/png"), PNG_BYTES).unwrap();

        assert_eq!(image.original_name, "logo.png");
        assert_eq!(image.file_size, PNG_BYTES.len() as i64);
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(BASE64.decode(&image.base64_content).unwrap(), PNG_BYTES);
        assert!(Path::new(&image.file_path).is_file());

        let fetched = service.get(image.id).unwrap();
        assert_eq!(service.read_bytes(&fetched).unwrap(), PNG_BYTES);
    }

    #[test]
    fn test_upload_rejects_oversized() {
        let (_dir, service) = test_service(4);
        let result = service.upload("logo.png", Some("image/png"), PNG_BYTES);
        assert!(matches!(result, Err(ImageError::Validation(_))));
        assert_eq!(service.list(0, 10).unwrap().total_elements, 0);
    }

    #[test]
    fn test_delete_removes_file_and_row() {
        let (_dir, service) = test_service(1024);
        let image = service.upload("logo.gif", Some("image/gif"), PNG_BYTES).unwrap();

        service.delete(image.id).unwrap();
        assert!(!Path::new(&image.file_path).exists());
        assert!(matches!(service.get(image.id), Err(ImageError::NotFound(_))));
        assert!(matches!(service.delete(image.id), Err(ImageError::NotFound(_))));
    }

    #[test]
    fn test_delete_without_file_still_deletes_row() {
        let (_dir, service) = test_service(1024);
        let image = service.upload("logo.webp", Some("image/webp"), PNG_BYTES).unwrap();
        fs::remove_file(&image.file_path).unwrap();

        // Preview falls back to the stored Base64
        assert_eq!(service.read_bytes(&image).unwrap(), PNG_BYTES);

        service.delete(image.id).unwrap();
        assert!(matches!(service.get(image.id), Err(ImageError::NotFound(_))));
    }

    #[test]
    fn test_list_pages() {
        let (_dir, service) = test_service(1024);
        for name in ["a.png", "b.png", "c.png"] {
            service.upload(name, Some("image/png"), PNG_BYTES).unwrap();
        }

        let page = service.list(1, 2).unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.total_elements, 3);
        assert!(page.last);
        assert!(matches!(service.list(0, 0), Err(ImageError::Validation(_))));
    }
}
