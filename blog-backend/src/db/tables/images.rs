//! Image database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::models::Image;
use super::articles::parse_timestamp;
use super::super::Database;

impl Database {
    /// Record an uploaded image
    pub fn create_image(
        &self,
        filename: &str,
        original_name: &str,
        file_path: &str,
        file_size: i64,
        mime_type: &str,
        base64_content: &str,
    ) -> SqliteResult<Image> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO images (filename, original_name, file_path, file_size, mime_type, base64_content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                filename,
                original_name,
                file_path,
                file_size,
                mime_type,
                base64_content,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Image {
            id: conn.last_insert_rowid(),
            filename: filename.to_string(),
            original_name: original_name.to_string(),
            file_path: file_path.to_string(),
            file_size,
            mime_type: mime_type.to_string(),
            base64_content: base64_content.to_string(),
            created_at: now,
        })
    }

    pub fn get_image(&self, id: i64) -> SqliteResult<Option<Image>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, filename, original_name, file_path, file_size, mime_type, base64_content, created_at
             FROM images WHERE id = ?1",
            [id],
            |row| Self::row_to_image(row),
        )
        .optional()
    }

    /// Images newest first
    pub fn list_images(&self, limit: i64, offset: i64) -> SqliteResult<Vec<Image>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, filename, original_name, file_path, file_size, mime_type, base64_content, created_at
             FROM images ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;

        let images = stmt
            .query_map([limit, offset], |row| Self::row_to_image(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(images)
    }

    pub fn count_images(&self) -> SqliteResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn delete_image(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM images WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    fn row_to_image(row: &rusqlite::Row) -> rusqlite::Result<Image> {
        let created_at_str: String = row.get(7)?;

        Ok(Image {
            id: row.get(0)?,
            filename: row.get(1)?,
            original_name: row.get(2)?,
            file_path: row.get(3)?,
            file_size: row.get(4)?,
            mime_type: row.get(5)?,
            base64_content: row.get(6)?,
            created_at: parse_timestamp(7, &created_at_str)?,
        })
    }
}
