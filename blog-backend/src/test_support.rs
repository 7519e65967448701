//! Shared fixtures for controller tests

use actix_web::web;
use tempfile::TempDir;

use crate::config::{Config, StorageConfig};
use crate::AppState;

/// App state backed by a fresh temp directory (keep the `TempDir` alive for the test)
pub fn test_state() -> (TempDir, web::Data<AppState>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = dir.path();

    let config = Config {
        port: 0,
        database_url: root.join("blog.db").to_string_lossy().to_string(),
        storage: StorageConfig {
            markdown_path: root.join("markdown").to_string_lossy().to_string(),
            images_path: root.join("images").to_string_lossy().to_string(),
            image_max_bytes: 1024 * 1024,
        },
    };

    let state = AppState::from_config(config).expect("Failed to build app state");
    (dir, web::Data::new(state))
}
