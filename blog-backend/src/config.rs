use std::env;
use std::str::FromStr;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Root directory of article markdown files
    pub const MARKDOWN_PATH: &str = "BLOG_MARKDOWN_PATH";
    pub const IMAGES_PATH: &str = "BLOG_IMAGES_PATH";
    /// Upload size limit in bytes
    pub const IMAGE_MAX_BYTES: &str = "BLOG_IMAGE_MAX_BYTES";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/blog.db";
    pub const MARKDOWN_PATH: &str = "./data/markdown";
    pub const IMAGES_PATH: &str = "./data/images";
    pub const IMAGE_MAX_BYTES: u64 = 5 * 1024 * 1024;
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub storage: StorageConfig,
}

/// On-disk locations for article content and images
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub markdown_path: String,
    pub images_path: String,
    pub image_max_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            markdown_path: defaults::MARKDOWN_PATH.to_string(),
            images_path: defaults::IMAGES_PATH.to_string(),
            image_max_bytes: defaults::IMAGE_MAX_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_var(env_vars::PORT, defaults::PORT),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            storage: StorageConfig {
                markdown_path: env::var(env_vars::MARKDOWN_PATH)
                    .unwrap_or_else(|_| defaults::MARKDOWN_PATH.to_string()),
                images_path: env::var(env_vars::IMAGES_PATH)
                    .unwrap_or_else(|_| defaults::IMAGES_PATH.to_string()),
                image_max_bytes: parse_var(env_vars::IMAGE_MAX_BYTES, defaults::IMAGE_MAX_BYTES),
            },
        }
    }
}

/// Parse an env var, falling back to `default` (with a warning) when it does not parse
fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("{}={:?} is not valid, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
