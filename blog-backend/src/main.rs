use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod articles;
mod config;
mod controllers;
mod db;
mod images;
mod markdown;
mod models;

#[cfg(test)]
mod test_support;

use articles::ArticleService;
use config::Config;
use db::Database;
use images::ImageService;
use markdown::MarkdownStore;

/// Request bodies above this are rejected before reaching a handler
const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

pub struct AppState {
    pub config: Config,
    pub markdown: Arc<MarkdownStore>,
    pub articles: ArticleService,
    pub images: ImageService,
}

impl AppState {
    /// Open the database and storage directories named by `config`
    pub fn from_config(config: Config) -> Result<Self, String> {
        log::info!("Initializing database at {}", config.database_url);
        let db = Database::new(&config.database_url)
            .map_err(|e| format!("Failed to initialize database: {}", e))?;
        let db = Arc::new(db);

        let markdown = MarkdownStore::new(&config.storage.markdown_path)
            .map_err(|e| format!("Failed to initialize markdown store: {}", e))?;
        let markdown = Arc::new(markdown);

        let images = ImageService::new(
            Arc::clone(&db),
            &config.storage.images_path,
            config.storage.image_max_bytes,
        )
        .map_err(|e| format!("Failed to initialize image storage: {}", e))?;

        let articles = ArticleService::new(Arc::clone(&db), Arc::clone(&markdown));

        Ok(Self {
            config,
            markdown,
            articles,
            images,
        })
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("Blog backend v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let port = config.port;

    let state = match AppState::from_config(config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting server on 0.0.0.0:{}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::articles::config)
            .configure(controllers::files::config)
            .configure(controllers::images::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
