use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use pdfdesk::api::{self, AppState};
use pdfdesk::config::AppConfig;
use pdfdesk::db_migration;
use pdfdesk::domains::compression::{CompressionSettings, PdfCompressionService};
use pdfdesk::domains::conversion::{OcrConvertService, OcrEngine};
use pdfdesk::domains::core::{PageRenderer, UploadStorage};
use pdfdesk::domains::document::{DocumentServiceImpl, SqliteFileRecordRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;

    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;

    db_migration::initialize_database(&pool).await?;

    let storage = Arc::new(UploadStorage::new(&config.uploads_dir)?);
    let renderer = Arc::new(PageRenderer::new(config.pdftoppm_path.clone()));
    let repo = Arc::new(SqliteFileRecordRepository::new(pool.clone()));
    let compression = Arc::new(PdfCompressionService::new(CompressionSettings::default()));
    let converter = Arc::new(OcrConvertService::new(
        renderer.clone(),
        OcrEngine::new(config.tesseract_path.clone()),
    ));
    let documents = Arc::new(DocumentServiceImpl::new(
        repo,
        compression,
        converter,
        renderer,
        storage,
    ));

    let app = api::app(AppState { documents }, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    log::info!("pdfdesk listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
