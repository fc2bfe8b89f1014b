mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::repository::PgUserRepository;
use crate::config::{Config, StorageConfig};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::resume::analysis::ResumeAnalyzer;
use crate::resume::parser::FileParser;
use crate::resume::repository::PgResumeRepository;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{FileStore, LocalFileStore, S3FileStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume analyzer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize file storage
    let store: Arc<dyn FileStore> = match &config.storage {
        StorageConfig::Local { upload_dir } => Arc::new(LocalFileStore::open(upload_dir).await?),
        StorageConfig::S3 {
            bucket,
            endpoint,
            access_key_id,
            secret_access_key,
        } => Arc::new(
            S3FileStore::connect(bucket, endpoint, access_key_id, secret_access_key).await,
        ),
    };

    // Initialize LLM client
    let llm = LlmClient::new(&config.llm);
    let analyzer = ResumeAnalyzer::new(Arc::new(llm));
    info!("LLM client initialized (model: {})", analyzer.model());

    // Build app state
    let state = AppState {
        users: Arc::new(PgUserRepository::new(db.clone())),
        resumes: Arc::new(PgResumeRepository::new(db)),
        store,
        parser: Arc::new(FileParser),
        analyzer,
        auth: config.auth.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config.cors_origin.as_deref())?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Permissive without a configured origin; otherwise that origin only, with
/// credentials so the session cookie is sent.
fn cors_layer(origin: Option<&str>) -> Result<CorsLayer> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };

    let origin = HeaderValue::from_str(origin)
        .with_context(|| format!("CORS_ORIGIN '{origin}' is not a valid header value"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}
