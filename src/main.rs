//! Artist Portfolio Backend
//!
//! Serves artworks, tags and uploaded images for a portfolio site, with a
//! PSK-guarded admin surface for managing them.

mod api;
mod auth;
mod config;
mod contact;
mod db;
mod errors;
mod gallery;
mod models;
mod service;
mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use contact::ContactRelay;
use db::{ArtworkStore, Repository};
use gallery::GalleryIndex;
use service::ArtworkService;
use storage::{BlobStore, LocalBlobStore, IMAGE_BUCKET};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub artworks: Arc<ArtworkService>,
    pub gallery: Arc<GalleryIndex>,
    pub contact: Arc<ContactRelay>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting portfolio backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Storage path: {:?}", config.storage_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    for name in config.missing_required() {
        tracing::error!("{} is not set; dependent operations will fail", name);
    }
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (FOLIO_API_PSK). Admin routes are open!");
    }

    // Initialize database and image bucket
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));
    let blobs = Arc::new(
        LocalBlobStore::open(&config.storage_dir, config.public_base_url.clone()).await?,
    );

    let artworks = repo.list_artworks().await?;
    tracing::info!("Loaded {} artworks", artworks.len());

    let state = build_state(repo, blobs, config.clone())?;

    state
        .gallery
        .clone()
        .spawn_refresh_loop(config.gallery_refresh);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire the services on top of a repository and an image bucket.
pub fn build_state(
    repo: Arc<Repository>,
    blobs: Arc<dyn BlobStore>,
    config: Config,
) -> Result<AppState, errors::AppError> {
    let store: Arc<dyn ArtworkStore> = repo.clone();
    let artworks = Arc::new(ArtworkService::new(store, blobs.clone()));
    let gallery = Arc::new(GalleryIndex::new(blobs));
    let contact = Arc::new(ContactRelay::new(
        config.contact_webhook_url.clone(),
        config.contact_timeout,
    )?);

    Ok(AppState {
        repo,
        artworks,
        gallery,
        contact,
        config: Arc::new(config),
    })
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone auth settings for the admin layer
    let psk = state.config.api_psk.clone();
    let admin = state.config.admin.clone();

    // Admin routes
    let admin_routes = Router::new()
        .route("/artworks", post(api::create_artwork))
        .route(
            "/artworks/{id}",
            put(api::update_artwork).delete(api::delete_artwork),
        )
        .route("/tags", post(api::create_tag))
        .route("/uploads", post(api::upload_image))
        .route("/session", get(api::get_session))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), admin.clone(), req, next)
        }));

    // Public API routes
    let api_routes = Router::new()
        .route("/artworks", get(api::list_artworks))
        .route("/artworks/{id}", get(api::get_artwork))
        .route("/tags", get(api::list_tags))
        .route("/portfolio", get(api::get_portfolio))
        .route("/portfolio/revision", get(api::get_revision))
        .route("/profile", get(api::get_profile))
        .route("/gallery", get(api::get_gallery))
        .route("/contact", post(api::submit_contact))
        .nest("/admin", admin_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    let bucket_dir = state.config.storage_dir.join(IMAGE_BUCKET);

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .nest_service(&format!("/storage/{}", IMAGE_BUCKET), ServeDir::new(bucket_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
