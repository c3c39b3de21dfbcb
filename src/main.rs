// src/main.rs
use anyhow::Context;
use axum::{extract::Extension, middleware, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod admin;
mod auth;
mod common;
mod logging_middleware;
mod profile;
mod quote;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use auth::{FirebaseIdentityProvider, IdentityProvider, ServiceAccountKey, SessionResolver, TokenCache};
use common::config::print_config_status;
use common::{AppConfig, AppState};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = AppConfig::from_env();
    print_config_status(&config);

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = config.database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // IDENTITY PROVIDER
    // ========================================================================

    let service_account = ServiceAccountKey::from_file(&config.firebase_key_path)
        .with_context(|| {
            format!(
                "failed to load service account key from {}",
                config.firebase_key_path.display()
            )
        })?;
    let identity: Arc<dyn IdentityProvider> = Arc::new(
        FirebaseIdentityProvider::new(service_account, config.firebase_project_id.clone())
            .context("failed to initialize identity provider")?,
    );
    info!("Identity provider initialized");

    let token_cache = Arc::new(TokenCache::new(config.token_cache_max_entries));
    let sessions = Arc::new(SessionResolver::new(
        identity.clone(),
        token_cache,
        &config.admin_email,
    ));

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let app_state = AppState {
        db: pool,
        identity,
        sessions,
    };

    let shared = Arc::new(RwLock::new(app_state));

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let origins: Vec<axum::http::HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let app = app_router(shared)
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ])
                .allow_credentials(true),
        )
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// All API routes with the shared state attached
pub fn app_router(shared: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        // ====================================================================
        // SESSION ROUTES
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // PROFILE ROUTES
        // ====================================================================
        .merge(profile::profile_routes())
        // ====================================================================
        // QUOTE ROUTES (including moderation)
        // ====================================================================
        .merge(quote::quote_routes())
        // ====================================================================
        // ADMIN ROUTES (role management)
        // ====================================================================
        .merge(admin::admin_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared))
}
