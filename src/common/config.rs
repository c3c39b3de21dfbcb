// src/common/config.rs
//! Environment-driven service configuration

use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://quotes.db";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TOKEN_CACHE_MAX_ENTRIES: usize = 10_000;
pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:3000,http://localhost:5173,http://localhost:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    /// Address that is promoted to admin on its first authenticated request
    pub admin_email: String,
    /// Service-account key file of the identity provider
    pub firebase_key_path: PathBuf,
    pub firebase_project_id: Option<String>,
    pub token_cache_max_entries: usize,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let admin_email = env::var("ADMIN_EMAIL")
            .map(|e| e.trim().to_lowercase())
            .unwrap_or_default();

        let firebase_key_path = env::var("FIREBASE_KEY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./firebase-key.json"));

        let firebase_project_id = env::var("FIREBASE_PROJECT_ID")
            .ok()
            .filter(|p| !p.trim().is_empty());

        let token_cache_max_entries = env::var("TOKEN_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TOKEN_CACHE_MAX_ENTRIES);

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
        );

        Self {
            database_url,
            port,
            admin_email,
            firebase_key_path,
            firebase_project_id,
            token_cache_max_entries,
            cors_origins,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Print configuration summary on startup
pub fn print_config_status(config: &AppConfig) {
    if config.admin_email.is_empty() {
        println!("⚠️  ADMIN_EMAIL not set - no account will be auto-promoted to admin");
    } else {
        println!(
            "🔐 Admin account: {}",
            super::safe_email_log(&config.admin_email)
        );
    }
    println!("🔑 Identity provider key: {}", config.firebase_key_path.display());
    println!("🗄️  Database: {}", config.database_url);
}
