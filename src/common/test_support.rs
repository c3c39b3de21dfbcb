//! Shared fixtures for unit and HTTP tests

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tower::ServiceExt;

use crate::auth::models::{IdentityUser, Role, VerifiedToken};
use crate::auth::{IdentityError, IdentityProvider, SessionResolver, TokenCache};
use crate::common::{migrations::run_migrations, AppState};

pub const ADMIN_EMAIL: &str = "admin@example.com";

/// In-memory identity provider that records every call
#[derive(Default)]
pub struct FakeIdentityProvider {
    tokens: Mutex<HashMap<String, VerifiedToken>>,
    accounts: Mutex<HashMap<String, String>>,
    verify_calls: AtomicUsize,
    assignments: Mutex<Vec<(String, Role)>>,
    fail_assignments: AtomicBool,
}

impl FakeIdentityProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `token` for an account; `role` is the custom claim, if any
    pub fn issue(&self, token: &str, uid: &str, email: Option<&str>, role: Option<&str>) {
        self.issue_until(token, uid, email, role, Utc::now() + Duration::hours(1));
    }

    pub fn issue_until(
        &self,
        token: &str,
        uid: &str,
        email: Option<&str>,
        role: Option<&str>,
        expires_at: DateTime<Utc>,
    ) {
        let mut claims = HashMap::new();
        if let Some(email) = email {
            claims.insert("email".to_string(), json!(email));
            self.accounts
                .lock()
                .unwrap()
                .insert(email.to_string(), uid.to_string());
        }
        if let Some(role) = role {
            claims.insert("role".to_string(), json!(role));
        }
        self.tokens.lock().unwrap().insert(
            token.to_string(),
            VerifiedToken {
                uid: uid.to_string(),
                expires_at,
                claims,
            },
        );
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn assignments(&self) -> Vec<(String, Role)> {
        self.assignments.lock().unwrap().clone()
    }

    pub fn fail_assignments(&self) {
        self.fail_assignments.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedToken, IdentityError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let verified = self
            .tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".to_string()))?;
        if verified.is_expired(Utc::now()) {
            return Err(IdentityError::InvalidToken("token expired".to_string()));
        }
        Ok(verified)
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<(), IdentityError> {
        if self.fail_assignments.load(Ordering::SeqCst) {
            return Err(IdentityError::RequestFailed("provider unavailable".to_string()));
        }
        self.assignments
            .lock()
            .unwrap()
            .push((uid.to_string(), role));
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<IdentityUser, IdentityError> {
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|uid| IdentityUser { uid: uid.clone() })
            .ok_or_else(|| IdentityError::UserNotFound(email.to_string()))
    }
}

pub async fn setup_test_db() -> SqlitePool {
    // One connection: every new in-memory connection is a fresh database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

pub fn session_resolver(identity: Arc<FakeIdentityProvider>) -> SessionResolver {
    SessionResolver::new(identity, Arc::new(TokenCache::new(100)), ADMIN_EMAIL)
}

/// Router wired to a fresh database, plus the provider for issuing tokens
pub async fn test_app() -> (Router, Arc<FakeIdentityProvider>, SqlitePool) {
    let identity = FakeIdentityProvider::new();
    let db = setup_test_db().await;

    let state = AppState {
        db: db.clone(),
        identity: identity.clone(),
        sessions: Arc::new(session_resolver(identity.clone())),
    };

    let app = crate::app_router(Arc::new(RwLock::new(state)));

    // Default cast: one admin, two regular users
    identity.issue("admin-token", "admin-uid", Some(ADMIN_EMAIL), Some("admin"));
    identity.issue("alice-token", "alice-uid", Some("alice@example.com"), Some("user"));
    identity.issue("bob-token", "bob-uid", Some("bob@example.com"), Some("user"));

    (app, identity, db)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}
