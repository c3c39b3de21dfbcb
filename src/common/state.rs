// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::{IdentityProvider, SessionResolver};

/// Application state containing database pool and authentication services
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: Arc<SessionResolver>,
}
